use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use costcap_core::coc::{self, CocInput, TaxSchedule};
use costcap_core::etr::rates::{self, EffectiveRatesInput};
use costcap_core::recovery::depreciation::RecoveryMethod;
use costcap_core::recovery::shield::RecoveryTerms;

use crate::input;

/// Arguments for a single-investment cost of capital
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CostOfCapitalArgs {
    /// Nominal discount rate r (e.g. 0.06)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Expected inflation
    #[arg(long)]
    pub inflation: Option<Decimal>,

    /// Nominal cost of debt, used for the interest deduction
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Economic depreciation rate
    #[arg(long)]
    pub depreciation_rate: Option<Decimal>,

    /// Share of the investment financed with debt
    #[arg(long, default_value = "0")]
    pub debt_share: Decimal,

    /// Tax depreciation method: DB, SL, EXP or ECON
    #[arg(long, default_value = "DB")]
    pub method: RecoveryMethod,

    /// Tax life in years
    #[arg(long)]
    pub life: Option<Decimal>,

    /// Declining-balance rate (2 = double declining balance)
    #[arg(long, default_value = "2")]
    pub decline_rate: Decimal,

    /// Bonus depreciation share
    #[arg(long, default_value = "0")]
    pub bonus: Decimal,

    /// Share expensed under section 179
    #[arg(long, default_value = "0")]
    pub section_179: Decimal,

    /// Statutory tax rate on business income
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Deductible share of interest paid
    #[arg(long, default_value = "1")]
    pub interest_deductible: Decimal,

    /// Property tax add-on
    #[arg(long, default_value = "0")]
    pub property_tax: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for METR, METTR and EATR on a single investment
#[derive(Args)]
pub struct EffectiveRatesArgs {
    /// Path to JSON input file with the investment, financing and investor taxes
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cost_of_capital(args: CostOfCapitalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let coc_input = match input::load::<CocInput>(args.input.as_deref())? {
        Some(loaded) => loaded,
        None => {
            let life = match args.method {
                RecoveryMethod::Expensing | RecoveryMethod::Economic => {
                    args.life.unwrap_or(dec!(0))
                }
                _ => args
                    .life
                    .ok_or("--life is required for DB and SL (or provide --input)")?,
            };
            CocInput {
                discount_rate: args
                    .discount_rate
                    .ok_or("--discount-rate is required (or provide --input)")?,
                inflation: args
                    .inflation
                    .ok_or("--inflation is required (or provide --input)")?,
                cost_of_debt: args
                    .cost_of_debt
                    .ok_or("--cost-of-debt is required (or provide --input)")?,
                depreciation_rate: args
                    .depreciation_rate
                    .ok_or("--depreciation-rate is required (or provide --input)")?,
                debt_share: args.debt_share,
                recovery: RecoveryTerms {
                    method: args.method,
                    life,
                    decline_rate: args.decline_rate,
                    bonus: args.bonus,
                    section_179: args.section_179,
                    itc_rate: Decimal::ZERO,
                    itc_basis_reduction: Decimal::ZERO,
                    itc_life: Decimal::ZERO,
                },
                taxes: TaxSchedule::Constant {
                    tax_rate: args
                        .tax_rate
                        .ok_or("--tax-rate is required (or provide --input)")?,
                    interest_deductible: args.interest_deductible,
                    property_tax: args.property_tax,
                },
            }
        }
    };

    let result = coc::calculate_cost_of_capital(&coc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_effective_rates(args: EffectiveRatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rates_input = input::load::<EffectiveRatesInput>(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) is required for effective tax rates")?;

    let result = rates::calculate_effective_tax_rates(&rates_input)?;
    Ok(serde_json::to_value(result)?)
}
