//! Cost of capital: the real pre-tax return an investment must earn to pay
//! the saver's required after-tax return, given depreciation allowances,
//! credits, interest deductibility and property taxes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CostCapError;
use crate::recovery::financing::{interest_shield, interest_shield_path};
use crate::recovery::shield::{cost_recovery_shield, cost_recovery_shield_path, RecoveryTerms};
use crate::recovery::watr::weighted_average_tax_rate;
use crate::types::{with_metadata, ComputationOutput, Rate, Regime};
use crate::CostCapResult;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Tax parameters faced by the investment, either fixed forever or as a
/// period-by-period path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxSchedule {
    Constant {
        /// Statutory tax rate on the entity's (or owner's) business income
        tax_rate: Rate,
        /// Deductible share of interest paid
        interest_deductible: Rate,
        /// Property tax add-on to the cost of capital
        #[serde(default)]
        property_tax: Rate,
    },
    Path {
        tax_rates: Vec<Rate>,
        interest_deductible: Vec<Rate>,
        /// Empty means no property tax in any period
        #[serde(default)]
        property_tax: Vec<Rate>,
    },
}

impl TaxSchedule {
    pub fn regime(&self) -> Regime {
        match self {
            TaxSchedule::Constant { .. } => Regime::Static,
            TaxSchedule::Path { .. } => Regime::ForwardLooking,
        }
    }

    /// Tax rate in effect in the evaluation year.
    pub fn current_rate(&self) -> Option<Rate> {
        match self {
            TaxSchedule::Constant { tax_rate, .. } => Some(*tax_rate),
            TaxSchedule::Path { tax_rates, .. } => tax_rates.first().copied(),
        }
    }
}

/// Everything needed to price one asset in one industry under one legal form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocInput {
    /// Nominal discount rate r = r_d * debt_share + r_e * (1 - debt_share)
    pub discount_rate: Rate,
    /// Expected inflation
    pub inflation: Rate,
    /// Nominal required return on debt
    pub cost_of_debt: Rate,
    /// Economic depreciation rate of the asset
    pub depreciation_rate: Rate,
    /// Debt-financed share of the investment
    pub debt_share: Rate,
    pub recovery: RecoveryTerms,
    pub taxes: TaxSchedule,
}

impl CocInput {
    /// Blend the debt and equity returns by the financing mix.
    pub fn blended_rate(cost_of_debt: Rate, cost_of_equity: Rate, debt_share: Rate) -> Rate {
        cost_of_debt * debt_share + cost_of_equity * (Decimal::ONE - debt_share)
    }

    /// r - pi + delta
    pub fn net_rate(&self) -> Rate {
        self.discount_rate - self.inflation + self.depreciation_rate
    }
}

/// Cost of capital together with the components it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocBreakdown {
    pub regime: Regime,
    /// Real pre-tax required return (rho)
    pub cost_of_capital: Rate,
    /// rho + delta
    pub user_cost_of_capital: Rate,
    /// PV of depreciation deductions and credits per dollar (Z)
    pub tax_shield: Decimal,
    /// PV of interest deductions per dollar (F)
    pub interest_shield: Decimal,
    /// tau, or the discount-weighted T under a path
    pub effective_tax_rate: Rate,
    /// tau_prop, or the discount-weighted T_prop under a path
    pub property_tax: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Cost of capital with methodology envelope and reasonableness warnings.
pub fn calculate_cost_of_capital(
    input: &CocInput,
) -> CostCapResult<ComputationOutput<CocBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let breakdown = cost_of_capital(input)?;

    if breakdown.cost_of_capital < Decimal::ZERO {
        warnings.push(format!(
            "Negative cost of capital ({}): the tax system subsidizes this investment \
             at the margin",
            breakdown.cost_of_capital
        ));
    }
    if let Some(current) = input.taxes.current_rate() {
        let gap = (current - breakdown.effective_tax_rate).abs();
        if breakdown.regime == Regime::ForwardLooking && gap > dec!(0.000001) {
            warnings.push(format!(
                "Weighted tax rate T = {} differs from the current-year rate {current}",
                breakdown.effective_tax_rate
            ));
        }
    }
    if breakdown.tax_shield + breakdown.interest_shield > Decimal::ONE {
        warnings.push("Tax shields exceed the cost of the investment".into());
    }

    let methodology = match breakdown.regime {
        Regime::Static => {
            "Cost of capital, constant tax parameters: \
             rho = (1 - Z - F) / (1 - tau) (r - pi + delta) - delta + tau_prop"
        }
        Regime::ForwardLooking => {
            "Cost of capital, forward-looking tax path: \
             rho = (1 - Z - F) / (1 - T) (r - pi + delta) - delta + T_prop"
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, breakdown))
}

/// Static or forward-looking cost of capital, depending on the schedule.
pub fn cost_of_capital(input: &CocInput) -> CostCapResult<CocBreakdown> {
    cost_of_capital_with_schedule(input, None)
}

/// PV of deductions per period (expensing share in period 0) for a
/// forward-looking computation over `periods` periods.
pub fn deduction_schedule(input: &CocInput, periods: usize) -> CostCapResult<Vec<Decimal>> {
    let b = input.recovery.expensing_share()?;
    input.recovery.depreciation().schedule(
        input.discount_rate,
        input.inflation,
        input.depreciation_rate,
        b,
        periods,
    )
}

/// Same as [`cost_of_capital`], reusing a deduction schedule already built
/// with [`deduction_schedule`] for these recovery terms and rates.
pub fn cost_of_capital_with_schedule(
    input: &CocInput,
    schedule: Option<&[Decimal]>,
) -> CostCapResult<CocBreakdown> {
    validate_coc_input(input)?;

    let r = input.discount_rate;
    let pi = input.inflation;
    let delta = input.depreciation_rate;
    let k = input.net_rate();

    let (z, f, tau, tau_prop) = match &input.taxes {
        TaxSchedule::Constant {
            tax_rate,
            interest_deductible,
            property_tax,
        } => {
            let z = cost_recovery_shield(&input.recovery, r, pi, delta, *tax_rate)?;
            let f = interest_shield(
                input.debt_share,
                input.cost_of_debt,
                r,
                pi,
                delta,
                *tax_rate,
                *interest_deductible,
            )?;
            (z, f, *tax_rate, *property_tax)
        }
        TaxSchedule::Path {
            tax_rates,
            interest_deductible,
            property_tax,
        } => {
            let owned;
            let schedule = match schedule {
                Some(s) => s,
                None => {
                    owned = deduction_schedule(input, tax_rates.len())?;
                    owned.as_slice()
                }
            };
            let z = cost_recovery_shield_path(&input.recovery, schedule, r, tax_rates)?;
            let f = interest_shield_path(
                input.debt_share,
                input.cost_of_debt,
                r,
                pi,
                delta,
                tax_rates,
                interest_deductible,
            )?;
            let t = weighted_average_tax_rate(r, pi, delta, tax_rates)?;
            let tp = if property_tax.is_empty() {
                Decimal::ZERO
            } else {
                weighted_average_tax_rate(r, pi, delta, property_tax)?
            };
            (z, f, t, tp)
        }
    };

    if tau == Decimal::ONE {
        return Err(CostCapError::DivisionByZero {
            context: "cost of capital with a 100% effective tax rate (1 - tau = 0)".into(),
        });
    }

    let rho = (Decimal::ONE - z - f) / (Decimal::ONE - tau) * k - delta + tau_prop;

    Ok(CocBreakdown {
        regime: input.taxes.regime(),
        cost_of_capital: rho,
        user_cost_of_capital: rho + delta,
        tax_shield: z,
        interest_shield: f,
        effective_tax_rate: tau,
        property_tax: tau_prop,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_coc_input(input: &CocInput) -> CostCapResult<()> {
    match &input.taxes {
        TaxSchedule::Constant {
            tax_rate,
            interest_deductible,
            ..
        } => {
            validate_tax_rate("tax_rate", *tax_rate)?;
            validate_share("interest_deductible", *interest_deductible)?;
        }
        TaxSchedule::Path {
            tax_rates,
            interest_deductible,
            property_tax,
        } => {
            if tax_rates.is_empty() {
                return Err(CostCapError::invalid(
                    "tax_rates",
                    "Tax-rate path must contain at least one period",
                ));
            }
            if interest_deductible.len() != tax_rates.len() {
                return Err(CostCapError::invalid(
                    "interest_deductible",
                    format!(
                        "Path has {} periods but the tax-rate path has {}",
                        interest_deductible.len(),
                        tax_rates.len()
                    ),
                ));
            }
            if !property_tax.is_empty() && property_tax.len() != tax_rates.len() {
                return Err(CostCapError::invalid(
                    "property_tax",
                    format!(
                        "Path has {} periods but the tax-rate path has {}",
                        property_tax.len(),
                        tax_rates.len()
                    ),
                ));
            }
            for tau in tax_rates {
                validate_tax_rate("tax_rates", *tau)?;
            }
            for phi in interest_deductible {
                validate_share("interest_deductible", *phi)?;
            }
        }
    }

    if input.discount_rate <= input.inflation {
        return Err(CostCapError::invalid(
            "discount_rate",
            format!(
                "Nominal discount rate ({}) must exceed inflation ({})",
                input.discount_rate, input.inflation
            ),
        ));
    }
    if input.depreciation_rate < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "depreciation_rate",
            "Economic depreciation rate cannot be negative",
        ));
    }
    if input.cost_of_debt < Decimal::ZERO {
        return Err(CostCapError::invalid("cost_of_debt", "Cost of debt cannot be negative"));
    }
    validate_share("debt_share", input.debt_share)?;
    input.recovery.validate()
}

/// A 100% rate is a degenerate denominator; anything else outside [0, 1) is bad input.
fn validate_tax_rate(field: &str, tau: Rate) -> CostCapResult<()> {
    if tau == Decimal::ONE {
        return Err(CostCapError::DivisionByZero {
            context: format!("{field}: 1 - tau = 0"),
        });
    }
    if tau < Decimal::ZERO || tau > Decimal::ONE {
        return Err(CostCapError::invalid(
            field,
            format!("Tax rate must be in [0, 1), got {tau}"),
        ));
    }
    Ok(())
}

fn validate_share(field: &str, value: Rate) -> CostCapResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CostCapError::invalid(
            field,
            format!("Share must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
