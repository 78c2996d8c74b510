//! All effective tax rate measures for a single asset/industry/form cell.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coc::{cost_of_capital, CocBreakdown, CocInput};
use crate::error::CostCapError;
use crate::etr::average::{
    eatr_domestic, eatr_foreign, foreign_cost_of_capital, InternationalTerms,
};
use crate::etr::marginal::{metr, mettr};
use crate::etr::saver::{
    saver_return_corporate, saver_return_noncorporate, InvestorShares, InvestorTaxRates,
};
use crate::recovery::shield::RecoveryTerms;
use crate::types::{with_metadata, ComputationOutput, LegalForm, Rate};
use crate::CostCapResult;

/// Input for a single-cell effective tax rate computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveRatesInput {
    pub legal_form: LegalForm,
    pub cost_of_capital: CocInput,
    /// Nominal required return on equity
    pub cost_of_equity: Rate,
    #[serde(default)]
    pub investor_shares: InvestorShares,
    pub investor_rates: InvestorTaxRates,
    /// Pre-tax return on the profitable investment (EATR only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profitability: Option<Rate>,
    /// FDII/GILTI terms; EATRs are computed for C corporations when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub international: Option<InternationalTerms>,
    /// Recovery rules abroad; defaults to the domestic rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_recovery: Option<RecoveryTerms>,
    #[serde(default = "default_tangible")]
    pub tangible: bool,
}

fn default_tangible() -> bool {
    true
}

/// Effective tax rates for one cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveRatesOutput {
    pub breakdown: CocBreakdown,
    pub metr: Rate,
    pub saver_return: Rate,
    pub mettr: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eatr_domestic: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eatr_foreign: Option<Rate>,
}

/// Cost of capital, METR, METTR and (C corporations with international
/// terms) domestic and foreign EATR for one investment.
pub fn calculate_effective_tax_rates(
    input: &EffectiveRatesInput,
) -> CostCapResult<ComputationOutput<EffectiveRatesOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let coc_input = &input.cost_of_capital;

    let breakdown = cost_of_capital(coc_input)?;
    let rho = breakdown.cost_of_capital;
    let r = coc_input.discount_rate;
    let pi = coc_input.inflation;

    let saver_return = if input.legal_form.is_corporate() {
        saver_return_corporate(
            coc_input.cost_of_debt,
            input.cost_of_equity,
            pi,
            coc_input.debt_share,
            &input.investor_shares,
            &input.investor_rates,
        )?
    } else {
        saver_return_noncorporate(
            coc_input.cost_of_debt,
            input.cost_of_equity,
            pi,
            coc_input.debt_share,
            &input.investor_shares,
            input.investor_rates.interest,
        )?
    };

    let metr_value = metr(rho, r, pi)?;
    let mettr_value = mettr(rho, saver_return)?;

    let (eatr_d, eatr_f) = match (&input.international, input.legal_form.is_corporate()) {
        (Some(intl), true) => {
            let p = input.profitability.ok_or_else(|| {
                CostCapError::invalid(
                    "profitability",
                    "Average tax rates need the pre-tax return p",
                )
            })?;
            let tau = breakdown.effective_tax_rate;
            let domestic = eatr_domestic(rho, r, pi, p, tau, intl.fdii_exclusion, input.tangible)?;
            let foreign_terms = input.foreign_recovery.unwrap_or(coc_input.recovery);
            let rho_f = foreign_cost_of_capital(coc_input, &foreign_terms, intl.foreign_tax_rate)?;
            let foreign = eatr_foreign(
                rho_f,
                r,
                pi,
                p,
                intl.foreign_tax_rate,
                tau,
                intl.gilti_exclusion,
                input.tangible,
            )?;
            (Some(domestic), Some(foreign))
        }
        (Some(_), false) => {
            warnings.push(format!(
                "Average tax rates apply to C corporations only; skipped for {}",
                input.legal_form
            ));
            (None, None)
        }
        (None, _) => (None, None),
    };

    if metr_value < Decimal::ZERO {
        warnings.push(format!(
            "Negative METR ({metr_value}): investment is tax-subsidized at the margin"
        ));
    }
    if mettr_value < metr_value {
        warnings.push("METTR below METR: investor-level taxes lower the total wedge".into());
    }

    let output = EffectiveRatesOutput {
        breakdown,
        metr: metr_value,
        saver_return,
        mettr: mettr_value,
        eatr_domestic: eatr_d,
        eatr_foreign: eatr_f,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Marginal and average effective tax rates from the cost of capital",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coc::TaxSchedule;
    use crate::recovery::depreciation::RecoveryMethod;
    use rust_decimal_macros::dec;

    fn input(form: LegalForm) -> EffectiveRatesInput {
        EffectiveRatesInput {
            legal_form: form,
            cost_of_capital: CocInput {
                discount_rate: dec!(0.0669),
                inflation: dec!(0.02),
                cost_of_debt: dec!(0.048),
                depreciation_rate: dec!(0.1),
                debt_share: dec!(0.3),
                recovery: RecoveryTerms {
                    method: RecoveryMethod::DecliningBalance,
                    life: dec!(7),
                    decline_rate: dec!(2),
                    bonus: Decimal::ZERO,
                    section_179: Decimal::ZERO,
                    itc_rate: Decimal::ZERO,
                    itc_basis_reduction: Decimal::ZERO,
                    itc_life: Decimal::ZERO,
                },
                taxes: TaxSchedule::Constant {
                    tax_rate: dec!(0.21),
                    interest_deductible: Decimal::ONE,
                    property_tax: Decimal::ZERO,
                },
            },
            cost_of_equity: dec!(0.075),
            investor_shares: InvestorShares::default(),
            investor_rates: InvestorTaxRates {
                interest: dec!(0.25),
                dividends: dec!(0.2),
                short_gains: dec!(0.35),
                long_gains: dec!(0.2),
                step_up_basis: true,
            },
            profitability: Some(dec!(0.2)),
            international: Some(InternationalTerms {
                fdii_exclusion: dec!(0.375),
                gilti_exclusion: dec!(0.5),
                foreign_tax_rate: dec!(0.15),
            }),
            foreign_recovery: None,
            tangible: true,
        }
    }

    #[test]
    fn test_corporate_cell_has_all_measures() {
        let out = calculate_effective_tax_rates(&input(LegalForm::CCorp)).unwrap();
        let res = &out.result;
        assert!(res.eatr_domestic.is_some());
        assert!(res.eatr_foreign.is_some());
        let expected = metr(res.breakdown.cost_of_capital, dec!(0.0669), dec!(0.02)).unwrap();
        assert_eq!(res.metr, expected);
    }

    #[test]
    fn test_pass_through_skips_average_rates() {
        let out = calculate_effective_tax_rates(&input(LegalForm::Partnership)).unwrap();
        assert!(out.result.eatr_domestic.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("C corporations only")));
    }

    #[test]
    fn test_missing_profitability() {
        let mut bad = input(LegalForm::CCorp);
        bad.profitability = None;
        match calculate_effective_tax_rates(&bad) {
            Err(CostCapError::InvalidInput { field, .. }) => assert_eq!(field, "profitability"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
