//! Effective average tax rates on a profitable investment earning p before
//! tax, for domestic production (with the FDII deduction) and for foreign
//! production subject to the GILTI minimum tax.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::coc::{cost_of_capital, CocInput, TaxSchedule};
use crate::error::CostCapError;
use crate::recovery::shield::RecoveryTerms;
use crate::types::Rate;
use crate::CostCapResult;

/// Return on tangible assets deemed routine (10%) under FDII and GILTI.
const DEEMED_TANGIBLE_RETURN: Decimal = dec!(0.1);

/// Share of foreign taxes creditable against GILTI.
const GILTI_CREDIT_SHARE: Decimal = dec!(0.8);

/// International provisions that enter the average rates for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InternationalTerms {
    /// Share of foreign-derived intangible income excluded from tax
    pub fdii_exclusion: Rate,
    /// Share of global intangible low-taxed income excluded from tax
    pub gilti_exclusion: Rate,
    /// Effective tax rate in the foreign jurisdiction
    pub foreign_tax_rate: Rate,
}

/// Domestic EATR:
/// (rho - r + pi)/p + (p - rho)/p tau - (p - 0.1 tang)/p exFDII tau.
///
/// `tax_rate` is tau under constant parameters or the weighted T under a path.
pub fn eatr_domestic(
    cost_of_capital: Rate,
    discount_rate: Rate,
    inflation: Rate,
    profitability: Rate,
    tax_rate: Rate,
    fdii_exclusion: Rate,
    tangible: bool,
) -> CostCapResult<Rate> {
    validate_eatr(profitability, "fdii_exclusion", fdii_exclusion)?;
    let p = profitability;
    let rho = cost_of_capital;
    Ok((rho - discount_rate + inflation) / p + (p - rho) / p * tax_rate
        - exclusion_base(p, tangible) / p * fdii_exclusion * tax_rate)
}

/// Foreign EATR given the cost of capital under the foreign tax system:
/// (rho_f - r + pi)/p + (p - rho_f)/p tau_f
///   + (p - 0.1 tang)/p max(tau (1 - exGILTI) - 0.8 tau_f, 0).
#[allow(clippy::too_many_arguments)]
pub fn eatr_foreign(
    foreign_cost_of_capital: Rate,
    discount_rate: Rate,
    inflation: Rate,
    profitability: Rate,
    foreign_tax_rate: Rate,
    domestic_tax_rate: Rate,
    gilti_exclusion: Rate,
    tangible: bool,
) -> CostCapResult<Rate> {
    validate_eatr(profitability, "gilti_exclusion", gilti_exclusion)?;
    let p = profitability;
    let rho = foreign_cost_of_capital;
    let top_up = (domestic_tax_rate * (Decimal::ONE - gilti_exclusion)
        - GILTI_CREDIT_SHARE * foreign_tax_rate)
        .max(Decimal::ZERO);
    Ok((rho - discount_rate + inflation) / p
        + (p - rho) / p * foreign_tax_rate
        + exclusion_base(p, tangible) / p * top_up)
}

/// Static cost of capital of the same investment located abroad: foreign
/// rate, interest fully deductible, no property tax, foreign recovery rules.
pub fn foreign_cost_of_capital(
    domestic: &CocInput,
    foreign_recovery: &RecoveryTerms,
    foreign_tax_rate: Rate,
) -> CostCapResult<Rate> {
    let input = CocInput {
        recovery: *foreign_recovery,
        taxes: TaxSchedule::Constant {
            tax_rate: foreign_tax_rate,
            interest_deductible: Decimal::ONE,
            property_tax: Decimal::ZERO,
        },
        ..domestic.clone()
    };
    Ok(cost_of_capital(&input)?.cost_of_capital)
}

fn exclusion_base(profitability: Rate, tangible: bool) -> Rate {
    if tangible {
        profitability - DEEMED_TANGIBLE_RETURN
    } else {
        profitability
    }
}

fn validate_eatr(profitability: Rate, field: &str, exclusion: Rate) -> CostCapResult<()> {
    if profitability <= DEEMED_TANGIBLE_RETURN {
        return Err(CostCapError::invalid(
            "profitability",
            format!("Pre-tax return must exceed {DEEMED_TANGIBLE_RETURN}, got {profitability}"),
        ));
    }
    if exclusion < Decimal::ZERO || exclusion > Decimal::ONE {
        return Err(CostCapError::invalid(
            field,
            format!("Exclusion rate must be between 0 and 1, got {exclusion}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::depreciation::RecoveryMethod;

    #[test]
    fn test_zero_exclusion_reduces_to_closed_form() {
        let (rho, r, pi, p, tau) = (dec!(0.0513), dec!(0.07), dec!(0.02), dec!(0.2), dec!(0.21));
        let expected = (p - rho) / p * tau + (rho - r + pi) / p;
        for tangible in [true, false] {
            let e = eatr_domestic(rho, r, pi, p, tau, Decimal::ZERO, tangible).unwrap();
            assert_eq!(e, expected);
        }
    }

    const R: Decimal = dec!(0.07);
    const PI: Decimal = dec!(0.02);
    const P: Decimal = dec!(0.2);

    #[test]
    fn test_fdii_lowers_domestic_rate_less_for_tangibles() {
        let (rho, tau) = (dec!(0.0513), dec!(0.21));
        let base = eatr_domestic(rho, R, PI, P, tau, Decimal::ZERO, true).unwrap();
        let tangible = eatr_domestic(rho, R, PI, P, tau, dec!(0.375), true).unwrap();
        let intangible = eatr_domestic(rho, R, PI, P, tau, dec!(0.375), false).unwrap();
        assert!(intangible < tangible && tangible < base);
    }

    #[test]
    fn test_gilti_top_up_floors_at_zero() {
        let rho = dec!(0.06);
        let no_top_up = |t_f: Decimal| (rho - R + PI) / P + (P - rho) / P * t_f;

        // 0.21 * 0.5 - 0.8 * 0.25 < 0: no residual US tax
        let high = eatr_foreign(rho, R, PI, P, dec!(0.25), dec!(0.21), dec!(0.5), true).unwrap();
        assert_eq!(high, no_top_up(dec!(0.25)));

        // low foreign rate leaves 0.105 - 0.08 = 0.025 of top-up on (0.2 - 0.1)/0.2
        let low = eatr_foreign(rho, R, PI, P, dec!(0.1), dec!(0.21), dec!(0.5), true).unwrap();
        assert_eq!(low - no_top_up(dec!(0.1)), dec!(0.0125));
    }

    #[test]
    fn test_profitability_floor() {
        match eatr_domestic(dec!(0.05), R, PI, dec!(0.1), dec!(0.21), Decimal::ZERO, true) {
            Err(CostCapError::InvalidInput { field, .. }) => assert_eq!(field, "profitability"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_exclusion_out_of_range() {
        let rho = dec!(0.05);
        assert!(eatr_domestic(rho, R, PI, P, dec!(0.21), dec!(1.5), true).is_err());
        assert!(eatr_foreign(rho, R, PI, P, dec!(0.1), dec!(0.21), dec!(-0.1), true).is_err());
    }

    #[test]
    fn test_foreign_cost_of_capital_uses_foreign_terms() {
        let recovery = RecoveryTerms {
            method: RecoveryMethod::StraightLine,
            life: dec!(10),
            decline_rate: Decimal::ONE,
            bonus: Decimal::ONE,
            section_179: Decimal::ZERO,
            itc_rate: Decimal::ZERO,
            itc_basis_reduction: Decimal::ZERO,
            itc_life: Decimal::ZERO,
        };
        let domestic = CocInput {
            discount_rate: dec!(0.07),
            inflation: dec!(0.02),
            cost_of_debt: dec!(0.048),
            depreciation_rate: dec!(0.1),
            debt_share: Decimal::ZERO,
            recovery,
            taxes: TaxSchedule::Constant {
                tax_rate: dec!(0.21),
                interest_deductible: dec!(0.3),
                property_tax: dec!(0.02),
            },
        };
        // Foreign: no bonus, straight-line over 10 years at 12.5%
        let foreign_terms = RecoveryTerms { bonus: Decimal::ZERO, ..recovery };
        let rho_f = foreign_cost_of_capital(&domestic, &foreign_terms, dec!(0.125)).unwrap();
        let d = crate::recovery::depreciation::pv_straight_line(dec!(0.07), dec!(10)).unwrap();
        let expected = (Decimal::ONE - dec!(0.125) * d) / dec!(0.875) * dec!(0.15) - dec!(0.1);
        assert!((rho_f - expected).abs() < dec!(0.0000000001));
    }
}
