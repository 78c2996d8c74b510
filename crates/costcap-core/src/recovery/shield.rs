//! Cost-recovery tax shield Z: the PV of depreciation deductions and
//! investment tax credits per dollar of investment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CostCapError;
use crate::math::exp_decimal;
use crate::recovery::check_path_len;
use crate::recovery::depreciation::{DepreciationRule, RecoveryMethod};
use crate::types::{Rate, Years};
use crate::CostCapResult;

/// Capital cost recovery terms for one asset under one legal form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTerms {
    /// Depreciation method
    pub method: RecoveryMethod,
    /// Tax life in years
    pub life: Years,
    /// Declining-balance rate (ignored unless `method` is DB)
    pub decline_rate: Decimal,
    /// Bonus depreciation share
    pub bonus: Rate,
    /// Share of investment expensed under section 179
    pub section_179: Rate,
    /// Investment tax credit rate
    pub itc_rate: Rate,
    /// Fraction of the credit that reduces depreciable basis
    pub itc_basis_reduction: Rate,
    /// Amortization period of the credit (0 = taken immediately)
    pub itc_life: Years,
}

impl RecoveryTerms {
    pub fn depreciation(&self) -> DepreciationRule {
        DepreciationRule {
            method: self.method,
            life: self.life,
            decline_rate: self.decline_rate,
        }
    }

    /// b = s179 + (1 - s179) * bonus
    pub fn expensing_share(&self) -> CostCapResult<Rate> {
        expensing_share(self.section_179, self.bonus)
    }

    pub fn validate(&self) -> CostCapResult<()> {
        share("bonus", self.bonus)?;
        share("section_179", self.section_179)?;
        share("itc_rate", self.itc_rate)?;
        share("itc_basis_reduction", self.itc_basis_reduction)?;
        if self.life < Decimal::ZERO {
            return Err(CostCapError::invalid("life", "tax life cannot be negative"));
        }
        if self.itc_life < Decimal::ZERO {
            return Err(CostCapError::invalid(
                "itc_life",
                "credit amortization life cannot be negative",
            ));
        }
        if self.method == RecoveryMethod::DecliningBalance && self.decline_rate < Decimal::ONE {
            return Err(CostCapError::invalid(
                "decline_rate",
                format!("declining-balance rate must be at least 1, got {}", self.decline_rate),
            ));
        }
        Ok(())
    }

    /// Basis left for depreciation once the credit's basis reduction applies.
    fn depreciable_basis(&self) -> Rate {
        Decimal::ONE - self.itc_rate * self.itc_basis_reduction
    }
}

/// Effective expensing share from section 179 and bonus depreciation.
pub fn expensing_share(section_179: Rate, bonus: Rate) -> CostCapResult<Rate> {
    share("section_179", section_179)?;
    share("bonus", bonus)?;
    Ok(section_179 + (Decimal::ONE - section_179) * bonus)
}

/// PV of an investment tax credit at rate `credit` amortized straight-line
/// over `life` years (taken immediately when `life` is 0).
pub fn itc_present_value(credit: Rate, r: Rate, life: Years) -> CostCapResult<Decimal> {
    if r <= Decimal::ZERO {
        return Err(CostCapError::invalid(
            "discount_rate",
            format!("nominal discount rate must be positive, got {r}"),
        ));
    }
    if life < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "itc_life",
            "credit amortization life cannot be negative",
        ));
    }
    if life.is_zero() {
        return Ok(credit);
    }
    Ok(credit / (r * life) * (Decimal::ONE - exp_decimal(-(r * life))?))
}

/// Static tax shield: Z = tau (1 - itc*basis) (b + (1 - b) D) + PV(ITC).
pub fn cost_recovery_shield(
    terms: &RecoveryTerms,
    r: Rate,
    inflation: Rate,
    delta: Rate,
    tax_rate: Rate,
) -> CostCapResult<Decimal> {
    terms.validate()?;
    let d = terms.depreciation().present_value(r, inflation, delta)?;
    let b = terms.expensing_share()?;
    let itc = itc_present_value(terms.itc_rate, r, terms.itc_life)?;
    Ok(tax_rate * terms.depreciable_basis() * (b + (Decimal::ONE - b) * d) + itc)
}

/// Forward-looking tax shield from a per-period deduction schedule that
/// already carries the expensing share: Z = (1 - itc*basis) sum(tau_j D_j) + PV(ITC).
pub fn cost_recovery_shield_path(
    terms: &RecoveryTerms,
    schedule: &[Decimal],
    r: Rate,
    tax_rates: &[Rate],
) -> CostCapResult<Decimal> {
    terms.validate()?;
    check_path_len("tax_rates", tax_rates, schedule.len())?;
    let deductions: Decimal = schedule.iter().zip(tax_rates).map(|(d, t)| d * t).sum();
    let itc = itc_present_value(terms.itc_rate, r, terms.itc_life)?;
    Ok(terms.depreciable_basis() * deductions + itc)
}

fn share(field: &str, value: Rate) -> CostCapResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CostCapError::invalid(
            field,
            format!("must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FORWARD_PERIODS;
    use rust_decimal_macros::dec;

    fn terms(method: RecoveryMethod) -> RecoveryTerms {
        RecoveryTerms {
            method,
            life: dec!(7),
            decline_rate: dec!(2),
            bonus: dec!(0.4),
            section_179: dec!(0.1),
            itc_rate: Decimal::ZERO,
            itc_basis_reduction: Decimal::ZERO,
            itc_life: Decimal::ZERO,
        }
    }

    #[test]
    fn test_expensing_share() {
        // 0.1 + 0.9 * 0.4 = 0.46
        assert_eq!(expensing_share(dec!(0.1), dec!(0.4)).unwrap(), dec!(0.46));
        assert!(expensing_share(dec!(1.1), dec!(0.4)).is_err());
    }

    #[test]
    fn test_itc_immediate_and_amortized() {
        assert_eq!(itc_present_value(dec!(0.1), dec!(0.07), Decimal::ZERO).unwrap(), dec!(0.1));
        let amortized = itc_present_value(dec!(0.1), dec!(0.07), dec!(5)).unwrap();
        assert!(amortized < dec!(0.1) && amortized > dec!(0.08), "got {amortized}");
    }

    #[test]
    fn test_full_expensing_shield_equals_tax_rate() {
        let mut t = terms(RecoveryMethod::StraightLine);
        t.bonus = Decimal::ONE;
        let z = cost_recovery_shield(&t, dec!(0.07), dec!(0.02), dec!(0.1), dec!(0.21)).unwrap();
        assert_eq!(z, dec!(0.21));
    }

    #[test]
    fn test_itc_adds_to_shield_and_reduces_basis() {
        let base = terms(RecoveryMethod::DecliningBalance);
        let mut with_itc = base;
        with_itc.itc_rate = dec!(0.1);
        with_itc.itc_basis_reduction = dec!(0.5);
        let shield = |t: &RecoveryTerms| {
            cost_recovery_shield(t, dec!(0.07), dec!(0.02), dec!(0.1), dec!(0.21)).unwrap()
        };
        let (z0, z1) = (shield(&base), shield(&with_itc));
        // basis shrinks to 95% and the credit adds 0.1
        assert!((z1 - (z0 * dec!(0.95) + dec!(0.1))).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_constant_path_matches_static_shield() {
        let tau = dec!(0.21);
        for method in [
            RecoveryMethod::DecliningBalance,
            RecoveryMethod::StraightLine,
            RecoveryMethod::Expensing,
            RecoveryMethod::Economic,
        ] {
            let mut t = terms(method);
            t.itc_rate = dec!(0.05);
            t.itc_life = dec!(3);
            let b = t.expensing_share().unwrap();
            let schedule = t
                .depreciation()
                .schedule(dec!(0.07), dec!(0.02), dec!(0.1), b, FORWARD_PERIODS)
                .unwrap();
            let path = vec![tau; FORWARD_PERIODS];
            let forward = cost_recovery_shield_path(&t, &schedule, dec!(0.07), &path).unwrap();
            let fixed = cost_recovery_shield(&t, dec!(0.07), dec!(0.02), dec!(0.1), tau).unwrap();
            assert!((forward - fixed).abs() < dec!(0.000001), "{method}: {forward} vs {fixed}");
        }
    }

    #[test]
    fn test_path_length_mismatch_rejected() {
        let t = terms(RecoveryMethod::StraightLine);
        let schedule = vec![dec!(0.02); 50];
        let path = vec![dec!(0.21); 49];
        assert!(cost_recovery_shield_path(&t, &schedule, dec!(0.07), &path).is_err());
    }
}
