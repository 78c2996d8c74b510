use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CostCapError;
use crate::etr::saver::InvestorShares;
use crate::types::{Rate, Regime};
use crate::CostCapResult;

/// Economic environment shared by every cell of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicParameters {
    /// Nominal risk-free rate
    pub risk_free_rate: Rate,
    /// Expected inflation
    pub inflation: Rate,
    /// Bond premium over the risk-free rate
    pub debt_premium: Rate,
    /// Equity premium over the risk-free rate
    pub equity_premium: Rate,
    /// Pre-tax return on a profitable investment, for average tax rates
    pub profitability: Rate,
    /// State and local property tax rate on tangible assets
    pub property_tax_rate: Rate,
    #[serde(default)]
    pub investor_shares: InvestorShares,
    /// Add state and local property taxes to the cost of capital
    #[serde(default)]
    pub include_state_local: bool,
    /// Use forward-looking tax paths instead of current-year rates
    #[serde(default)]
    pub forward_looking: bool,
}

impl Default for EconomicParameters {
    fn default() -> Self {
        Self {
            risk_free_rate: dec!(0.025),
            inflation: dec!(0.02),
            debt_premium: dec!(0.023),
            equity_premium: dec!(0.05),
            profitability: dec!(0.2),
            property_tax_rate: dec!(0.01),
            investor_shares: InvestorShares::default(),
            include_state_local: false,
            forward_looking: false,
        }
    }
}

impl EconomicParameters {
    /// Required nominal return on debt, r_d = r_f + debt premium.
    pub fn cost_of_debt(&self) -> Rate {
        self.risk_free_rate + self.debt_premium
    }

    /// Required nominal return on equity, r_e = r_f + equity premium.
    pub fn cost_of_equity(&self) -> Rate {
        self.risk_free_rate + self.equity_premium
    }

    pub fn regime(&self) -> Regime {
        if self.forward_looking {
            Regime::ForwardLooking
        } else {
            Regime::Static
        }
    }

    pub fn validate(&self) -> CostCapResult<()> {
        non_negative("risk_free_rate", self.risk_free_rate)?;
        non_negative("debt_premium", self.debt_premium)?;
        non_negative("equity_premium", self.equity_premium)?;
        non_negative("property_tax_rate", self.property_tax_rate)?;
        if self.inflation <= dec!(-1) {
            return Err(CostCapError::invalid("inflation", "inflation must exceed -100%"));
        }
        if self.cost_of_debt() <= self.inflation {
            return Err(CostCapError::invalid(
                "debt_premium",
                format!(
                    "nominal return on debt ({}) must exceed inflation ({})",
                    self.cost_of_debt(),
                    self.inflation
                ),
            ));
        }
        if self.profitability <= dec!(0.1) {
            return Err(CostCapError::invalid(
                "profitability",
                format!("must exceed 0.1, got {}", self.profitability),
            ));
        }
        self.investor_shares.validate()
    }

    /// Apply named overrides, all or nothing. Unknown names and values that
    /// leave the parameters invalid are rejected without changing `self`.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, Decimal>) -> CostCapResult<()> {
        let mut updated = self.clone();
        for (name, value) in overrides {
            let value = *value;
            let shares = &mut updated.investor_shares;
            match name.as_str() {
                "risk_free_rate" | "rf" => updated.risk_free_rate = value,
                "inflation" | "pi" => updated.inflation = value,
                "debt_premium" | "premD" => updated.debt_premium = value,
                "equity_premium" | "premE" => updated.equity_premium = value,
                "profitability" | "p" => updated.profitability = value,
                "property_tax_rate" => updated.property_tax_rate = value,
                "taxable_debt_corp" | "txshr_d_c" => shares.taxable_debt_corp = value,
                "taxable_debt_noncorp" | "txshr_d_nc" => shares.taxable_debt_noncorp = value,
                "taxable_equity" | "txshr_e" => shares.taxable_equity = value,
                "holding_period_long" | "h_lcg" => shares.holding_period_long = value,
                "holding_period_death" | "h_xcg" => shares.holding_period_death = value,
                "dividend_share" | "divshr" => shares.dividend_share = value,
                "short_gains_weight" | "wt_scg" => shares.short_gains_weight = value,
                "long_gains_weight" | "wt_lcg" => shares.long_gains_weight = value,
                "include_state_local" => updated.include_state_local = switch(name, value)?,
                "forward_looking" => updated.forward_looking = switch(name, value)?,
                _ => {
                    return Err(CostCapError::invalid(
                        name.as_str(),
                        "unknown economic parameter",
                    ))
                }
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn non_negative(field: &str, value: Rate) -> CostCapResult<()> {
    if value < Decimal::ZERO {
        return Err(CostCapError::invalid(field, format!("cannot be negative, got {value}")));
    }
    Ok(())
}

fn switch(field: &str, value: Decimal) -> CostCapResult<bool> {
    if value.is_zero() {
        Ok(false)
    } else if value == Decimal::ONE {
        Ok(true)
    } else {
        Err(CostCapError::invalid(field, format!("switch must be 0 or 1, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_required_returns() {
        let p = EconomicParameters::default();
        assert_eq!(p.cost_of_debt(), dec!(0.048));
        assert_eq!(p.cost_of_equity(), dec!(0.075));
        assert_eq!(p.regime(), Regime::Static);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let mut p = EconomicParameters::default();
        let overrides = BTreeMap::from([
            ("inflation".to_string(), dec!(0.025)),
            ("h_lcg".to_string(), dec!(10)),
            ("forward_looking".to_string(), Decimal::ONE),
        ]);
        p.apply_overrides(&overrides).unwrap();
        assert_eq!(p.inflation, dec!(0.025));
        assert_eq!(p.investor_shares.holding_period_long, dec!(10));
        assert_eq!(p.regime(), Regime::ForwardLooking);
    }

    #[test]
    fn test_unknown_override_rejected_atomically() {
        let mut p = EconomicParameters::default();
        let overrides = BTreeMap::from([
            ("inflation".to_string(), dec!(0.03)),
            ("beta".to_string(), dec!(1.1)),
        ]);
        match p.apply_overrides(&overrides) {
            Err(CostCapError::InvalidInput { field, .. }) => assert_eq!(field, "beta"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        assert_eq!(p, EconomicParameters::default());
    }

    #[test]
    fn test_invalid_override_value_rejected() {
        let mut p = EconomicParameters::default();
        let share = BTreeMap::from([("txshr_e".to_string(), dec!(1.5))]);
        assert!(p.apply_overrides(&share).is_err());
        let floor = BTreeMap::from([("p".to_string(), dec!(0.08))]);
        assert!(p.apply_overrides(&floor).is_err());
        let flag = BTreeMap::from([("include_state_local".to_string(), dec!(0.5))]);
        assert!(p.apply_overrides(&flag).is_err());
    }
}
