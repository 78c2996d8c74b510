//! Saver's real after-tax return on funds supplied to a business, the
//! benchmark against which METTR measures the total tax wedge.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CostCapError;
use crate::math::{exp_decimal, ln_decimal};
use crate::types::{Rate, Years};
use crate::CostCapResult;

/// Portfolio composition and realization behavior of savers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestorShares {
    /// Share of corporate debt held in taxable accounts
    pub taxable_debt_corp: Rate,
    /// Share of non-corporate debt held in taxable accounts
    pub taxable_debt_noncorp: Rate,
    /// Share of corporate equity held in taxable accounts
    pub taxable_equity: Rate,
    /// Holding period of long-term gains realized during life
    pub holding_period_long: Years,
    /// Holding period of gains held until death
    pub holding_period_death: Years,
    /// Share of equity return paid out as dividends
    pub dividend_share: Rate,
    /// Share of gains realized short-term
    pub short_gains_weight: Rate,
    /// Share of gains realized long-term
    pub long_gains_weight: Rate,
}

impl Default for InvestorShares {
    fn default() -> Self {
        Self {
            taxable_debt_corp: dec!(0.35),
            taxable_debt_noncorp: dec!(0.6),
            taxable_equity: dec!(0.4),
            holding_period_long: dec!(8),
            holding_period_death: dec!(30),
            dividend_share: dec!(0.4),
            short_gains_weight: dec!(0.03),
            long_gains_weight: dec!(0.6),
        }
    }
}

impl InvestorShares {
    pub fn validate(&self) -> CostCapResult<()> {
        let shares = [
            ("taxable_debt_corp", self.taxable_debt_corp),
            ("taxable_debt_noncorp", self.taxable_debt_noncorp),
            ("taxable_equity", self.taxable_equity),
            ("short_gains_weight", self.short_gains_weight),
            ("long_gains_weight", self.long_gains_weight),
        ];
        for (field, value) in shares {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(CostCapError::invalid(
                    field,
                    format!("must be between 0 and 1, got {value}"),
                ));
            }
        }
        if self.short_gains_weight + self.long_gains_weight > Decimal::ONE {
            return Err(CostCapError::invalid(
                "short_gains_weight + long_gains_weight",
                "realization weights cannot exceed 1",
            ));
        }
        if self.dividend_share < Decimal::ZERO || self.dividend_share >= Decimal::ONE {
            return Err(CostCapError::invalid(
                "dividend_share",
                format!("must be in [0, 1), got {}", self.dividend_share),
            ));
        }
        for (field, h) in [
            ("holding_period_long", self.holding_period_long),
            ("holding_period_death", self.holding_period_death),
        ] {
            if h <= Decimal::ZERO {
                return Err(CostCapError::invalid(field, "holding period must be positive"));
            }
        }
        Ok(())
    }
}

/// Investor-level tax rates for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestorTaxRates {
    pub interest: Rate,
    pub dividends: Rate,
    pub short_gains: Rate,
    pub long_gains: Rate,
    /// Gains held until death escape tax through basis step-up
    pub step_up_basis: bool,
}

/// Real after-tax return to savers financing a C corporation:
/// s_c = debt_share * s_d + (1 - debt_share) * s_e.
pub fn saver_return_corporate(
    cost_of_debt: Rate,
    cost_of_equity: Rate,
    inflation: Rate,
    debt_share: Rate,
    shares: &InvestorShares,
    rates: &InvestorTaxRates,
) -> CostCapResult<Rate> {
    shares.validate()?;
    let s_d = lender_return(cost_of_debt, inflation, shares.taxable_debt_corp, rates.interest);

    let m = shares.dividend_share;
    let death_rate = if rates.step_up_basis {
        Decimal::ZERO
    } else {
        rates.long_gains
    };
    let s_scg = cost_of_equity * (Decimal::ONE - rates.short_gains);
    let s_lcg =
        accrual_gains_return(cost_of_equity, shares.holding_period_long, m, rates.long_gains)?;
    let s_xcg = accrual_gains_return(cost_of_equity, shares.holding_period_death, m, death_rate)?;
    let s_cg = shares.short_gains_weight * s_scg
        + shares.long_gains_weight * s_lcg
        + (Decimal::ONE - shares.short_gains_weight - shares.long_gains_weight) * s_xcg
        - inflation;

    let w_e = shares.taxable_equity;
    let dividends = m * cost_of_equity * (Decimal::ONE - rates.dividends);
    let gains = (Decimal::ONE - m) * (s_cg + inflation);
    let s_e = w_e * (dividends + gains) + (Decimal::ONE - w_e) * cost_of_equity
        - inflation;

    Ok(debt_share * s_d + (Decimal::ONE - debt_share) * s_e)
}

/// Real after-tax return to savers financing a pass-through: equity income is
/// taxed at the business level only, so s_e = r_e - pi.
pub fn saver_return_noncorporate(
    cost_of_debt: Rate,
    cost_of_equity: Rate,
    inflation: Rate,
    debt_share: Rate,
    shares: &InvestorShares,
    interest_tax_rate: Rate,
) -> CostCapResult<Rate> {
    shares.validate()?;
    let s_d =
        lender_return(cost_of_debt, inflation, shares.taxable_debt_noncorp, interest_tax_rate);
    let s_e = cost_of_equity - inflation;
    Ok(debt_share * s_d + (Decimal::ONE - debt_share) * s_e)
}

fn lender_return(
    cost_of_debt: Rate,
    inflation: Rate,
    taxable_share: Rate,
    interest_tax: Rate,
) -> Rate {
    taxable_share * cost_of_debt * (Decimal::ONE - interest_tax)
        + (Decimal::ONE - taxable_share) * cost_of_debt
        - inflation
}

/// Annualized after-tax return on gains accrued for `holding` years and
/// taxed at realization: ln(e^{h(1-m) r_e} (1 - tau) + tau) / (h(1-m)).
fn accrual_gains_return(
    cost_of_equity: Rate,
    holding: Years,
    dividend_share: Rate,
    tax_rate: Rate,
) -> CostCapResult<Rate> {
    let horizon = holding * (Decimal::ONE - dividend_share);
    if horizon <= Decimal::ZERO {
        return Err(CostCapError::DivisionByZero {
            context: "capital gains accrual over a zero horizon".into(),
        });
    }
    let grown = exp_decimal(horizon * cost_of_equity)?;
    Ok(ln_decimal(grown * (Decimal::ONE - tax_rate) + tax_rate)? / horizon)
}
