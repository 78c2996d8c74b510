//! Interest tax shield F: the PV of interest deductions per dollar of
//! investment, given the debt-financed share and its cost.

use rust_decimal::Decimal;

use crate::error::CostCapError;
use crate::math::decay;
use crate::recovery::{check_path_len, period_bounds};
use crate::types::{Rate, Years};
use crate::CostCapResult;

/// Static shield: F = debt_share * r_d * phi * tau / (r - pi + delta).
pub fn interest_shield(
    debt_share: Rate,
    cost_of_debt: Rate,
    r: Rate,
    inflation: Rate,
    delta: Rate,
    tax_rate: Rate,
    interest_deductible: Rate,
) -> CostCapResult<Decimal> {
    validate_financing(debt_share, cost_of_debt, interest_deductible)?;
    let k = net_rate(r, inflation, delta)?;
    Ok(debt_share * cost_of_debt * interest_deductible * tax_rate / k)
}

/// PV of interest paid during [start, end] (`None` = infinity) on debt that
/// amortizes with the asset at delta. A zero net rate prorates linearly.
pub fn pv_interest_period(
    debt_share: Rate,
    cost_of_debt: Rate,
    r: Rate,
    inflation: Rate,
    delta: Rate,
    start: Years,
    end: Option<Years>,
) -> CostCapResult<Decimal> {
    let k = r - inflation + delta;
    let flow = debt_share * cost_of_debt;
    match end {
        Some(b) if b < start => Err(CostCapError::invalid(
            "period",
            "period end precedes its start",
        )),
        Some(b) if k.is_zero() => Ok(flow * (b - start)),
        Some(b) => Ok(flow / k * (decay(k, start)? - decay(k, b)?)),
        None if k <= Decimal::ZERO => Err(CostCapError::DivisionByZero {
            context: format!("interest allocation tail with net discount rate {k}"),
        }),
        None => Ok(flow / k * decay(k, start)?),
    }
}

/// Per-period PV of interest payments over a forward path whose last period
/// runs to infinity. Sums to debt_share * r_d / (r - pi + delta).
pub fn interest_allocation(
    debt_share: Rate,
    cost_of_debt: Rate,
    r: Rate,
    inflation: Rate,
    delta: Rate,
    periods: usize,
) -> CostCapResult<Vec<Decimal>> {
    if periods == 0 {
        return Err(CostCapError::invalid(
            "periods",
            "a forward-looking path needs at least one period",
        ));
    }
    net_rate(r, inflation, delta)?;
    (0..periods)
        .map(|j| {
            let (start, end) = period_bounds(j, periods);
            pv_interest_period(debt_share, cost_of_debt, r, inflation, delta, start, end)
        })
        .collect()
}

/// Forward-looking shield: F = sum(phi_j tau_j alloc_j).
pub fn interest_shield_path(
    debt_share: Rate,
    cost_of_debt: Rate,
    r: Rate,
    inflation: Rate,
    delta: Rate,
    tax_rates: &[Rate],
    interest_deductible: &[Rate],
) -> CostCapResult<Decimal> {
    check_path_len("interest_deductible", interest_deductible, tax_rates.len())?;
    for phi in interest_deductible {
        validate_financing(debt_share, cost_of_debt, *phi)?;
    }
    let allocation =
        interest_allocation(debt_share, cost_of_debt, r, inflation, delta, tax_rates.len())?;
    Ok(allocation
        .iter()
        .zip(tax_rates.iter().zip(interest_deductible))
        .map(|(a, (t, phi))| phi * t * a)
        .sum())
}

fn net_rate(r: Rate, inflation: Rate, delta: Rate) -> CostCapResult<Rate> {
    let k = r - inflation + delta;
    if k <= Decimal::ZERO {
        return Err(CostCapError::DivisionByZero {
            context: format!("interest shield with net discount rate r - pi + delta = {k}"),
        });
    }
    Ok(k)
}

fn validate_financing(debt_share: Rate, cost_of_debt: Rate, phi: Rate) -> CostCapResult<()> {
    if debt_share < Decimal::ZERO || debt_share > Decimal::ONE {
        return Err(CostCapError::invalid(
            "debt_share",
            format!("must be between 0 and 1, got {debt_share}"),
        ));
    }
    if cost_of_debt < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "cost_of_debt",
            "nominal cost of debt cannot be negative",
        ));
    }
    if phi < Decimal::ZERO || phi > Decimal::ONE {
        return Err(CostCapError::invalid(
            "interest_deductible",
            format!("deductible share of interest must be between 0 and 1, got {phi}"),
        ));
    }
    Ok(())
}
