//! Present-value building blocks shared by the cost-of-capital engine:
//! depreciation deductions, the interest tax shield and the discount-weighted
//! average tax rate.
//!
//! Forward-looking quantities use the mid-year convention: period 0 covers
//! [0, 0.5], period j covers [j - 0.5, j + 0.5] and the last period absorbs the
//! tail from its start to infinity.

pub mod depreciation;
pub mod financing;
pub mod shield;
pub mod watr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::CostCapError;
use crate::math::decay;
use crate::types::Rate;
use crate::CostCapResult;

/// Time span of period `j` out of `periods`; `None` as the end means infinity.
pub fn period_bounds(j: usize, periods: usize) -> (Decimal, Option<Decimal>) {
    let start = if j == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(j as u64) - dec!(0.5)
    };
    if j + 1 >= periods {
        (start, None)
    } else {
        (start, Some(Decimal::from(j as u64) + dec!(0.5)))
    }
}

/// Discount mass falling in each mid-year period for continuous decay at `rate`:
/// w_j = e^(-rate a_j) - e^(-rate b_j), last period e^(-rate a_last).
///
/// The weights sum to one. A zero rate puts all of the mass in the tail.
pub fn mid_year_weights(rate: Rate, periods: usize) -> CostCapResult<Vec<Decimal>> {
    if periods == 0 {
        return Err(CostCapError::invalid(
            "periods",
            "a forward-looking path needs at least one period",
        ));
    }
    if rate < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "net discount rate",
            format!("r - pi + delta must be non-negative to discount an infinite tail, got {rate}"),
        ));
    }

    let half = decay(rate, dec!(0.5))?;
    let step = decay(rate, Decimal::ONE)?;

    let mut weights = Vec::with_capacity(periods);
    let mut boundary = Decimal::ONE;
    for j in 0..periods {
        if j + 1 == periods {
            weights.push(boundary);
            break;
        }
        let next = if j == 0 { half } else { boundary * step };
        weights.push(boundary - next);
        boundary = next;
    }
    Ok(weights)
}

pub(crate) fn check_path_len(
    field: &str,
    path: &[Decimal],
    expected: usize,
) -> CostCapResult<()> {
    if path.len() != expected {
        return Err(CostCapError::invalid(
            field,
            format!("path has {} periods, expected {expected}", path.len()),
        ));
    }
    Ok(())
}
