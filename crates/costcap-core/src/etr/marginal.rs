use rust_decimal::Decimal;

use crate::error::CostCapError;
use crate::types::Rate;
use crate::CostCapResult;

/// METR = (rho - r + pi) / rho: the share of the pre-tax required return
/// taken by business-level taxes.
///
/// A zero cost of capital leaves the rate undefined and is reported as
/// `DivisionByZero`.
pub fn metr(cost_of_capital: Rate, discount_rate: Rate, inflation: Rate) -> CostCapResult<Rate> {
    let wedge = tax_wedge(cost_of_capital, discount_rate - inflation);
    wedge_share(wedge, cost_of_capital, "METR")
}

/// METTR = (rho - s) / rho, with s the saver's real after-tax return.
pub fn mettr(cost_of_capital: Rate, saver_return: Rate) -> CostCapResult<Rate> {
    let wedge = tax_wedge(cost_of_capital, saver_return);
    wedge_share(wedge, cost_of_capital, "METTR")
}

/// Tax wedge in percentage points of return: the pre-tax return less the
/// real return left after tax, rho - net.
pub fn tax_wedge(cost_of_capital: Rate, net_return: Rate) -> Decimal {
    cost_of_capital - net_return
}

fn wedge_share(wedge: Decimal, cost_of_capital: Rate, measure: &str) -> CostCapResult<Rate> {
    if cost_of_capital.is_zero() {
        return Err(CostCapError::DivisionByZero {
            context: format!("{measure} with a zero cost of capital"),
        });
    }
    Ok(wedge / cost_of_capital)
}
