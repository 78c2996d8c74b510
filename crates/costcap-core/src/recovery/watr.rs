//! Discount-weighted average of a tax-rate path.

use rust_decimal::Decimal;

use crate::error::CostCapError;
use crate::recovery::mid_year_weights;
use crate::types::Rate;
use crate::CostCapResult;

/// T = sum(w_j tau_j), where w_j is the share of the asset's discounted
/// return stream (decaying at r - pi + delta) that falls in period j.
///
/// Applied to statutory rates this gives the forward-looking T; applied to
/// property tax add-ons it gives T_prop.
pub fn weighted_average_tax_rate(
    r: Rate,
    inflation: Rate,
    delta: Rate,
    path: &[Rate],
) -> CostCapResult<Rate> {
    if path.is_empty() {
        return Err(CostCapError::InsufficientData(
            "tax-rate path is empty".into(),
        ));
    }
    let weights = mid_year_weights(r - inflation + delta, path.len())?;
    Ok(weights.iter().zip(path).map(|(w, t)| w * t).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constant_path_returns_the_rate() {
        let path = vec![dec!(0.21); 50];
        let t = weighted_average_tax_rate(dec!(0.07), dec!(0.02), dec!(0.1), &path).unwrap();
        assert!((t - dec!(0.21)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_near_term_rates_dominate() {
        // 35% for the first five periods, 21% afterwards
        let mut path = vec![dec!(0.21); 50];
        for t in path.iter_mut().take(5) {
            *t = dec!(0.35);
        }
        let t = weighted_average_tax_rate(dec!(0.07), dec!(0.02), dec!(0.1), &path).unwrap();
        assert!(t > dec!(0.21) && t < dec!(0.35));

        // weight on the first five periods is 1 - e^{-0.15 * 4.5}
        let front = Decimal::ONE - crate::math::decay(dec!(0.15), dec!(4.5)).unwrap();
        let expected = dec!(0.21) + dec!(0.14) * front;
        assert!((t - expected).abs() < dec!(0.0000000001), "got {t}, expected {expected}");
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(matches!(
            weighted_average_tax_rate(dec!(0.07), dec!(0.02), dec!(0.1), &[]),
            Err(CostCapError::InsufficientData(_))
        ));
    }
}
