//! Decimal transcendental helpers (pure Decimal, no f64).
//!
//! Present values here are continuous-time integrals, so every formula leans
//! on `exp`; the saver-return closed forms also need `ln`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::CostCapError;
use crate::CostCapResult;

/// Below this exponent `exp` rounds to zero at the finest Decimal scale.
const EXP_UNDERFLOW: Decimal = dec!(-66);
/// Above this exponent `exp` no longer fits in a Decimal.
const EXP_OVERFLOW: Decimal = dec!(64);
const LN_TOLERANCE: Decimal = dec!(0.0000000000000000000001);

/// Taylor series exp(x) with range reduction for |x| > 2.
///
/// For large |x| the identity exp(x) = exp(x/2^k)^(2^k) brings the argument
/// into a range where the series converges rapidly, then the result is
/// squared k times. Arguments whose exponential exceeds the Decimal range are
/// rejected; those below e^-66 (under 1e-28) round to zero.
pub fn exp_decimal(x: Decimal) -> CostCapResult<Decimal> {
    if x > EXP_OVERFLOW {
        return Err(CostCapError::invalid(
            "exp argument",
            format!("e^{x} exceeds the Decimal range (exponent must be at most {EXP_OVERFLOW})"),
        ));
    }
    if x < EXP_UNDERFLOW {
        return Ok(Decimal::ZERO);
    }
    let two = Decimal::TWO;

    let mut k: u32 = 0;
    let mut reduced = x;
    while reduced.abs() > two {
        reduced /= two;
        k += 1;
    }

    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for n in 1..=25u64 {
        term *= reduced / Decimal::from(n);
        sum += term;
    }

    for _ in 0..k {
        sum *= sum;
    }

    Ok(sum)
}

/// Discount factor e^(-rate * t).
pub fn decay(rate: Decimal, t: Decimal) -> CostCapResult<Decimal> {
    exp_decimal(-(rate * t))
}

/// Natural logarithm via Newton's method on f(y) = exp(y) - x.
///
///   y_{n+1} = y_n - 1 + x / exp(y_n)
pub fn ln_decimal(x: Decimal) -> CostCapResult<Decimal> {
    if x <= Decimal::ZERO {
        return Err(CostCapError::invalid(
            "ln argument",
            format!("logarithm requires a positive argument, got {x}"),
        ));
    }
    if x == Decimal::ONE {
        return Ok(Decimal::ZERO);
    }

    // Initial guess from powers of two
    let mut guess = Decimal::ZERO;
    let mut temp = x;
    let two = Decimal::TWO;
    let ln2_approx = dec!(0.6931471805599453);

    if temp > Decimal::ONE {
        while temp > two {
            temp /= two;
            guess += ln2_approx;
        }
    } else {
        while temp < Decimal::ONE {
            temp *= two;
            guess -= ln2_approx;
        }
    }

    for _ in 0..40 {
        let ey = exp_decimal(guess)?;
        if ey.is_zero() {
            break;
        }
        let next = guess - Decimal::ONE + x / ey;
        let step = (next - guess).abs();
        guess = next;
        if step < LN_TOLERANCE {
            break;
        }
    }

    Ok(guess)
}
