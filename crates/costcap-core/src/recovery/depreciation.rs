use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CostCapError;
use crate::math::{decay, exp_decimal};
use crate::recovery::period_bounds;
use crate::types::{Rate, Years};
use crate::CostCapResult;

// ---------------------------------------------------------------------------
// Recovery method
// ---------------------------------------------------------------------------

/// Tax depreciation method, tagged as in capital cost recovery tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryMethod {
    #[serde(rename = "DB")]
    DecliningBalance,
    #[serde(rename = "SL")]
    StraightLine,
    #[serde(rename = "EXP")]
    Expensing,
    #[serde(rename = "ECON")]
    Economic,
}

impl RecoveryMethod {
    pub fn tag(self) -> &'static str {
        match self {
            RecoveryMethod::DecliningBalance => "DB",
            RecoveryMethod::StraightLine => "SL",
            RecoveryMethod::Expensing => "EXP",
            RecoveryMethod::Economic => "ECON",
        }
    }
}

impl fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RecoveryMethod {
    type Err = CostCapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "DB" => Ok(RecoveryMethod::DecliningBalance),
            "SL" => Ok(RecoveryMethod::StraightLine),
            "EXP" => Ok(RecoveryMethod::Expensing),
            "ECON" => Ok(RecoveryMethod::Economic),
            other => Err(CostCapError::invalid(
                "method",
                format!(
                    "unknown recovery method tag '{other}' (expected DB, SL, EXP or ECON)"
                ),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Static present values
// ---------------------------------------------------------------------------

/// PV of declining-balance deductions switching to straight-line at
/// t1 = L(1 - 1/n), discounted continuously at nominal rate `r`.
///
/// D = n/(rL+n) (1 - e^{-(rL+n)(n-1)/n}) + n/(rL) e^{1-n-rL} (e^{rL/n} - 1)
pub fn pv_declining_balance(
    r: Rate,
    life: Years,
    decline_rate: Decimal,
) -> CostCapResult<Decimal> {
    require_positive_rate(r)?;
    require_life(life)?;
    require_decline_rate(decline_rate)?;
    if life.is_zero() {
        return Ok(Decimal::ONE);
    }
    let n = decline_rate;
    let rl = r * life;
    let switch_decay = exp_decimal(-((rl + n) * (n - Decimal::ONE) / n))?;
    let term1 = n / (rl + n) * (Decimal::ONE - switch_decay);
    let term2 = n / rl
        * exp_decimal(Decimal::ONE - n - rl)?
        * (exp_decimal(rl / n)? - Decimal::ONE);
    Ok(term1 + term2)
}

/// PV of straight-line deductions: (1 - e^{-rL}) / (rL), or 1 for L = 0.
pub fn pv_straight_line(r: Rate, life: Years) -> CostCapResult<Decimal> {
    require_positive_rate(r)?;
    require_life(life)?;
    if life.is_zero() {
        return Ok(Decimal::ONE);
    }
    let rl = r * life;
    Ok((Decimal::ONE - exp_decimal(-rl)?) / rl)
}

/// PV of deductions at the economic depreciation rate: delta / (r - pi + delta).
pub fn pv_economic(r: Rate, inflation: Rate, delta: Rate) -> CostCapResult<Decimal> {
    require_real_rate(r, inflation)?;
    require_delta(delta)?;
    Ok(delta / (r - inflation + delta))
}

// ---------------------------------------------------------------------------
// Per-period present values (mid-year convention)
// ---------------------------------------------------------------------------

/// PV of declining-balance / straight-line deductions accruing during
/// [start, end] (`None` = infinity). `decline_rate` = 1 is pure straight line.
///
/// Before t1 = L(1 - 1/n) the deduction decays exponentially at n/L; from t1
/// to L the remaining basis e^{1-n} is written off linearly; nothing accrues
/// after L. A zero nominal rate prorates the straight-line piece linearly.
pub fn pv_dbsl_period(
    r: Rate,
    life: Years,
    decline_rate: Decimal,
    start: Years,
    end: Option<Years>,
) -> CostCapResult<Decimal> {
    if r < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "discount_rate",
            format!("nominal discount rate cannot be negative, got {r}"),
        ));
    }
    if life <= Decimal::ZERO {
        return Err(CostCapError::invalid(
            "life",
            "per-period allocation needs a positive tax life; a zero life is expensing",
        ));
    }
    require_decline_rate(decline_rate)?;
    if matches!(end, Some(b) if b < start) {
        return Err(CostCapError::invalid("period", "period end precedes its start"));
    }

    let n = decline_rate;
    let decline = n / life;
    let switch = life * (Decimal::ONE - Decimal::ONE / n);
    let residual = exp_decimal(Decimal::ONE - n)?;

    let mut pv = Decimal::ZERO;

    // Exponential (declining-balance) piece over [start, min(end, t1)]
    if start < switch {
        let b = clip(end, switch);
        let g = r + decline;
        pv += decline / g * (decay(g, start)? - decay(g, b)?);
    }

    // Straight-line piece over [max(start, t1), min(end, L)]
    let a = start.max(switch);
    let b = clip(end, life);
    if a < b {
        pv += if r.is_zero() {
            residual * decline * (b - a)
        } else {
            decline / r * residual * (decay(r, a)? - decay(r, b)?)
        };
    }

    Ok(pv)
}

/// PV of economic depreciation deductions accruing during [start, end]
/// (`None` = infinity). A zero net rate r - pi + delta prorates linearly.
pub fn pv_economic_period(
    r: Rate,
    inflation: Rate,
    delta: Rate,
    start: Years,
    end: Option<Years>,
) -> CostCapResult<Decimal> {
    require_delta(delta)?;
    let k = r - inflation + delta;
    match end {
        Some(b) if k.is_zero() => Ok(delta * (b - start)),
        Some(b) => Ok(delta / k * (decay(k, start)? - decay(k, b)?)),
        None if k <= Decimal::ZERO => Err(CostCapError::DivisionByZero {
            context: format!("economic depreciation tail with net discount rate {k}"),
        }),
        None => Ok(delta / k * decay(k, start)?),
    }
}

// ---------------------------------------------------------------------------
// Depreciation rule
// ---------------------------------------------------------------------------

/// Method, tax life and declining-balance rate of one asset's recovery rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepreciationRule {
    pub method: RecoveryMethod,
    /// Tax recovery period in years
    pub life: Years,
    /// Declining-balance rate (2 = double declining, 1.5 = 150%)
    pub decline_rate: Decimal,
}

impl DepreciationRule {
    /// Static PV of deductions per dollar of depreciable basis.
    pub fn present_value(
        &self,
        r: Rate,
        inflation: Rate,
        delta: Rate,
    ) -> CostCapResult<Decimal> {
        match self.method {
            RecoveryMethod::DecliningBalance => {
                pv_declining_balance(r, self.life, self.decline_rate)
            }
            RecoveryMethod::StraightLine => pv_straight_line(r, self.life),
            RecoveryMethod::Economic => pv_economic(r, inflation, delta),
            RecoveryMethod::Expensing => Ok(Decimal::ONE),
        }
    }

    /// PV of deductions taken in each mid-year period, with the effective
    /// expensing share taken in full in period 0.
    pub fn schedule(
        &self,
        r: Rate,
        inflation: Rate,
        delta: Rate,
        expensing_share: Rate,
        periods: usize,
    ) -> CostCapResult<Vec<Decimal>> {
        if periods == 0 {
            return Err(CostCapError::invalid(
                "periods",
                "a depreciation schedule needs at least one period",
            ));
        }
        if expensing_share < Decimal::ZERO || expensing_share > Decimal::ONE {
            return Err(CostCapError::invalid(
                "expensing_share",
                format!("must be between 0 and 1, got {expensing_share}"),
            ));
        }

        let mut schedule = match self.method {
            RecoveryMethod::Expensing => {
                let mut s = vec![Decimal::ZERO; periods];
                s[0] = Decimal::ONE;
                return Ok(s);
            }
            RecoveryMethod::DecliningBalance => {
                self.dbsl_schedule(r, self.decline_rate, periods)?
            }
            RecoveryMethod::StraightLine => self.dbsl_schedule(r, Decimal::ONE, periods)?,
            RecoveryMethod::Economic => {
                require_real_rate(r, inflation)?;
                (0..periods)
                    .map(|j| {
                        let (start, end) = period_bounds(j, periods);
                        pv_economic_period(r, inflation, delta, start, end)
                    })
                    .collect::<CostCapResult<Vec<_>>>()?
            }
        };

        let remaining = Decimal::ONE - expensing_share;
        for pv in schedule.iter_mut() {
            *pv *= remaining;
        }
        schedule[0] += expensing_share;
        Ok(schedule)
    }

    fn dbsl_schedule(
        &self,
        r: Rate,
        decline_rate: Decimal,
        periods: usize,
    ) -> CostCapResult<Vec<Decimal>> {
        require_life(self.life)?;
        let mut schedule = vec![Decimal::ZERO; periods];
        if self.life.is_zero() {
            schedule[0] = Decimal::ONE;
            return Ok(schedule);
        }
        for (j, slot) in schedule.iter_mut().enumerate() {
            let (start, end) = period_bounds(j, periods);
            if start >= self.life {
                break;
            }
            *slot = pv_dbsl_period(r, self.life, decline_rate, start, end)?;
        }
        Ok(schedule)
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn clip(end: Option<Years>, limit: Years) -> Years {
    end.map_or(limit, |b| b.min(limit))
}

fn require_positive_rate(r: Rate) -> CostCapResult<()> {
    if r <= Decimal::ZERO {
        return Err(CostCapError::invalid(
            "discount_rate",
            format!("nominal discount rate must be positive, got {r}"),
        ));
    }
    Ok(())
}

fn require_real_rate(r: Rate, inflation: Rate) -> CostCapResult<()> {
    if r - inflation <= Decimal::ZERO {
        return Err(CostCapError::invalid(
            "discount_rate",
            format!("real discount rate must be positive (r = {r}, inflation = {inflation})"),
        ));
    }
    Ok(())
}

fn require_life(life: Years) -> CostCapResult<()> {
    if life < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "life",
            format!("tax life cannot be negative, got {life}"),
        ));
    }
    Ok(())
}

fn require_decline_rate(n: Decimal) -> CostCapResult<()> {
    if n < Decimal::ONE {
        return Err(CostCapError::invalid(
            "decline_rate",
            format!("declining-balance rate must be at least 1, got {n}"),
        ));
    }
    Ok(())
}

fn require_delta(delta: Rate) -> CostCapResult<()> {
    if delta < Decimal::ZERO {
        return Err(CostCapError::invalid(
            "delta",
            format!("economic depreciation rate cannot be negative, got {delta}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.000001);

    fn rule(method: RecoveryMethod, life: Decimal, n: Decimal) -> DepreciationRule {
        DepreciationRule {
            method,
            life,
            decline_rate: n,
        }
    }

    #[test]
    fn test_straight_line_reference() {
        // (1 - e^-0.35) / 0.35 = 0.843748315...
        let d = pv_straight_line(dec!(0.05), dec!(7)).unwrap();
        assert!((d - dec!(0.8437483150893901)).abs() < TOL, "got {d}");
    }

    #[test]
    fn test_straight_line_small_rate_limit() {
        let d = pv_straight_line(dec!(0.000001), dec!(39)).unwrap();
        assert!((d - Decimal::ONE).abs() < dec!(0.0001), "got {d}");
    }

    #[test]
    fn test_zero_life_is_expensing() {
        assert_eq!(pv_straight_line(dec!(0.07), Decimal::ZERO).unwrap(), Decimal::ONE);
        let db = pv_declining_balance(dec!(0.07), Decimal::ZERO, dec!(2)).unwrap();
        assert_eq!(db, Decimal::ONE);
    }

    #[test]
    fn test_declining_balance_reference() {
        // 200% DB, 5-year life at 7%
        let d = pv_declining_balance(dec!(0.07), dec!(5), dec!(2)).unwrap();
        assert!((d - dec!(0.8715461321779808)).abs() < TOL, "got {d}");
    }

    #[test]
    fn test_declining_balance_rate_one_is_straight_line() {
        let db = pv_declining_balance(dec!(0.06), dec!(15), Decimal::ONE).unwrap();
        let sl = pv_straight_line(dec!(0.06), dec!(15)).unwrap();
        assert!((db - sl).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_economic_reference() {
        let d = pv_economic(dec!(0.07), dec!(0.02), dec!(0.10)).unwrap();
        assert!((d - dec!(0.6666666666666667)).abs() < TOL);
    }

    #[test]
    fn test_economic_requires_positive_real_rate() {
        assert!(pv_economic(dec!(0.02), dec!(0.02), dec!(0.1)).is_err());
        assert!(pv_economic(dec!(0.01), dec!(0.02), dec!(0.1)).is_err());
    }

    #[test]
    fn test_domain_errors() {
        assert!(pv_straight_line(Decimal::ZERO, dec!(5)).is_err());
        assert!(pv_straight_line(dec!(0.05), dec!(-1)).is_err());
        assert!(pv_declining_balance(dec!(0.05), dec!(5), dec!(0.5)).is_err());
    }

    #[test]
    fn test_method_tags() {
        let db: RecoveryMethod = "DB".parse().unwrap();
        assert_eq!(db, RecoveryMethod::DecliningBalance);
        assert_eq!("ECON".parse::<RecoveryMethod>().unwrap(), RecoveryMethod::Economic);
        match "MACRS".parse::<RecoveryMethod>() {
            Err(CostCapError::InvalidInput { field, .. }) => assert_eq!(field, "method"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_expensing_schedule_is_unit_vector() {
        let s = rule(RecoveryMethod::Expensing, Decimal::ZERO, Decimal::ONE)
            .schedule(dec!(0.07), dec!(0.02), dec!(0.1), dec!(0.3), 50)
            .unwrap();
        assert_eq!(s[0], Decimal::ONE);
        assert!(s[1..].iter().all(|x| x.is_zero()));
        let pv = rule(RecoveryMethod::Expensing, Decimal::ZERO, Decimal::ONE)
            .present_value(dec!(0.9), dec!(0.02), dec!(0.1))
            .unwrap();
        assert_eq!(pv, Decimal::ONE);
    }

    #[test]
    fn test_schedule_sums_to_static_value() {
        let r = dec!(0.05);
        let cases = [
            rule(RecoveryMethod::StraightLine, dec!(7), Decimal::ONE),
            rule(RecoveryMethod::DecliningBalance, dec!(7), dec!(2)),
            rule(RecoveryMethod::DecliningBalance, dec!(20), dec!(1.5)),
            rule(RecoveryMethod::StraightLine, dec!(39), Decimal::ONE),
            rule(RecoveryMethod::Economic, dec!(0), Decimal::ONE),
        ];
        for case in cases {
            let stat = case.present_value(r, dec!(0.02), dec!(0.12)).unwrap();
            let sched = case.schedule(r, dec!(0.02), dec!(0.12), Decimal::ZERO, 50).unwrap();
            let total: Decimal = sched.iter().sum();
            assert!(
                (total - stat).abs() < TOL,
                "{}: static {stat} vs schedule {total}",
                case.method
            );
        }
    }

    #[test]
    fn test_schedule_expensing_share_in_first_period() {
        let sl = rule(RecoveryMethod::StraightLine, dec!(5), Decimal::ONE);
        let plain = sl.schedule(dec!(0.07), dec!(0.02), dec!(0.1), Decimal::ZERO, 50).unwrap();
        let bonus = sl.schedule(dec!(0.07), dec!(0.02), dec!(0.1), dec!(0.4), 50).unwrap();
        assert!((bonus[0] - (dec!(0.4) + dec!(0.6) * plain[0])).abs() < dec!(0.0000000001));
        assert!((bonus[3] - dec!(0.6) * plain[3]).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_db_period_below_switch_is_pure_exponential() {
        // 200% DB with L = 10: t1 = 5
        let (r, life, n) = (dec!(0.06), dec!(10), dec!(2));
        let pv = pv_dbsl_period(r, life, n, dec!(1.5), Some(dec!(2.5))).unwrap();
        let g = r + n / life;
        let expected =
            n / life / g * (decay(g, dec!(1.5)).unwrap() - decay(g, dec!(2.5)).unwrap());
        assert!((pv - expected).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_db_period_straddling_switch_splits() {
        // 150% DB with L = 9: t1 = 3, period [2.5, 3.5] straddles it
        let (r, life, n) = (dec!(0.06), dec!(9), dec!(1.5));
        let whole = pv_dbsl_period(r, life, n, dec!(2.5), Some(dec!(3.5))).unwrap();
        let before = pv_dbsl_period(r, life, n, dec!(2.5), Some(dec!(3))).unwrap();
        let after = pv_dbsl_period(r, life, n, dec!(3), Some(dec!(3.5))).unwrap();
        assert!((whole - (before + after)).abs() < dec!(0.0000000001));

        let g = r + n / life;
        let db_piece = n / life / g * (decay(g, dec!(2.5)).unwrap() - decay(g, dec!(3)).unwrap());
        let residual = exp_decimal(Decimal::ONE - n).unwrap();
        let sl_piece =
            n / life / r * residual * (decay(r, dec!(3)).unwrap() - decay(r, dec!(3.5)).unwrap());
        assert!((before - db_piece).abs() < dec!(0.0000000001));
        assert!((after - sl_piece).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_dbsl_period_after_life_is_zero() {
        let pv =
            pv_dbsl_period(dec!(0.05), dec!(5), dec!(2), dec!(5.5), Some(dec!(6.5))).unwrap();
        assert_eq!(pv, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_straight_line_prorates() {
        // Undiscounted straight line over 10 years: each full year is 1/10
        let pv = pv_dbsl_period(Decimal::ZERO, dec!(10), Decimal::ONE, dec!(0.5), Some(dec!(1.5)))
            .unwrap();
        assert_eq!(pv, dec!(0.1));
        let total: Decimal = (0..50)
            .map(|j| {
                let (a, b) = period_bounds(j, 50);
                pv_dbsl_period(Decimal::ZERO, dec!(10), Decimal::ONE, a, b).unwrap()
            })
            .sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_zero_net_rate_economic_prorates() {
        let (r, pi, delta) = (dec!(0.02), dec!(0.05), dec!(0.03));
        let pv = pv_economic_period(r, pi, delta, dec!(0.5), Some(dec!(1.5))).unwrap();
        assert_eq!(pv, dec!(0.03));
        assert!(pv_economic_period(r, pi, delta, dec!(48.5), None).is_err());
    }

    #[test]
    fn test_economic_schedule_matches_discount_weights() {
        // D_j = delta / k * w_j with k = r - pi + delta
        let econ = rule(RecoveryMethod::Economic, Decimal::ZERO, Decimal::ONE);
        let sched = econ.schedule(dec!(0.07), dec!(0.02), dec!(0.1), Decimal::ZERO, 50).unwrap();
        let weights = crate::recovery::mid_year_weights(dec!(0.15), 50).unwrap();
        for j in [0usize, 1, 25, 49] {
            let expected = dec!(0.1) / dec!(0.15) * weights[j];
            assert!((sched[j] - expected).abs() < dec!(0.0000000001), "period {j}");
        }
    }
}
