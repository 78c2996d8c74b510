//! Year-indexed statutory parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CostCapError;
use crate::etr::average::InternationalTerms;
use crate::etr::saver::InvestorTaxRates;
use crate::types::{LegalForm, Rate, FIRST_POLICY_YEAR};
use crate::CostCapResult;

/// Statutory parameters for one year. Field aliases accept the column names
/// of the published policy tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyYear {
    pub year: i32,
    #[serde(alias = "taxrt_ccorp")]
    pub tax_rate_ccorp: Rate,
    #[serde(alias = "taxrt_scorp")]
    pub tax_rate_scorp: Rate,
    #[serde(alias = "taxrt_soleprop")]
    pub tax_rate_soleprop: Rate,
    #[serde(alias = "taxrt_partner")]
    pub tax_rate_partner: Rate,
    /// Deductible share of corporate interest
    #[serde(alias = "intded_c")]
    pub interest_deductible_corp: Rate,
    /// Deductible share of non-corporate interest
    #[serde(alias = "intded_nc")]
    pub interest_deductible_noncorp: Rate,
    #[serde(alias = "taxrt_int")]
    pub tax_rate_interest: Rate,
    #[serde(alias = "taxrt_div")]
    pub tax_rate_dividends: Rate,
    #[serde(alias = "taxrt_scg")]
    pub tax_rate_short_gains: Rate,
    #[serde(alias = "taxrt_lcg")]
    pub tax_rate_long_gains: Rate,
    #[serde(alias = "exFDII")]
    pub fdii_exclusion: Rate,
    #[serde(alias = "exGILTI")]
    pub gilti_exclusion: Rate,
    #[serde(alias = "stepup")]
    pub step_up_basis: bool,
    /// Federal subsidy to state and local taxes (SALT deduction value)
    #[serde(alias = "sub_slti")]
    pub state_local_subsidy: Rate,
    /// Name of the recovery-rule sheet in force
    #[serde(alias = "ccr_sheet")]
    pub recovery_sheet: String,
}

impl PolicyYear {
    pub fn tax_rate(&self, form: LegalForm) -> Rate {
        match form {
            LegalForm::CCorp => self.tax_rate_ccorp,
            LegalForm::SCorp => self.tax_rate_scorp,
            LegalForm::SoleProprietorship => self.tax_rate_soleprop,
            LegalForm::Partnership => self.tax_rate_partner,
        }
    }

    pub fn interest_deductible(&self, form: LegalForm) -> Rate {
        if form.is_corporate() {
            self.interest_deductible_corp
        } else {
            self.interest_deductible_noncorp
        }
    }

    pub fn investor_rates(&self) -> InvestorTaxRates {
        InvestorTaxRates {
            interest: self.tax_rate_interest,
            dividends: self.tax_rate_dividends,
            short_gains: self.tax_rate_short_gains,
            long_gains: self.tax_rate_long_gains,
            step_up_basis: self.step_up_basis,
        }
    }

    pub fn international(&self, foreign_tax_rate: Rate) -> InternationalTerms {
        InternationalTerms {
            fdii_exclusion: self.fdii_exclusion,
            gilti_exclusion: self.gilti_exclusion,
            foreign_tax_rate,
        }
    }

    fn validate(&self) -> CostCapResult<()> {
        let rates = [
            ("tax_rate_ccorp", self.tax_rate_ccorp),
            ("tax_rate_scorp", self.tax_rate_scorp),
            ("tax_rate_soleprop", self.tax_rate_soleprop),
            ("tax_rate_partner", self.tax_rate_partner),
            ("interest_deductible_corp", self.interest_deductible_corp),
            ("interest_deductible_noncorp", self.interest_deductible_noncorp),
            ("tax_rate_interest", self.tax_rate_interest),
            ("tax_rate_dividends", self.tax_rate_dividends),
            ("tax_rate_short_gains", self.tax_rate_short_gains),
            ("tax_rate_long_gains", self.tax_rate_long_gains),
            ("fdii_exclusion", self.fdii_exclusion),
            ("gilti_exclusion", self.gilti_exclusion),
            ("state_local_subsidy", self.state_local_subsidy),
        ];
        for (field, value) in rates {
            if value < Rate::ZERO || value > Rate::ONE {
                return Err(CostCapError::invalid(
                    format!("{field} ({})", self.year),
                    format!("must be between 0 and 1, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// A policy parameter that varies over a forward-looking path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyField {
    TaxRate(LegalForm),
    InterestDeductible(LegalForm),
    StateLocalSubsidy,
}

impl PolicyField {
    fn read(self, row: &PolicyYear) -> Rate {
        match self {
            PolicyField::TaxRate(form) => row.tax_rate(form),
            PolicyField::InterestDeductible(form) => row.interest_deductible(form),
            PolicyField::StateLocalSubsidy => row.state_local_subsidy,
        }
    }
}

/// Policy rows keyed by year, starting in 2020 with no gaps. Years after the
/// last row repeat it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PolicyYear>", into = "Vec<PolicyYear>")]
pub struct PolicyTable {
    rows: BTreeMap<i32, PolicyYear>,
}

impl PolicyTable {
    pub fn new(rows: Vec<PolicyYear>) -> CostCapResult<Self> {
        let mut map = BTreeMap::new();
        for row in rows {
            row.validate()?;
            let year = row.year;
            if map.insert(year, row).is_some() {
                return Err(CostCapError::invalid("year", format!("duplicate policy year {year}")));
            }
        }
        let first = match map.keys().next() {
            Some(&y) => y,
            None => return Err(CostCapError::InsufficientData("policy table is empty".into())),
        };
        if first != FIRST_POLICY_YEAR {
            return Err(CostCapError::TemporalRange {
                year: first,
                reason: format!("policy table must start in {FIRST_POLICY_YEAR}"),
            });
        }
        for (expected, year) in (first..).zip(map.keys()) {
            if *year != expected {
                return Err(CostCapError::InsufficientData(format!(
                    "policy table has no row for {expected}"
                )));
            }
        }
        Ok(Self { rows: map })
    }

    /// Last year with its own row.
    pub fn horizon(&self) -> i32 {
        self.rows.keys().next_back().copied().unwrap_or(FIRST_POLICY_YEAR)
    }

    /// Row in force in `year`; years past the horizon use the last row.
    pub fn row(&self, year: i32) -> CostCapResult<&PolicyYear> {
        if year < FIRST_POLICY_YEAR {
            return Err(CostCapError::TemporalRange {
                year,
                reason: format!("policy parameters start in {FIRST_POLICY_YEAR}"),
            });
        }
        let key = year.min(self.horizon());
        self.rows
            .get(&key)
            .ok_or_else(|| CostCapError::InsufficientData(format!("no policy row for {key}")))
    }

    /// `len` consecutive values of `field` starting in `start`.
    pub fn path(&self, field: PolicyField, start: i32, len: usize) -> CostCapResult<Vec<Rate>> {
        if len == 0 {
            return Err(CostCapError::invalid("len", "a policy path needs at least one period"));
        }
        (0..len)
            .map(|offset| {
                let year = start.saturating_add(offset as i32);
                Ok(field.read(self.row(year)?))
            })
            .collect()
    }

    pub fn years(&self) -> impl Iterator<Item = &PolicyYear> {
        self.rows.values()
    }
}

impl TryFrom<Vec<PolicyYear>> for PolicyTable {
    type Error = CostCapError;

    fn try_from(rows: Vec<PolicyYear>) -> Result<Self, Self::Error> {
        PolicyTable::new(rows)
    }
}

impl From<PolicyTable> for Vec<PolicyYear> {
    fn from(table: PolicyTable) -> Self {
        table.rows.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub(crate) fn row(year: i32, corp: Rate) -> PolicyYear {
        PolicyYear {
            year,
            tax_rate_ccorp: corp,
            tax_rate_scorp: dec!(0.3),
            tax_rate_soleprop: dec!(0.29),
            tax_rate_partner: dec!(0.31),
            interest_deductible_corp: Decimal::ONE,
            interest_deductible_noncorp: Decimal::ONE,
            tax_rate_interest: dec!(0.25),
            tax_rate_dividends: dec!(0.2),
            tax_rate_short_gains: dec!(0.35),
            tax_rate_long_gains: dec!(0.2),
            fdii_exclusion: dec!(0.375),
            gilti_exclusion: dec!(0.5),
            step_up_basis: true,
            state_local_subsidy: dec!(0.1),
            recovery_sheet: "tcja".into(),
        }
    }

    fn table() -> PolicyTable {
        let rows = (2020..=2029)
            .map(|y| row(y, if y < 2026 { dec!(0.21) } else { dec!(0.28) }))
            .collect();
        PolicyTable::new(rows).unwrap()
    }

    #[test]
    fn test_row_lookup_and_clamp() {
        let t = table();
        assert_eq!(t.horizon(), 2029);
        assert_eq!(t.row(2023).unwrap().tax_rate_ccorp, dec!(0.21));
        assert_eq!(t.row(2035).unwrap(), t.row(2029).unwrap());
    }

    #[test]
    fn test_year_before_table() {
        match table().row(2019) {
            Err(CostCapError::TemporalRange { year, .. }) => assert_eq!(year, 2019),
            other => panic!("Expected TemporalRange, got {other:?}"),
        }
    }

    #[test]
    fn test_path_repeats_last_year() {
        let path = table().path(PolicyField::TaxRate(LegalForm::CCorp), 2024, 50).unwrap();
        assert_eq!(path.len(), 50);
        assert_eq!(&path[..2], &[dec!(0.21), dec!(0.21)]);
        assert!(path[2..].iter().all(|t| *t == dec!(0.28)));
    }

    #[test]
    fn test_gaps_and_duplicates_rejected() {
        assert!(PolicyTable::new(vec![row(2020, dec!(0.21)), row(2022, dec!(0.21))]).is_err());
        assert!(PolicyTable::new(vec![row(2020, dec!(0.21)), row(2020, dec!(0.21))]).is_err());
        assert!(PolicyTable::new(vec![row(2021, dec!(0.21))]).is_err());
        assert!(PolicyTable::new(Vec::new()).is_err());
    }

    const ORIGINAL_ROW: &str = r#"{
        "year": 2020, "taxrt_ccorp": "0.21", "taxrt_scorp": "0.3",
        "taxrt_soleprop": "0.29", "taxrt_partner": "0.31",
        "intded_c": "1", "intded_nc": "1", "taxrt_int": "0.25",
        "taxrt_div": "0.2", "taxrt_scg": "0.35", "taxrt_lcg": "0.2",
        "exFDII": "0.375", "exGILTI": "0.5", "stepup": true,
        "sub_slti": "0.1", "ccr_sheet": "tcja"
    }"#;

    #[test]
    fn test_original_column_names_accepted() {
        let t: PolicyTable = serde_json::from_str(&format!("[{ORIGINAL_ROW}]")).unwrap();
        let r = t.row(2020).unwrap();
        assert_eq!(r.recovery_sheet, "tcja");
        assert!(r.step_up_basis);
        assert_eq!(r.fdii_exclusion, dec!(0.375));
        assert_eq!(r.gilti_exclusion, dec!(0.5));
        assert_eq!(r.interest_deductible(LegalForm::Partnership), Decimal::ONE);
    }

    #[test]
    fn test_missing_column_rejected() {
        let row = ORIGINAL_ROW.replace(r#""exFDII": "0.375", "#, "");
        let err = serde_json::from_str::<PolicyYear>(&row).unwrap_err();
        assert!(err.to_string().contains("fdii_exclusion"), "{err}");

        let row = ORIGINAL_ROW.replace(r#""stepup": true,"#, "");
        assert!(serde_json::from_str::<PolicyYear>(&row).is_err());
    }
}
