use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CostCapError;
use crate::types::{LegalForm, Regime};
use crate::CostCapResult;

/// Quantity stored in a result matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[serde(rename = "coc")]
    CostOfCapital,
    #[serde(rename = "ucoc")]
    UserCostOfCapital,
    Metr,
    Mettr,
    #[serde(rename = "eatr_d")]
    EatrDomestic,
    #[serde(rename = "eatr_f")]
    EatrForeign,
}

impl Measure {
    pub const ALL: [Measure; 6] = [
        Measure::CostOfCapital,
        Measure::UserCostOfCapital,
        Measure::Metr,
        Measure::Mettr,
        Measure::EatrDomestic,
        Measure::EatrForeign,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Measure::CostOfCapital => "coc",
            Measure::UserCostOfCapital => "ucoc",
            Measure::Metr => "metr",
            Measure::Mettr => "mettr",
            Measure::EatrDomestic => "eatr_d",
            Measure::EatrForeign => "eatr_f",
        }
    }

    /// Average tax rates are only produced for C corporations.
    pub fn applies_to(self, form: LegalForm) -> bool {
        match self {
            Measure::EatrDomestic | Measure::EatrForeign => form.is_corporate(),
            _ => true,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Measure {
    type Err = CostCapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Measure::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| CostCapError::invalid("measure", format!("unknown measure '{s}'")))
    }
}

/// Asset-by-industry grid of one measure, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    values: Vec<Decimal>,
}

impl ResultMatrix {
    pub(crate) fn zeros(rows: &[String], columns: &[String]) -> Self {
        Self {
            rows: rows.to_vec(),
            columns: columns.to_vec(),
            values: vec![Decimal::ZERO; rows.len() * columns.len()],
        }
    }

    pub(crate) fn set(&mut self, row: usize, column: usize, value: Decimal) {
        let width = self.columns.len();
        self.values[row * width + column] = value;
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn value(&self, row: usize, column: usize) -> Option<Decimal> {
        if column >= self.columns.len() {
            return None;
        }
        self.values.get(row * self.columns.len() + column).copied()
    }

    /// Value for an (asset code, industry code) pair.
    pub fn get(&self, asset: &str, industry: &str) -> Option<Decimal> {
        let i = self.rows.iter().position(|r| r == asset)?;
        let j = self.columns.iter().position(|c| c == industry)?;
        self.value(i, j)
    }

    /// Values of one asset row across industries.
    pub fn row(&self, row: usize) -> Option<&[Decimal]> {
        let width = self.columns.len();
        self.values.get(row * width..(row + 1) * width)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = (&str, &[Decimal])> {
        self.rows
            .iter()
            .map(String::as_str)
            .zip(self.values.chunks(self.columns.len().max(1)))
    }
}

/// All matrices produced by evaluating one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearResults {
    pub year: i32,
    pub regime: Regime,
    matrices: BTreeMap<LegalForm, BTreeMap<Measure, ResultMatrix>>,
}

impl YearResults {
    pub(crate) fn new(year: i32, regime: Regime) -> Self {
        Self {
            year,
            regime,
            matrices: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, form: LegalForm, measure: Measure, matrix: ResultMatrix) {
        self.matrices.entry(form).or_default().insert(measure, matrix);
    }

    pub fn get(&self, form: LegalForm, measure: Measure) -> CostCapResult<&ResultMatrix> {
        if !measure.applies_to(form) {
            return Err(CostCapError::invalid(
                "measure",
                format!("{measure} is computed for C corporations only, not {form}"),
            ));
        }
        self.matrices
            .get(&form)
            .and_then(|m| m.get(&measure))
            .ok_or_else(|| {
                CostCapError::InsufficientData(format!(
                    "no {measure} matrix for {form} in {}",
                    self.year
                ))
            })
    }

    /// Every (form, measure, matrix) triple, forms then measures in order.
    pub fn iter(&self) -> impl Iterator<Item = (LegalForm, Measure, &ResultMatrix)> {
        self.matrices
            .iter()
            .flat_map(|(form, by_measure)| by_measure.iter().map(move |(m, x)| (*form, *m, x)))
    }

    pub fn matrix_count(&self) -> usize {
        self.matrices.values().map(BTreeMap::len).sum()
    }
}
