use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Number of periods in a forward-looking tax path.
pub const FORWARD_PERIODS: usize = 50;

/// First year covered by policy and recovery-rule tables.
pub const FIRST_POLICY_YEAR: i32 = 2020;

/// Legal form of organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalForm {
    CCorp,
    SCorp,
    SoleProprietorship,
    Partnership,
}

impl LegalForm {
    pub const ALL: [LegalForm; 4] = [
        LegalForm::CCorp,
        LegalForm::SCorp,
        LegalForm::SoleProprietorship,
        LegalForm::Partnership,
    ];

    /// C corporations face the entity-level tax and corporate financing terms.
    pub fn is_corporate(self) -> bool {
        matches!(self, LegalForm::CCorp)
    }

    /// Short label used in result keys and file names.
    pub fn label(self) -> &'static str {
        match self {
            LegalForm::CCorp => "ccorp",
            LegalForm::SCorp => "scorp",
            LegalForm::SoleProprietorship => "soleprop",
            LegalForm::Partnership => "partner",
        }
    }
}

impl fmt::Display for LegalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Valuation regime for future tax parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Current-year parameters persist forever.
    Static,
    /// Period-by-period projection of scheduled parameters.
    ForwardLooking,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
