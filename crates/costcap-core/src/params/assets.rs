//! Asset types: economic depreciation, section 179 use and tangibility.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CostCapError;
use crate::types::{LegalForm, Rate};
use crate::CostCapResult;

/// Code prefixes of intellectual-property assets: entertainment originals,
/// R&D and software.
pub const INTANGIBLE_PREFIXES: [&str; 3] = ["EN", "RD", "AE"];

/// Whether an asset code denotes a tangible asset.
pub fn is_tangible(code: &str) -> bool {
    !INTANGIBLE_PREFIXES.iter().any(|p| code.starts_with(p))
}

/// Property tax added to the cost of capital of an asset in one period:
/// the statutory rate net of the federal deduction for state and local taxes.
/// Intangibles and scenarios without state and local taxes pay none.
pub fn property_tax_addon(
    code: &str,
    property_tax_rate: Rate,
    state_local_subsidy: Rate,
    include_state_local: bool,
) -> Rate {
    if include_state_local && is_tangible(code) {
        property_tax_rate * (Decimal::ONE - state_local_subsidy)
    } else {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetType {
    #[serde(alias = "asset")]
    pub code: String,
    /// Economic depreciation rate (delta)
    #[serde(alias = "delta")]
    pub economic_depreciation: Rate,
    /// Effective section 179 expensing share for C corporations
    #[serde(alias = "s179_corp")]
    pub section_179_corp: Rate,
    /// Effective section 179 expensing share for pass-throughs
    #[serde(alias = "s179_noncorp")]
    pub section_179_noncorp: Rate,
}

impl AssetType {
    pub fn is_tangible(&self) -> bool {
        is_tangible(&self.code)
    }

    pub fn section_179(&self, form: LegalForm) -> Rate {
        if form.is_corporate() {
            self.section_179_corp
        } else {
            self.section_179_noncorp
        }
    }

    pub fn validate(&self) -> CostCapResult<()> {
        if self.economic_depreciation < Decimal::ZERO {
            return Err(CostCapError::invalid(
                format!("economic_depreciation ({})", self.code),
                "depreciation rate cannot be negative",
            ));
        }
        for (field, value) in [
            ("section_179_corp", self.section_179_corp),
            ("section_179_noncorp", self.section_179_noncorp),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(CostCapError::invalid(
                    format!("{field} ({})", self.code),
                    format!("must be between 0 and 1, got {value}"),
                ));
            }
        }
        Ok(())
    }
}
