//! Capital cost recovery rules: named sheets mapping asset codes to their
//! depreciation method, tax life, bonus share and credits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CostCapError;
use crate::params::policy::PolicyTable;
use crate::recovery::depreciation::RecoveryMethod;
use crate::recovery::shield::RecoveryTerms;
use crate::types::{Rate, Years};
use crate::CostCapResult;

/// Recovery rule for one asset type. Aliases follow the published sheet headers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRule {
    pub method: RecoveryMethod,
    pub life: Years,
    #[serde(alias = "acclrt")]
    pub decline_rate: Decimal,
    pub bonus: Rate,
    #[serde(alias = "itcrt")]
    pub itc_rate: Rate,
    #[serde(alias = "itc_base")]
    pub itc_basis_reduction: Rate,
    pub itc_life: Years,
}

impl RecoveryRule {
    /// Full recovery terms once the asset's section 179 share is known.
    pub fn terms(&self, section_179: Rate) -> RecoveryTerms {
        RecoveryTerms {
            method: self.method,
            life: self.life,
            decline_rate: self.decline_rate,
            bonus: self.bonus,
            section_179,
            itc_rate: self.itc_rate,
            itc_basis_reduction: self.itc_basis_reduction,
            itc_life: self.itc_life,
        }
    }
}

/// One sheet: asset code to rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeMap<String, RecoveryRule>,
}

impl RuleSet {
    pub fn new(rules: BTreeMap<String, RecoveryRule>) -> Self {
        Self { rules }
    }

    pub fn get(&self, asset: &str) -> CostCapResult<&RecoveryRule> {
        self.rules
            .get(asset)
            .ok_or_else(|| {
                CostCapError::InsufficientData(format!("no recovery rule for asset {asset}"))
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every listed asset must have a rule.
    pub fn covers<'a>(&self, assets: impl IntoIterator<Item = &'a String>) -> CostCapResult<()> {
        for code in assets {
            self.get(code)?;
        }
        Ok(())
    }
}

/// Named sheets plus the sheet used for investment abroad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRules {
    pub sheets: BTreeMap<String, RuleSet>,
    pub foreign_sheet: String,
}

impl RecoveryRules {
    pub fn new(
        sheets: BTreeMap<String, RuleSet>,
        foreign_sheet: impl Into<String>,
    ) -> CostCapResult<Self> {
        let rules = Self {
            sheets,
            foreign_sheet: foreign_sheet.into(),
        };
        rules.sheet(&rules.foreign_sheet)?;
        Ok(rules)
    }

    pub fn sheet(&self, name: &str) -> CostCapResult<&RuleSet> {
        self.sheets
            .get(name)
            .ok_or_else(|| {
                CostCapError::InsufficientData(format!("recovery-rule sheet '{name}' not found"))
            })
    }

    /// Rules in force in `year`, via the policy row's sheet name (clamped past
    /// the policy horizon).
    pub fn for_year(&self, policy: &PolicyTable, year: i32) -> CostCapResult<&RuleSet> {
        self.sheet(&policy.row(year)?.recovery_sheet)
    }

    pub fn foreign(&self) -> CostCapResult<&RuleSet> {
        self.sheet(&self.foreign_sheet)
    }

    /// Every sheet a policy year names exists, as does the foreign sheet.
    pub fn validate_against(&self, policy: &PolicyTable) -> CostCapResult<()> {
        self.foreign()?;
        for row in policy.years() {
            self.sheet(&row.recovery_sheet)?;
        }
        Ok(())
    }
}
