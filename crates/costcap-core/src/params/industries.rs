use serde::{Deserialize, Serialize};

use crate::error::CostCapError;
use crate::types::{LegalForm, Rate};
use crate::CostCapResult;

/// Financing mix and foreign tax rate of one industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Industry {
    #[serde(alias = "indcode")]
    pub code: String,
    /// Debt-financed share of corporate investment
    #[serde(alias = "corp")]
    pub debt_share_corp: Rate,
    /// Debt-financed share of pass-through investment
    #[serde(alias = "noncorp")]
    pub debt_share_noncorp: Rate,
    /// Effective tax rate abroad, for foreign EATR
    #[serde(alias = "taxrt_foreign")]
    pub foreign_tax_rate: Rate,
}

impl Industry {
    pub fn debt_share(&self, form: LegalForm) -> Rate {
        if form.is_corporate() {
            self.debt_share_corp
        } else {
            self.debt_share_noncorp
        }
    }

    pub fn validate(&self) -> CostCapResult<()> {
        for (field, value) in [
            ("debt_share_corp", self.debt_share_corp),
            ("debt_share_noncorp", self.debt_share_noncorp),
        ] {
            if value < Rate::ZERO || value > Rate::ONE {
                return Err(CostCapError::invalid(
                    format!("{field} ({})", self.code),
                    format!("must be between 0 and 1, got {value}"),
                ));
            }
        }
        if self.foreign_tax_rate < Rate::ZERO || self.foreign_tax_rate >= Rate::ONE {
            return Err(CostCapError::invalid(
                format!("foreign_tax_rate ({})", self.code),
                format!("must be in [0, 1), got {}", self.foreign_tax_rate),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_debt_share_by_form() {
        let ind = Industry {
            code: "3310".into(),
            debt_share_corp: dec!(0.32),
            debt_share_noncorp: dec!(0.41),
            foreign_tax_rate: dec!(0.13),
        };
        assert_eq!(ind.debt_share(LegalForm::CCorp), dec!(0.32));
        assert_eq!(ind.debt_share(LegalForm::SCorp), dec!(0.41));
        assert!(ind.validate().is_ok());
    }

    #[test]
    fn test_foreign_rate_of_one_rejected() {
        let ind = Industry {
            code: "5110".into(),
            debt_share_corp: dec!(0.2),
            debt_share_noncorp: dec!(0.2),
            foreign_tax_rate: Rate::ONE,
        };
        assert!(ind.validate().is_err());
    }
}
