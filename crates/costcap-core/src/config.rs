//! Model configuration: which asset and industry codes make up the result
//! grid, and in what order.

use serde::{Deserialize, Serialize};

use crate::error::CostCapError;
use crate::CostCapResult;

/// Industry codes (BEA-based, Federal Reserve banks excluded).
pub const INDUSTRY_CODES: [&str; 62] = [
    "110C", "113F", "2110", "2120", "2130", "2200", "2300", "3210", "3270", "3310", "3320", "3330",
    "3340", "3350", "336M", "336O", "3370", "338A", "311A", "313T", "315A", "3220", "3230", "3240",
    "3250", "3260", "4200", "44RT", "4810", "4820", "4830", "4840", "4850", "4860", "487S", "4930",
    "5110", "5120", "5130", "5140", "5250", "5220", "5230", "5240", "5310", "5320", "5411", "5415",
    "5412", "5500", "5610", "5620", "6100", "6210", "622H", "6230", "6240", "711A", "7130", "7210",
    "7220", "8100",
];

/// Asset type codes: equipment (E*), structures (S*), intellectual property
/// (EN*, RD*, AE*) and residential (RES).
pub const ASSET_CODES: [&str; 92] = [
    "EP1A", "EP1B", "EP1C", "EP1D", "EP1E", "EP1F", "EP1G", "EP1H", "EP20", "EP34", "EP35", "EP36",
    "EP31", "EP12", "EI11", "EI12", "EI21", "EI22", "EI30", "EI40", "EI50", "EI60", "ET11", "ET12",
    "ET20", "ET30", "ET40", "ET50", "EO12", "EO30", "EO21", "EO40", "EO22", "EO50", "EO60", "EO72",
    "EO80", "SOO1", "SB31", "SB32", "SOO2", "SC03", "SC04", "SC01", "SOMO", "SC02", "SI00", "SU30",
    "SU60", "SU40", "SU50", "SU20", "SM01", "SM02", "SB20", "SB41", "SB42", "SB43", "SB45", "SU11",
    "SU12", "SB44", "SB46", "SN00", "SO01", "SO02", "SO03", "SO04", "ENS1", "ENS2", "ENS3", "RD11",
    "RD12", "RD23", "RD21", "RD22", "RD24", "RD25", "RD31", "RD32", "RDOM", "RD70", "RD40", "RD50",
    "RD60", "RD80", "AE10", "AE20", "AE30", "AE40", "AE50", "RES",
];

/// Rows (assets) and columns (industries) of every result matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub asset_codes: Vec<String>,
    pub industry_codes: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            asset_codes: ASSET_CODES.iter().map(|c| c.to_string()).collect(),
            industry_codes: INDUSTRY_CODES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ModelConfig {
    pub fn new(asset_codes: Vec<String>, industry_codes: Vec<String>) -> CostCapResult<Self> {
        let config = Self {
            asset_codes,
            industry_codes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CostCapResult<()> {
        check_codes("asset_codes", &self.asset_codes)?;
        check_codes("industry_codes", &self.industry_codes)
    }

    /// (rows, columns) of a result matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.asset_codes.len(), self.industry_codes.len())
    }
}

fn check_codes(field: &str, codes: &[String]) -> CostCapResult<()> {
    if codes.is_empty() {
        return Err(CostCapError::invalid(field, "code list is empty"));
    }
    let mut seen = std::collections::BTreeSet::new();
    for code in codes {
        if !seen.insert(code.as_str()) {
            return Err(CostCapError::invalid(field, format!("duplicate code {code}")));
        }
    }
    Ok(())
}
