pub mod coc;
pub mod config;
pub mod error;
pub mod etr;
pub mod math;
pub mod params;
pub mod recovery;
pub mod types;

#[cfg(feature = "scenario")]
pub mod scenario;

pub use error::CostCapError;
pub use types::*;

/// Standard result type for all cost-of-capital operations
pub type CostCapResult<T> = Result<T, CostCapError>;
