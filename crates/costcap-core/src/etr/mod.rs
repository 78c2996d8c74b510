//! Effective tax rates derived from the cost of capital: marginal (METR),
//! marginal total including investor-level taxes (METTR) and average (EATR).

pub mod average;
pub mod marginal;
pub mod rates;
pub mod saver;
