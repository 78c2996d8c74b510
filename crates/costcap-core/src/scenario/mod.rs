//! Scenario evaluation over the full asset-by-industry grid for every legal
//! form, with results kept per year.

pub mod calculator;
pub mod results;
