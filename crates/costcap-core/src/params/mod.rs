//! Parameter, policy and recovery-rule tables the engine consumes. These are
//! plain data contracts: loaded once, validated, then read-only.

pub mod assets;
pub mod economic;
pub mod industries;
pub mod policy;
pub mod recovery_rules;
