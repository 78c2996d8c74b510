use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostCapError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Year {year} out of range: {reason}")]
    TemporalRange { year: i32, reason: String },

    #[error("Results not available: {0}")]
    NotEvaluated(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CostCapError {
    fn from(e: serde_json::Error) -> Self {
        CostCapError::SerializationError(e.to_string())
    }
}

impl CostCapError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CostCapError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
