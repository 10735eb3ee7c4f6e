use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("{field} must be a finite number >= 0")]
    NegativeAmount { field: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("interestRate must be > -100")]
    RateTooLow,

    #[error("projectionYears must be <= {max}")]
    HorizonTooLong { max: u32 },

    #[error("timeHorizonYears must be <= {max}")]
    GoalHorizonTooLong { max: u32 },

    #[error("invalid decimal '{value}' for {field}")]
    InvalidDecimal { field: String, value: String },

    #[error("invalid date '{value}' for {field}; expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },

    #[error("{field}: endDate {end} is before startDate {start}")]
    EndBeforeStart {
        field: String,
        start: String,
        end: String,
    },

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("failed to encode report: {0}")]
    Encode(String),

    #[error("failed to read events file {path}: {reason}")]
    EventsFile { path: String, reason: String },
}

impl RequestError {
    pub(crate) fn negative(field: impl Into<String>) -> Self {
        RequestError::NegativeAmount {
            field: field.into(),
        }
    }

    pub(crate) fn not_finite(field: impl Into<String>) -> Self {
        RequestError::NotFinite {
            field: field.into(),
        }
    }
}
