use thiserror::Error;

pub type HqResult<T> = Result<T, HqError>;

#[derive(Error, Debug)]
pub enum HqError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid identifier '{value}': {reason}")]
    InvalidId { value: String, reason: String },

    #[error("Unknown {what}: {value}")]
    UnknownVariant { what: &'static str, value: String },
}
