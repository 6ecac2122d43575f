//! Error types for quotevault-core

use thiserror::Error;

/// Result type alias using quotevault-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// `PostgreSQL` error code for a unique-constraint violation.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Errors that can occur in quotevault-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success response
    #[error("Backend error: {message} ({status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A record from the backend failed boundary validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Neither a unique pick nor a fallback quote was available
    #[error("No quotes available")]
    NoQuotesAvailable,

    /// A user-scoped operation was attempted without a session
    #[error("Not signed in")]
    NotSignedIn,

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Whether this error is a unique-constraint violation reported by the backend.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => {
                code.as_deref() == Some(UNIQUE_VIOLATION_CODE)
                    || (code.is_none() && *status == 409)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_matches_postgres_code() {
        let error = Error::Api {
            status: 409,
            code: Some(UNIQUE_VIOLATION_CODE.to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert!(error.is_unique_violation());
    }

    #[test]
    fn conflict_with_other_code_is_not_unique_violation() {
        let error = Error::Api {
            status: 409,
            code: Some("23503".to_string()),
            message: "foreign key violation".to_string(),
        };
        assert!(!error.is_unique_violation());
        assert!(!Error::NoQuotesAvailable.is_unique_violation());
    }
}
