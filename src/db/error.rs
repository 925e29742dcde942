//! Stats store error type.

use derive_more::{Display, Error};

/// Stats store error with caller location for diagnostics.
#[derive(Debug, Clone, Display, Error)]
#[display("stats store error: {} ({}:{})", message, file, line)]
pub struct DbError {
    /// What went wrong.
    pub message: String,
    /// Source file of the failing call.
    pub file: &'static str,
    /// Line of the failing call.
    pub line: u32,
}

impl DbError {
    /// Creates an error annotated with the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("query failed: {err}"))
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("connection failed: {err}"))
    }
}
