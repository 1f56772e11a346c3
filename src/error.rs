use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured failure reported by the engine in a status payload's `error` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_info: Option<serde_json::Value>,
}

/// Errors returned by the client.
///
/// Every variant is a database error in the broad sense, see
/// [`Error::is_database_error`]. Catch sites that care about the cause
/// branch on the variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The caller used the API out of order or passed malformed parameters.
    #[error("programming error: {0}")]
    Programming(String),

    /// Transport failure, unexpected HTTP status or a malformed response.
    #[error("operational error: {0}")]
    Operational(String),

    /// The engine accepted the statement and then reported it failed.
    #[error("database error: {}", .0.message)]
    Database(Box<EngineError>),
}

impl Error {
    pub(crate) fn programming(msg: impl Into<String>) -> Self {
        Error::Programming(msg.into())
    }

    pub(crate) fn operational(msg: impl Into<String>) -> Self {
        Error::Operational(msg.into())
    }

    pub fn is_programming_error(&self) -> bool {
        matches!(self, Error::Programming(_))
    }

    pub fn is_operational_error(&self) -> bool {
        matches!(self, Error::Operational(_))
    }

    /// True for every variant; programming and operational errors are
    /// specializations of database errors.
    pub fn is_database_error(&self) -> bool {
        true
    }

    /// The engine's payload when the engine itself reported the failure.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Error::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::Database(Box::new(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Operational(format!("HTTP client error: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Operational(format!("JSON parse error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
