//! Error types for the data repository.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cause carried by a not-found problem.
pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
pub const SUBSCRIPTION_NOT_FOUND: &str = "SUBSCRIPTION_NOT_FOUND";
pub const DATA_NOT_FOUND: &str = "DATA_NOT_FOUND";
pub const AMF_SUBSCRIPTION_NOT_FOUND: &str = "AMFSUBSCRIPTION_NOT_FOUND";

/// Main error type for repository operations.
///
/// The first four variants are the request-facing taxonomy. The remaining
/// variants are ambient failures and all surface as `Unspecified` problems.
#[derive(Debug, Error)]
pub enum DataRepoError {
    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Modify not allowed: {0}")]
    ModifyNotAllowed(String),

    #[error("Malformed request syntax: {0}")]
    MalformedRequestSyntax(String),

    #[error("Unspecified: {0}")]
    Unspecified(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures reported by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No document in {collection} matches the filter")]
    NoMatch { collection: String },

    #[error("Patch rejected: {0}")]
    PatchRejected(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl DataRepoError {
    /// Transport-equivalent status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            DataRepoError::NotFound(_) => 404,
            DataRepoError::ModifyNotAllowed(_) => 403,
            DataRepoError::MalformedRequestSyntax(_) => 400,
            _ => 403,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataRepoError::NotFound(_))
    }

    /// Render the structured problem body for this error.
    pub fn problem_details(&self) -> ProblemDetails {
        let status = self.status();
        match self {
            DataRepoError::NotFound(cause) => ProblemDetails {
                title: not_found_title(cause).to_string(),
                status,
                detail: None,
                cause: Some(cause.to_string()),
            },
            DataRepoError::ModifyNotAllowed(detail) => ProblemDetails {
                title: "Modify not allowed".to_string(),
                status,
                detail: non_empty(detail),
                cause: Some("MODIFY_NOT_ALLOWED".to_string()),
            },
            DataRepoError::MalformedRequestSyntax(detail) => ProblemDetails {
                title: "Malformed request syntax".to_string(),
                status,
                detail: non_empty(detail),
                cause: None,
            },
            DataRepoError::Unspecified(detail) => ProblemDetails {
                title: "Unspecified".to_string(),
                status,
                detail: non_empty(detail),
                cause: Some("UNSPECIFIED".to_string()),
            },
            other => ProblemDetails {
                title: "Unspecified".to_string(),
                status,
                detail: Some(other.to_string()),
                cause: Some("UNSPECIFIED".to_string()),
            },
        }
    }
}

fn not_found_title(cause: &str) -> &'static str {
    match cause {
        USER_NOT_FOUND => "User not found",
        SUBSCRIPTION_NOT_FOUND => "Subscription not found",
        AMF_SUBSCRIPTION_NOT_FOUND => "AMF subscription not found",
        _ => "Data not found",
    }
}

fn non_empty(detail: &str) -> Option<String> {
    if detail.is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}

/// Structured error payload. `status` always equals the transport status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl From<serde_json::Error> for DataRepoError {
    fn from(e: serde_json::Error) -> Self {
        DataRepoError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for DataRepoError {
    fn from(e: toml::de::Error) -> Self {
        DataRepoError::Config(e.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, DataRepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_status_matches_error_status() {
        let errors = vec![
            DataRepoError::NotFound(USER_NOT_FOUND),
            DataRepoError::ModifyNotAllowed(String::new()),
            DataRepoError::MalformedRequestSyntax("No query parameters".to_string()),
            DataRepoError::Unspecified(String::new()),
            DataRepoError::Config("bad".to_string()),
        ];

        for err in errors {
            assert_eq!(err.problem_details().status, err.status());
        }
    }

    #[test]
    fn test_not_found_problem_carries_cause() {
        let problem = DataRepoError::NotFound(SUBSCRIPTION_NOT_FOUND).problem_details();
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Subscription not found");
        assert_eq!(problem.cause.as_deref(), Some("SUBSCRIPTION_NOT_FOUND"));
    }

    #[test]
    fn test_store_errors_are_unspecified() {
        let err: DataRepoError = StoreError::Backend("connection reset".to_string()).into();
        let problem = err.problem_details();
        assert_eq!(problem.cause.as_deref(), Some("UNSPECIFIED"));
        assert!(problem.detail.unwrap().contains("connection reset"));
    }
}
