//! Failure values carried on the error track, and dispatch defects.

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// A request-level failure, passed forward with [`Next::Fail`].
///
/// [`Next::Fail`]: crate::pipeline::Next::Fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// A lookup by identifier found nothing.
    #[error("{0}")]
    NotFound(String),

    /// The request shape did not meet a guard's precondition.
    #[error("{0}")]
    Validation(String),

    /// The persistence layer failed for a reason other than absence.
    #[error("{message}")]
    Collaborator { message: String, cause: String },
}

impl Failure {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn collaborator(message: impl Into<String>, cause: impl ToString) -> Self {
        Self::Collaborator {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Collaborator { .. } => "collaborator",
        }
    }

    /// JSON body describing this failure. The collaborator cause stays in logs.
    pub fn to_body(&self) -> Value {
        json!({
            "message": self.to_string(),
            "kind": self.kind(),
        })
    }
}

/// A programming error in the handler chain. Never a request-level condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchViolation {
    #[error("response already written ({first}); second write ({attempted}) rejected")]
    DoubleWrite {
        first: StatusCode,
        attempted: StatusCode,
    },

    #[error("handler chain for {method} {path} ended without writing a response")]
    ChainExhausted { method: String, path: String },
}

impl DispatchViolation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DoubleWrite { .. } => "double_write",
            Self::ChainExhausted { .. } => "chain_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_body() {
        let failure = Failure::validation("body required");
        assert_eq!(
            failure.to_body(),
            json!({ "message": "body required", "kind": "validation" })
        );
    }

    #[test]
    fn test_collaborator_cause_not_exposed() {
        let failure = Failure::collaborator("error retrieving the hub", "disk on fire");
        let body = failure.to_body();
        assert_eq!(body["message"], "error retrieving the hub");
        assert!(!body.to_string().contains("disk on fire"));
    }
}
