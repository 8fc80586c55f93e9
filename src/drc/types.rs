//! Rule check message and error types

use serde::Serialize;

use crate::geometry::Path;
use crate::sexpr::SExpr;

/// Message severity, ordered for presentation (errors first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Hint,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Hint => "HINT",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// One emitted violation. Messages are immutable values; cloning is cheap
/// enough that engine, approval filter and caller each hold their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCheckMessage {
    pub severity: Severity,
    pub message: String,
    pub description: String,
    #[serde(serialize_with = "serialize_approval")]
    pub approval_key: SExpr,
    pub locations: Vec<Path>,
}

fn serialize_approval<S: serde::Serializer>(key: &SExpr, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&key.canonical_text())
}

impl RuleCheckMessage {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        description: impl Into<String>,
        approval_key: SExpr,
        locations: Vec<Path>,
    ) -> Self {
        RuleCheckMessage {
            severity,
            message: message.into(),
            description: description.into(),
            approval_key,
            locations,
        }
    }
}

/// Flat error variant for the whole checker; no error is used for control
/// flow inside a check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrcError {
    /// broken precondition; indicates a bug in the caller or the checker
    #[error("logic error: {0}")]
    Logic(String),
    /// recoverable at the engine boundary, terminates the run
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("arithmetic overflow in geometry computation")]
    Overflow,
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Hint);
    }

    #[test]
    fn test_error_display() {
        let e = DrcError::Runtime("polygon offset failed".into());
        assert_eq!(e.to_string(), "runtime error: polygon offset failed");
        assert_eq!(
            DrcError::Overflow.to_string(),
            "arithmetic overflow in geometry computation"
        );
    }
}
