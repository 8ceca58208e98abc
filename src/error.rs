//! Error types for the expr-match crate.

use crate::ir::Operator;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExprError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The engine cannot index predicates using this operator.
    #[error("StringHash engines only support string equality/inequality, got {0}")]
    UnsupportedOperator(Operator),
    /// No stored part matched the part passed to `remove`.
    #[error("Expression part not found")]
    PartNotFound,
    #[error("Invalid field path {path:?}: {reason}")]
    PathParse { path: String, reason: String },
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Task pool error: {0}")]
    TaskPool(String),
}

impl ExprError {
    pub(crate) fn path_parse(path: &str, reason: impl Into<String>) -> Self {
        ExprError::PathParse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for ExprError {
    fn from(err: serde_yaml::Error) -> Self {
        ExprError::InvalidConfig(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ExprError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ExprError::TaskPool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unsupported_operator() {
        let error = ExprError::UnsupportedOperator(Operator::Greater);
        assert_eq!(
            error.to_string(),
            "StringHash engines only support string equality/inequality, got >"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_part_not_found() {
        let error = ExprError::PartNotFound;
        assert_eq!(error.to_string(), "Expression part not found");
    }

    #[test]
    fn test_path_parse() {
        let error = ExprError::path_parse("event..data", "recursive descent is not supported");
        assert_eq!(
            error.to_string(),
            "Invalid field path \"event..data\": recursive descent is not supported"
        );
        match error {
            ExprError::PathParse { path, .. } => assert_eq!(path, "event..data"),
            _ => panic!("Expected PathParse"),
        }
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("invalid: yaml: [").unwrap_err();
        let err: ExprError = yaml_err.into();
        assert!(matches!(err, ExprError::InvalidConfig(_)));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(ExprError::PartNotFound, ExprError::PartNotFound);
        assert_ne!(
            ExprError::UnsupportedOperator(Operator::Less),
            ExprError::UnsupportedOperator(Operator::Greater)
        );
        assert_ne!(
            ExprError::InvalidConfig("x".to_string()),
            ExprError::InvalidPredicate("x".to_string())
        );
    }

    #[test]
    fn test_error_debug() {
        let debug_str = format!("{:?}", ExprError::PartNotFound);
        assert_eq!(debug_str, "PartNotFound");
    }
}
