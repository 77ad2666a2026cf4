//! Evaluation error taxonomy.
//!
//! Every evaluation failure carries a kind and a level. Warning-level errors
//! (unknown value, null value, unevaluable expression) are recoverable: a
//! rule skips the attribute and moves on. Error-level failures abort the
//! rule's check for the current runner and are surfaced to the user.

use thiserror::Error;

use terralint_loader::LoaderError;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unresolvable expression.
    Evaluation,
    /// The value is not statically known.
    UnknownValue,
    /// The value is null.
    NullValue,
    /// The value cannot be converted to the requested type.
    TypeConversion,
    /// The value has the wrong shape for the requested type.
    TypeMismatch,
    /// The expression references something outside the evaluator's scope.
    Unevaluable,
    /// A lookup against an external collaborator failed.
    External,
    /// A lower-level failure re-surfaced with added context.
    Context,
}

/// How the caller should react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    /// Skip the current attribute and continue.
    Warning,
    /// Abort the current rule's check.
    Error,
}

/// An evaluation failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub level: ErrorLevel,
    pub message: String,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EvalError {
    pub fn new(kind: ErrorKind, level: ErrorLevel, message: impl Into<String>) -> Self {
        Self {
            kind,
            level,
            message: message.into(),
            cause: None,
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation, ErrorLevel::Error, message)
    }

    pub fn unknown_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownValue, ErrorLevel::Warning, message)
    }

    pub fn null_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NullValue, ErrorLevel::Warning, message)
    }

    pub fn unevaluable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unevaluable, ErrorLevel::Warning, message)
    }

    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeConversion, ErrorLevel::Error, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, ErrorLevel::Error, message)
    }

    pub fn external(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::External,
            level: ErrorLevel::Error,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Wraps a lower-level failure with human-readable context.
    pub fn context(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: ErrorKind::Context,
            level: ErrorLevel::Error,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == ErrorLevel::Warning
    }
}

/// Top-level failure of a single-directory analysis.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_levels() {
        assert!(EvalError::unknown_value("x").is_warning());
        assert!(EvalError::null_value("x").is_warning());
        assert!(EvalError::unevaluable("x").is_warning());
        assert!(!EvalError::evaluation("x").is_warning());
        assert!(!EvalError::type_conversion("x").is_warning());
    }

    #[test]
    fn test_context_preserves_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = EvalError::context("while fetching inventory", io);
        assert_eq!(err.kind, ErrorKind::Context);
        assert!(std::error::Error::source(&err).is_some());
    }
}
