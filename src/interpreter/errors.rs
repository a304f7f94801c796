//! Runtime error types for the Respawn interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to lexical or parse errors).
//!
//! All runtime errors are fatal: they abort the current run and are shown with
//! the offending source range.

use crate::parser::ast::SourceSpan;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Operand or value of the wrong type
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String, span: SourceSpan },

    /// A dead variable, array or value was used
    #[error("{message}")]
    DeadValue { message: String, span: SourceSpan },

    #[error("division by zero")]
    DivisionByZero { span: SourceSpan },

    #[error("modulo by zero")]
    ModuloByZero { span: SourceSpan },

    /// Checked `hp` arithmetic failed, or an `xp` result is not finite
    #[error("numeric overflow in '{operation}'")]
    Overflow { operation: String, span: SourceSpan },

    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds {
        index: i64,
        len: usize,
        span: SourceSpan,
    },

    #[error("{message}")]
    DimensionMismatch { message: String, span: SourceSpan },

    /// Attempted to modify an `immo` binding
    #[error("cannot modify immutable '{name}'")]
    Immutable { name: String, span: SourceSpan },

    /// Declaration or lookup failure in the scope stack
    #[error("{message}")]
    Environment { message: String, span: SourceSpan },

    #[error("function '{function}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        function: String,
        expected: String,
        found: usize,
        span: SourceSpan,
    },

    /// A call yielded a different number of values than its use needs
    #[error("{message}")]
    RecallArity { message: String, span: SourceSpan },

    #[error("'{input}' is not a number")]
    InvalidNumber { input: String, span: SourceSpan },

    #[error("{message}")]
    Conversion { message: String, span: SourceSpan },

    #[error("cannot drop from empty array '{name}'")]
    EmptyArray { name: String, span: SourceSpan },

    /// Sized declaration whose initializer has a different length
    #[error("{message}")]
    InitializerLength { message: String, span: SourceSpan },

    #[error("call depth limit of {limit} exceeded")]
    CallDepth { limit: usize, span: SourceSpan },

    /// A newer run began while this one was still going
    #[error("run cancelled")]
    Cancelled { span: SourceSpan },

    #[error("host failure: {message}")]
    Host { message: String, span: SourceSpan },
}

impl RuntimeError {
    pub fn span(&self) -> SourceSpan {
        match self {
            RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::DeadValue { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::ModuloByZero { span }
            | RuntimeError::Overflow { span, .. }
            | RuntimeError::IndexOutOfBounds { span, .. }
            | RuntimeError::DimensionMismatch { span, .. }
            | RuntimeError::Immutable { span, .. }
            | RuntimeError::Environment { span, .. }
            | RuntimeError::ArgumentCount { span, .. }
            | RuntimeError::RecallArity { span, .. }
            | RuntimeError::InvalidNumber { span, .. }
            | RuntimeError::Conversion { span, .. }
            | RuntimeError::EmptyArray { span, .. }
            | RuntimeError::InitializerLength { span, .. }
            | RuntimeError::CallDepth { span, .. }
            | RuntimeError::Cancelled { span }
            | RuntimeError::Host { span, .. } => *span,
        }
    }

    pub fn category(&self) -> &'static str {
        "Runtime Error"
    }

    /// One-line form: category, message and start position
    pub fn headline(&self) -> String {
        format!("{}: {} at {}", self.category(), self, self.span().start)
    }

    pub(crate) fn type_mismatch(message: impl Into<String>, span: SourceSpan) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn dead(message: impl Into<String>, span: SourceSpan) -> Self {
        RuntimeError::DeadValue {
            message: message.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;

    #[test]
    fn test_headline_format() {
        let span = SourceSpan::point(SourceLocation::new(3, 7));
        let err = RuntimeError::DivisionByZero { span };
        assert_eq!(err.headline(), "Runtime Error: division by zero at line 3, column 7");
    }
}
