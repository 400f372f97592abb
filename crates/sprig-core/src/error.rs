//! Error types for the Sprig toolchain.
//!
//! Each phase has its own error type:
//!
//! - [`LexError`]: tokenization errors
//! - [`ParseError`]: parser errors (with [`ParseErrorKind`])
//! - [`CompileError`]: fatal bytecode-lowering errors
//!
//! Note the split in regimes: the resolver reports its findings as
//! [`Diagnostic`](crate::Diagnostic)s and never fails, while the compiler
//! aborts on the first `CompileError` and produces no partial module.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during tokenization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An expression was expected.
    ExpectedExpression,
}

/// A parser error with its category, message, and location.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Fatal errors from bytecode lowering.
///
/// Any of these aborts the whole compilation: there is no partial module
/// and no accumulation mode (contrast with the resolver's diagnostics).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// A direct call names a function that is not in the function table.
    #[error("at {span}: unknown function '{name}'")]
    UnknownFunction {
        /// The name that failed to resolve.
        name: String,
        /// Where the call appeared.
        span: Span,
    },

    /// A call whose callee is not a bare identifier.
    #[error("at {span}: only direct calls by name are supported")]
    IndirectCallee {
        /// Where the call appeared.
        span: Span,
    },
}
