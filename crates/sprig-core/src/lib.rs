//! Core types shared across the Sprig toolchain.
//!
//! This crate holds the leaf types every stage depends on:
//!
//! - [`Span`]: source positions for tokens, AST nodes, and diagnostics
//! - [`Diagnostic`] / [`Diagnostics`]: location-tagged findings from
//!   static analysis
//! - Error types for each phase: [`LexError`], [`ParseError`],
//!   [`CompileError`]

pub mod diagnostics;
pub mod error;
pub mod span;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{CompileError, LexError, ParseError, ParseErrorKind};
pub use span::Span;
