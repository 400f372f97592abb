//! Sprig: a small scripting language with a verified stack-bytecode
//! back end.
//!
//! The toolchain is split into three crates, re-exported here:
//!
//! - `sprig-parser`: lexer + recursive-descent parser producing an
//!   arena-allocated program tree
//! - `sprig-compiler`: the semantic resolver, the bytecode compiler, and
//!   the structural verifier
//! - `sprig-core`: spans, diagnostics, and error types shared by both
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use sprig::{Compiler, Parser, Resolver, verify};
//!
//! let arena = Bump::new();
//! let source = r#"
//!     let x = 3;
//!     fn add(a, b) { return a + b; }
//!     if (x < 10) { print(add(x, 5)); }
//! "#;
//!
//! let program = Parser::parse(source, &arena).expect("syntax is valid");
//!
//! // Static analysis: accumulates findings, never aborts.
//! let diagnostics = Resolver::new().resolve(&program);
//! assert!(diagnostics.is_empty());
//!
//! // Lowering: fails fast on unsupported shapes.
//! let module = Compiler::compile(&program).expect("lowers to bytecode");
//! assert_eq!(module.funcs[0].name, "main");
//!
//! // Structural verification: a non-empty report means "not runnable".
//! assert!(verify(&module).is_empty());
//! ```

pub use sprig_core::{
    CompileError, Diagnostic, Diagnostics, LexError, ParseError, ParseErrorKind, Span,
};
pub use sprig_parser::{Ident, Lexer, ParseErrors, Parser, Program, Token, TokenKind, ast};
pub use sprig_compiler::{
    Compiler, Constant, Function, Instr, Module, Opcode, Problem, Resolver, Symbol, SymbolKind,
    Type, verify,
};
