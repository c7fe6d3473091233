// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Kopi language front-end.
//!
//! This crate contains the front half of the compiler:
//! - Lexical analysis (tokenization with trivia tracking)
//! - Statement-terminator resolution (newlines as statement ends)
//! - Parsing (AST construction with error recovery)
//!
//! The front-end is designed as a language service: it never rejects an
//! input outright, producing a best-effort AST plus diagnostics so tooling
//! keeps working while the user types.

#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Declaration, Expression, SourceFile, Statement};
    pub use crate::source_analysis::{Diagnostic, Span, Token, TokenKind, lex_with_eof, parse};
}
