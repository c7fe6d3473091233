// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing infrastructure for Kopi source code.
//!
//! This module contains the lexer, the statement-terminator rules, and the
//! parser.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Each token
//! carries its source location via [`Span`] and its surrounding trivia
//! (whitespace and comments), so the token stream reproduces the input byte
//! for byte.
//!
//! ```
//! use kopi_core::source_analysis::lex;
//!
//! let tokens = lex("x + 1");
//! assert_eq!(tokens.len(), 3); // x, +, 1
//! ```
//!
//! See [`TokenKind`] for all supported syntactic elements.
//!
//! # Statement Terminators
//!
//! Kopi statements end at a `;` or, under the rules in the terminator
//! module, at a newline. [`is_terminator_at`] answers the question for one
//! token boundary; the parser asks it between statements.
//!
//! # Parsing
//!
//! The [`parse`] function converts tokens into a [`SourceFile`] AST plus a
//! list of [`Diagnostic`]s. Binary operator precedence uses precedence
//! climbing for correct associativity and easy extensibility.
//!
//! # Error Handling
//!
//! The lexer uses error recovery: invalid input is converted into
//! [`TokenKind::Error`] tokens rather than stopping, and [`lex_full`]
//! additionally returns the structured [`LexError`]s with miette
//! integration. The parser never fails either; it always produces a
//! [`SourceFile`], however broken the input.
//!
//! [`SourceFile`]: crate::ast::SourceFile

mod error;
mod lexer;
mod parser;
mod span;
mod terminator;
mod token;


pub use error::{LexError, ParseError};
pub use lexer::{EscapeDecodeError, Lexer, decode_escapes, lex, lex_full, lex_with_eof};
pub use parser::{BindingPower, Diagnostic, Parser, Severity, parse, parse_expression};
pub use span::Span;
pub use terminator::{TerminatorContext, begins_continuation, can_end_statement, is_terminator_at};
pub use token::{Keyword, Token, TokenKind, Trivia, TriviaKind};
