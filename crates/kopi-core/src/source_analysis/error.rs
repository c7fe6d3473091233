// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Structured scan and parse errors.
//!
//! Lexing and parsing never abort: the scanner emits [`TokenKind::Error`]
//! tokens and records a [`LexError`] for each, and the parser accumulates
//! diagnostics. These types exist so external consumers (the CLI, tests)
//! get spans and error kinds rather than strings.
//!
//! [`TokenKind::Error`]: super::token::TokenKind::Error

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::span::Span;

/// An error produced by the lexical scanner.
///
/// The span of an unterminated literal starts at the opening delimiter, so
/// a report points at the quote that was never closed rather than at the
/// end of the line or file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LexError {
    #[error("unterminated {what}")]
    #[diagnostic(code(kopi::lex::unterminated_literal))]
    UnterminatedLiteral {
        /// What was left open: "string literal", "character literal", ...
        what: &'static str,
        #[label("opened here and never closed")]
        span: Span,
    },

    #[error("invalid escape sequence")]
    #[diagnostic(
        code(kopi::lex::invalid_escape),
        help("valid escapes: \\n-style named escapes, \\NNN octal, \\xHH, \\uHHHH, \\u{{...}}, \\UHHHHHHHH")
    )]
    InvalidEscapeSequence {
        #[label("not a recognised escape")]
        span: Span,
    },

    #[error("unexpected character `{found}`")]
    #[diagnostic(code(kopi::lex::unexpected_character))]
    UnexpectedCharacter {
        found: char,
        #[label("not valid here")]
        span: Span,
    },
}

impl LexError {
    /// Byte offset where the error starts.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.span().start()
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::UnterminatedLiteral { span, .. }
            | Self::InvalidEscapeSequence { span }
            | Self::UnexpectedCharacter { span, .. } => *span,
        }
    }
}

/// A failed expression parse.
///
/// Carries the furthest byte offset the engine reached before giving up,
/// not the offset of the first complaint, along with the set of token
/// descriptions that would have been acceptable there.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParseError {
    #[error("expected {}, found {found}", render_expected(.expected))]
    #[diagnostic(code(kopi::parse::unexpected_token))]
    UnexpectedToken {
        expected: Vec<EcoString>,
        found: EcoString,
        offset: u32,
        #[label("parsing stopped here")]
        span: Span,
    },

    /// A `*` the positional disambiguation could not classify as spread or
    /// multiplication. Leading position in an argument or collection
    /// element is always spread and anything else is always a binary
    /// operator, so reaching this is an internal-consistency failure, not
    /// a property of any input.
    #[error("`*` is ambiguous between spread and multiplication here")]
    #[diagnostic(code(kopi::parse::ambiguous_operator))]
    AmbiguousOperatorPosition {
        offset: u32,
        #[label("ambiguous operator")]
        span: Span,
    },
}

impl ParseError {
    /// Furthest byte offset reached before the failure.
    #[must_use]
    pub fn offset(&self) -> u32 {
        match self {
            Self::UnexpectedToken { offset, .. } | Self::AmbiguousOperatorPosition { offset, .. } => {
                *offset
            }
        }
    }
}

fn render_expected(expected: &[EcoString]) -> String {
    match expected {
        [] => "an expression".to_string(),
        [one] => one.to_string(),
        [init @ .., last] => {
            let init: Vec<&str> = init.iter().map(EcoString::as_str).collect();
            format!("{} or {last}", init.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_literal_points_at_opening_delimiter() {
        let error = LexError::UnterminatedLiteral {
            what: "string literal",
            span: Span::new(4, 9),
        };
        assert_eq!(error.offset(), 4);
        assert_eq!(error.to_string(), "unterminated string literal");
    }

    #[test]
    fn expected_set_renders_as_list() {
        let error = ParseError::UnexpectedToken {
            expected: vec!["`)`".into(), "`,`".into()],
            found: "`;`".into(),
            offset: 12,
            span: Span::new(12, 13),
        };
        assert_eq!(error.to_string(), "expected `)` or `,`, found `;`");
    }

    #[test]
    fn empty_expected_set_falls_back() {
        let error = ParseError::UnexpectedToken {
            expected: vec![],
            found: "`}`".into(),
            offset: 0,
            span: Span::empty(0),
        };
        assert_eq!(error.to_string(), "expected an expression, found `}`");
    }
}
