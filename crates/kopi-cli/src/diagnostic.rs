// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Beautiful error diagnostics using miette.
//!
//! Converts kopi-core diagnostics into miette-formatted errors with:
//! - Source code context
//! - Arrows pointing to the error location
//! - Diagnostic codes for easy reference
//! - Support for multiple errors and warnings

use kopi_core::source_analysis::{Diagnostic as CoreDiagnostic, LexError, Severity};
use miette::{Diagnostic, SourceSpan};

/// A check diagnostic with rich formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(kopi::check))]
pub struct CheckDiagnostic {
    /// Error or warning
    pub severity: Severity,
    /// Human-readable error message
    pub message: String,
    /// Source code for context
    #[source_code]
    pub src: miette::NamedSource<String>,
    /// Location of the error
    #[label("{label}")]
    pub span: SourceSpan,
    /// Label for the error span (interpolated by miette derive macro)
    pub label: String,
}

impl CheckDiagnostic {
    /// Create a diagnostic from a kopi-core parse diagnostic.
    pub fn from_parse_diagnostic(
        diagnostic: &CoreDiagnostic,
        source_path: &str,
        source: &str,
    ) -> Self {
        let label = match diagnostic.severity {
            Severity::Error => "error here",
            Severity::Warning => "warning here",
        };

        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.clone(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: (
                diagnostic.span.start() as usize,
                diagnostic.span.len() as usize,
            )
                .into(),
            label: label.to_string(),
        }
    }

    /// Create a diagnostic from a kopi-core lex error.
    pub fn from_lex_error(error: &LexError, source_path: &str, source: &str) -> Self {
        Self {
            severity: Severity::Error,
            message: error.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: (error.span().start() as usize, error.span().len() as usize).into(),
            label: "error here".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kopi_core::source_analysis::Span;

    #[test]
    fn from_parse_diagnostic_error() {
        let core_diag = CoreDiagnostic::error("expected an expression", Span::new(10, 15));
        let source = "val x = (1 + )";
        let diag = CheckDiagnostic::from_parse_diagnostic(&core_diag, "demo.kopi", source);

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "expected an expression");
        assert_eq!(diag.span.offset(), 10);
        assert_eq!(diag.span.len(), 5);
        assert_eq!(diag.label, "error here");
    }

    #[test]
    fn from_parse_diagnostic_warning() {
        let core_diag = CoreDiagnostic::warning("redundant semicolon", Span::new(5, 8));
        let source = "val x;;; = 42";
        let diag = CheckDiagnostic::from_parse_diagnostic(&core_diag, "demo.kopi", source);

        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.label, "warning here");
    }

    #[test]
    fn from_parse_diagnostic_zero_length_span() {
        let core_diag = CoreDiagnostic::error("unexpected end of input", Span::new(10, 10));
        let source = "val x = (1";
        let diag = CheckDiagnostic::from_parse_diagnostic(&core_diag, "demo.kopi", source);

        assert_eq!(diag.span.offset(), 10);
        assert_eq!(diag.span.len(), 0);
    }

    #[test]
    fn from_lex_error_carries_span_and_message() {
        let error = LexError::UnterminatedLiteral {
            what: "string literal",
            span: Span::new(4, 9),
        };
        let diag = CheckDiagnostic::from_lex_error(&error, "demo.kopi", "v = \"oops");

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "unterminated string literal");
        assert_eq!(diag.span.offset(), 4);
        assert_eq!(diag.span.len(), 5);
    }
}
