// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Dump the token stream of a source file.
//!
//! A debugging aid for the scanner: one token per line with its byte span,
//! plus a `↵` marker on tokens that start a new line, since that is what
//! the statement-terminator rules key on.

use camino::Utf8PathBuf;
use kopi_core::source_analysis::lex_full;
use miette::{Context, IntoDiagnostic, Result};
use std::fs;
use tracing::instrument;

#[instrument(skip_all, fields(file = %file))]
pub fn tokens(file: &str) -> Result<()> {
    let path = Utf8PathBuf::from(file);
    let source = fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read '{path}'"))?;

    let (tokens, errors) = lex_full(&source);

    for token in &tokens {
        let span = token.span();
        let newline = if token.has_leading_newline() { "↵ " } else { "  " };
        println!(
            "{:>5}..{:<5} {newline}{}",
            span.start(),
            span.end(),
            token.kind().describe(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        miette::bail!("{} lex error(s) in '{path}'", errors.len())
    }
}
