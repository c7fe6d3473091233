// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for parser crash safety testing.
//!
//! This target feeds arbitrary byte sequences to the lexer and parser and
//! asserts that neither panics. The front-end must handle all input
//! gracefully, producing a tree plus diagnostics for anything.
//!
//! # Success Criteria
//!
//! - No panic on any input (including invalid UTF-8, which is filtered
//!   here because the lexer takes `&str`)
//! - A `SourceFile` and `Vec<Diagnostic>` come back for every input
//! - Every diagnostic span stays inside the input

#![no_main]

use kopi_core::source_analysis::{lex_with_eof, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only test valid UTF-8; invalid UTF-8 is filtered before the lexer
    // in every real caller.
    if let Ok(source) = std::str::from_utf8(data) {
        let tokens = lex_with_eof(source);
        let (_tree, diagnostics) = parse(tokens);

        let len = u32::try_from(source.len()).unwrap_or(u32::MAX);
        for diagnostic in &diagnostics {
            assert!(diagnostic.span.end() <= len);
        }
    }
});
