// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Check Kopi source files for syntax errors.

use camino::{Utf8Path, Utf8PathBuf};
use kopi_core::source_analysis::{Severity, lex_full, parse};
use miette::{Context, IntoDiagnostic, Result};
use std::fs;
use tracing::{debug, info, instrument};

use crate::diagnostic::CheckDiagnostic;

/// Check Kopi source files.
///
/// Lexes and parses every `.kopi` file at `path` and renders the
/// diagnostics. The parser is total, so a broken file still reports every
/// problem it contains; with `all`, files after the first failing one are
/// checked too.
#[instrument(skip_all, fields(path = %path))]
pub fn check(path: &str, all: bool) -> Result<()> {
    let source_path = Utf8PathBuf::from(path);
    let source_files = find_source_files(&source_path)?;

    if source_files.is_empty() {
        miette::bail!("No .kopi source files found in '{path}'");
    }

    info!(count = source_files.len(), "Checking source files");

    let mut failed = 0usize;
    for file in &source_files {
        if check_file(file)? > 0 {
            failed += 1;
            if !all {
                break;
            }
        }
    }

    if failed > 0 {
        miette::bail!("{failed} of {} file(s) had errors", source_files.len());
    }
    println!("{} file(s) OK", source_files.len());
    Ok(())
}

/// Check one file, printing its diagnostics. Returns the error count.
fn check_file(file: &Utf8Path) -> Result<usize> {
    debug!(%file, "Reading source file");
    let source = fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read '{file}'"))?;

    let (tokens, lex_errors) = lex_full(&source);
    let (_tree, diagnostics) = parse(tokens);
    debug!(
        lex_errors = lex_errors.len(),
        diagnostics = diagnostics.len(),
        "Parsed"
    );

    let mut errors = 0usize;
    for lex_error in &lex_errors {
        errors += 1;
        let report =
            miette::Report::new(CheckDiagnostic::from_lex_error(lex_error, file.as_str(), &source));
        eprintln!("{report:?}");
    }
    for diagnostic in &diagnostics {
        if diagnostic.severity == Severity::Error {
            errors += 1;
        }
        let report = miette::Report::new(CheckDiagnostic::from_parse_diagnostic(
            diagnostic,
            file.as_str(),
            &source,
        ));
        eprintln!("{report:?}");
    }
    Ok(errors)
}

/// Find all `.kopi` source files at the given path.
///
/// If `path` is a file, returns it (must have `.kopi` extension).
/// If `path` is a directory, searches a `src/` subdirectory first, falling
/// back to the directory itself.
fn find_source_files(path: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if path.extension() == Some("kopi") {
            files.push(path.to_path_buf());
        } else {
            miette::bail!("File '{}' is not a .kopi source file", path);
        }
    } else if path.is_dir() {
        let src_dir = path.join("src");
        let search_dir = if src_dir.exists() {
            src_dir
        } else {
            path.to_path_buf()
        };

        collect_kopi_files_recursive(&search_dir, &mut files)?;
        files.sort();
    } else {
        miette::bail!("Path '{}' does not exist", path);
    }

    Ok(files)
}

/// Recursively collect all `.kopi` files from a directory tree.
///
/// Symlinks are skipped to avoid infinite recursion from circular links.
fn collect_kopi_files_recursive(dir: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        let file_type = entry.file_type().into_diagnostic()?;
        if file_type.is_symlink() {
            continue;
        }
        let entry_path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|_| miette::miette!("Non-UTF-8 path"))?;

        if file_type.is_dir() {
            collect_kopi_files_recursive(&entry_path, files)?;
        } else if file_type.is_file() && entry_path.extension() == Some("kopi") {
            files.push(entry_path);
        }
    }
    Ok(())
}
