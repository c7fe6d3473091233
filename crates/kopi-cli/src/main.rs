// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Kopi command-line interface.
//!
//! This is the main entry point for the `kopi` command.

use clap::{Parser, Subcommand};
use miette::Result;

mod commands;
mod diagnostic;

/// Kopi: a Kotlin-flavoured language front-end
#[derive(Debug, Parser)]
#[command(name = "kopi")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check source files for syntax errors without compiling
    Check {
        /// Source file or directory to check
        #[arg(default_value = ".")]
        path: String,

        /// Keep checking remaining files after one fails
        #[arg(long)]
        all: bool,
    },

    /// Dump the token stream of a source file
    Tokens {
        /// Source file to tokenize
        file: String,
    },
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check { path, all } => commands::check::check(&path, all),
        Command::Tokens { file } => commands::tokens::tokens(&file),
    };

    // Exit with appropriate code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

/// Initialize logging; `RUST_LOG` overrides the default filter.
fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env().add_directive(
                "kopi=info"
                    .parse()
                    .expect("Failed to parse tracing directive"),
            ),
        )
        .init();
}
