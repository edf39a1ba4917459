//! Command-line interface for the `riddle` frontend.
//!
//! Parses and elaborates RiDDLe source files against a fresh [`Core`]
//! backed by the in-tree [`ReferenceBackend`](crate::core::ReferenceBackend),
//! reporting any [`RiddleError`] with source-span context.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Core;
use crate::intern::Interner;

#[derive(Parser)]
#[command(name = "riddle")]
#[command(about = "Frontend for the RiDDLe planning/scheduling DSL", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and elaborate one or more RiDDLe files, reporting any errors.
    Check {
        /// Source files to check, elaborated together as one batch.
        files: Vec<PathBuf>,
    },

    /// Lex a single file and print its token stream.
    Tokens {
        /// Source file to lex.
        file: PathBuf,
    },
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { files } => cmd_check(&files),
        Commands::Tokens { file } => cmd_tokens(&file),
    }
}

fn cmd_check(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    if files.is_empty() {
        return Err("no input files given".into());
    }

    let mut interner = Interner::new();
    let mut core = Core::with_reference_backend();

    match crate::read_files(&mut core, files, &mut interner) {
        Ok(()) => {
            println!("Check passed ({} file(s))", files.len());
            Ok(())
        }
        Err(e) => {
            let source = source_for_error(&e, files).unwrap_or_default();
            eprintln!("{}", e.display_with_source(&source));
            std::process::exit(1);
        }
    }
}

fn cmd_tokens(file: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(file)?;
    let mut interner = Interner::new();
    let tokens = crate::lexer::Lexer::tokenize(&source, &mut interner)
        .map_err(crate::error::RiddleError::from)?;
    for tok in &tokens {
        println!("{:?}", tok);
    }
    Ok(())
}

/// Errors don't carry which file they came from, so for a multi-file batch
/// we fall back to the first file's contents for the caret-diagram context.
/// Good enough for the common one-file case; imprecise for genuine
/// cross-file errors in a multi-file `check`.
fn source_for_error(_e: &crate::error::RiddleError, files: &[PathBuf]) -> Option<String> {
    files.first().and_then(|p| std::fs::read_to_string(p).ok())
}
