//! CLI module for reflectmap
//!
//! Small utilities around the key normalizer, handy when checking how a document will line up with a record.
//!
//! ## Commands
//!
//! - `keys <file>` - List the top-level keys of a JSON object with their cleaned form
//! - `normalize <file>` - Rewrite every key of a JSON document in cleanup mode
//! - `snake <word>...` - Convert camelCase words to snake_case
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<crate::MapError> for CliError {
    fn from(err: crate::MapError) -> Self {
        Self::failure(format!("Error: {err}"))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Inspect and normalize document keys the way reflectmap matches them
#[derive(Parser, Debug)]
#[command(name = "reflectmap")]
#[command(version = VERSION)]
#[command(about = "Inspect and normalize document keys", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Extra reserved words, escaped with a leading underscore in field names
    #[arg(long = "reserved", value_name = "WORD", global = true)]
    pub reserved: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List top-level keys of a JSON object with their cleaned form
    Keys {
        /// JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Rewrite every key of a JSON document in cleanup mode
    Normalize {
        /// JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Convert camelCase words to snake_case
    Snake {
        /// Words to convert
        #[arg(value_name = "WORD", required = true)]
        words: Vec<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = commands::config_with(&cli.reserved);
    match cli.command {
        Command::Keys { file } => commands::list_keys(&file.to_string_lossy(), &config),
        Command::Normalize { file, pretty } => commands::normalize_file(&file.to_string_lossy(), pretty, &config),
        Command::Snake { words } => commands::snake_words(&words),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_keys() {
        let cli = Cli::try_parse_from(["reflectmap", "keys", "doc.json"]).unwrap();
        assert!(matches!(cli.command, Command::Keys { .. }));
    }

    #[test]
    fn test_cli_parse_normalize_pretty() {
        let cli = Cli::try_parse_from(["reflectmap", "normalize", "doc.json", "--pretty"]).unwrap();
        if let Command::Normalize { pretty, .. } = cli.command {
            assert!(pretty);
        } else {
            panic!("Expected Normalize command");
        }
    }

    #[test]
    fn test_cli_parse_snake_requires_words() {
        assert!(Cli::try_parse_from(["reflectmap", "snake"]).is_err());
        let cli = Cli::try_parse_from(["reflectmap", "snake", "userName", "URL"]).unwrap();
        if let Command::Snake { words } = cli.command {
            assert_eq!(words, vec!["userName", "URL"]);
        } else {
            panic!("Expected Snake command");
        }
    }

    #[test]
    fn test_cli_parse_global_reserved() {
        let cli = Cli::try_parse_from(["reflectmap", "keys", "doc.json", "--reserved", "class"]).unwrap();
        assert_eq!(cli.reserved, vec!["class"]);
    }
}
