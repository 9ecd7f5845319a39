//! CLI module for the `ternc` frontend driver.
//!
//! `ternc` runs one compilation session over the given inputs: it builds an
//! [`Invocation`](crate::Invocation) from flags, sets up a [`CompilerInstance`](crate::CompilerInstance),
//! performs the session and prints diagnostics.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use crate::frontend::ast::SourceKind;

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

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Input kind selected with `--kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    Main,
    Library,
    Sil,
    Repl,
}

impl From<InputKind> for SourceKind {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Main => SourceKind::Main,
            InputKind::Library => SourceKind::Library,
            InputKind::Sil => SourceKind::Sil,
            InputKind::Repl => SourceKind::Repl,
        }
    }
}

/// The tern compiler frontend
#[derive(Parser, Debug)]
#[command(name = "ternc")]
#[command(version = VERSION)]
#[command(about = "The tern compiler frontend", long_about = None)]
pub struct Cli {
    /// Input files
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// What kind of input the session compiles
    #[arg(long, value_enum, default_value_t = InputKind::Main)]
    pub kind: InputKind,

    /// Name of the module being compiled (defaults to the first file's stem)
    #[arg(long = "module-name", value_name = "NAME")]
    pub module_name: Option<String>,

    /// Add a directory to the import search path
    #[arg(short = 'I', value_name = "DIR")]
    pub import_paths: Vec<PathBuf>,

    /// SDK root; enables native-interop imports
    #[arg(long = "sdk", value_name = "DIR")]
    pub sdk: Option<PathBuf>,

    /// Target triple (defaults to the host)
    #[arg(long = "target", value_name = "TRIPLE")]
    pub target: Option<String>,

    /// Runtime include directory
    #[arg(long = "runtime-include", value_name = "DIR")]
    pub runtime_include: Option<PathBuf>,

    /// Module cache directory for the native-interop importer
    #[arg(long = "module-cache", value_name = "DIR")]
    pub module_cache: Option<PathBuf>,

    /// Pass an argument through to the native-interop importer
    #[arg(long = "Xnative", value_name = "ARG", allow_hyphen_values = true)]
    pub native_args: Vec<String>,

    /// Parse without type checking
    #[arg(long = "parse-only")]
    pub parse_only: bool,

    /// The input is the standard library itself
    #[arg(long = "parse-stdlib")]
    pub parse_stdlib: bool,

    /// Parse imported source modules with their bodies
    #[arg(long = "immediate")]
    pub immediate: bool,

    /// Skip function bodies in the main pass and parse them afterwards
    #[arg(long = "delay-bodies")]
    pub delay_bodies: bool,

    /// Run code completion at FILE:OFFSET
    #[arg(long = "code-complete", value_name = "FILE:OFFSET")]
    pub code_complete: Option<String>,

    /// Print the parsed declarations (and the SIL module, for `--kind sil`)
    #[arg(long = "dump-decls")]
    pub dump_decls: bool,
}

// ============================================================================
// Entry point
// ============================================================================

/// Run the CLI.
///
/// This is the only function that calls `process::exit`.
pub fn run() {
    let cli = Cli::parse();
    match execute(&cli) {
        Ok(code) => process::exit(code.0),
        Err(err) => {
            eprintln!("{err}");
            process::exit(err.exit_code.0);
        }
    }
}

/// Execute the CLI command, returning an exit code or error.
pub fn execute(cli: &Cli) -> CliResult<ExitCode> {
    if cli.files.is_empty() && cli.code_complete.is_none() && cli.kind != InputKind::Repl {
        return Err(CliError::new("Error: no input files", ExitCode(2)));
    }
    commands::compile(cli)
}
