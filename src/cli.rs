//! CLI argument parsing for compile-timer

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Printed when the positional arguments are wrong
pub const USAGE: &str =
    "usage: compile-timer directory/containing/build.ninja/ path/to/profiling/clang++";

#[derive(Parser, Debug)]
#[command(name = "compile-timer")]
#[command(version)]
#[command(
    about = "Re-run a ninja build through an instrumented clang and attribute parse time to headers",
    long_about = None
)]
pub struct Cli {
    /// Build directory containing build.ninja
    #[arg(value_name = "BUILD_DIR")]
    pub build_dir: PathBuf,

    /// Instrumented compiler, C or C++ variant (the other is derived by adding/stripping "++")
    #[arg(value_name = "COMPILER")]
    pub compiler: String,

    /// Settings file (defaults to BUILD_DIR/compile-timer.toml when present)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Kill any build command running longer than this
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip enumeration and execution; only analyze cached commands
    #[arg(long = "analyze-only")]
    pub analyze_only: bool,

    /// Enable trace-level logging
    #[arg(long = "debug")]
    pub debug: bool,
}

/// What `main` should do with the command line
#[derive(Debug)]
pub enum ParseOutcome {
    Run(Cli),
    /// Wrong argument count: print `USAGE` and exit successfully
    Usage,
    /// Help, version, an unknown flag or an invalid option value; let clap report it
    Exit(clap::Error),
}

/// A surplus positional, as opposed to an unrecognized `-x`/`--flag`
fn is_surplus_positional(e: &clap::Error) -> bool {
    match e.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => !arg.starts_with('-'),
        _ => false,
    }
}

pub fn parse_args<I, T>(args: I) -> ParseOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => ParseOutcome::Run(cli),
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument => ParseOutcome::Usage,
            ErrorKind::UnknownArgument if is_surplus_positional(&e) => ParseOutcome::Usage,
            _ => ParseOutcome::Exit(e),
        },
    }
}
