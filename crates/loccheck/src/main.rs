//! Command-line interface for loccheck.
//!
//! Exits 0 when the parameter's location list is contiguous and covers its
//! function, 1 when a check fails, and 2 when the dump cannot be read.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use libloccheck::{Scanner, Verdict, validate};
use log::info;

/// Top-level argument parser describing the verifier interface.
#[derive(Parser, Debug)]
#[command(
    name = "loccheck",
    version,
    about = "Check that a parameter's DWARF location list covers its whole function",
    long_about = None
)]
struct Cli {
    /// Text output of `llvm-dwarfdump` (debug info, location and line sections).
    dump: PathBuf,
    /// Parameter name used in diagnostics.
    #[arg(short, long, default_value = "b")]
    parameter: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match check_dump(&cli) {
        Ok(Verdict::Pass) => ExitCode::SUCCESS,
        Ok(Verdict::Fail(failure)) => {
            eprintln!("{}", failure.report(&cli.parameter));
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("loccheck: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn check_dump(cli: &Cli) -> Result<Verdict> {
    info!("Scanning {}", cli.dump.display());
    let scanner = Scanner::new()?;
    let scan = scanner
        .scan_file(&cli.dump)
        .with_context(|| format!("cannot scan {}", cli.dump.display()))?;
    info!("Scan finished in state {}", scan.state);
    Ok(validate(&scan))
}
