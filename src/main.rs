//! Indify CLI
//!
//! Reads a binary compiled unit, rewrites direct method calls into
//! bootstrap-bound dynamic call sites, and writes the transformed unit.

use anyhow::Context;
use clap::Parser;
use indify::rewrite::{self, Discard, Trace};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "indify")]
#[command(author, version, about = "Rewrite direct method calls into dynamic call sites", long_about = None)]
struct Cli {
    /// Compiled unit to rewrite
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the rewritten unit
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // At -v and above every synthesized call site is logged.
    if cli.verbose > 0 {
        rewrite::rewrite_file(&cli.input, &cli.output, &mut Trace)
    } else {
        rewrite::rewrite_file(&cli.input, &cli.output, &mut Discard)
    }
    .with_context(|| format!("rewriting '{}'", cli.input.display()))
}

fn setup_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("indify={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
