//! `vecnav` binary.
//!
//! Results are written to stdout. Everything else, including the final error,
//! is reported through `tracing` on stderr once logging is up.

use std::{
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, field};
use vecnav_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};
use vecnav_core::HnswErrorCode;

fn run(cli: Cli) -> Result<()> {
    let summary = run_cli(cli).context("search command failed")?;
    let mut out = BufWriter::new(io::stdout().lock());
    render_summary(&summary, &mut out).context("could not write results")?;
    out.flush().context("could not flush stdout")
}

/// Stable index error code behind `err`, if the index raised it.
fn index_error_code(err: &anyhow::Error) -> Option<HnswErrorCode> {
    match err.downcast_ref::<CliError>()? {
        CliError::Core(core) => Some(core.code()),
        _ => None,
    }
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        logging_unavailable(&err);
        return ExitCode::FAILURE;
    }

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = index_error_code(&err).map(|code| field::display(code.as_str()));
            error!(error = %format!("{err:#}"), code, "vecnav exited with an error");
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "no subscriber is installed when logging setup fails"
)]
fn logging_unavailable(err: &LoggingError) {
    eprintln!("vecnav: cannot set up logging: {err}");
}
