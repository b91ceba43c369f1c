use std::process::ExitCode;

use clap::Parser;

use crate::app::{RunOutcome, run_local};
use crate::args::RunArgs;
use crate::error::AppResult;

/// At least one threshold failed.
pub const EXIT_THRESHOLDS_FAILED: u8 = 99;
/// The scenario or invocation is invalid, or a threshold could not be
/// evaluated.
pub const EXIT_CONFIG_ERROR: u8 = 104;
const EXIT_FAILURE: u8 = 1;

/// Parses the CLI, runs the scenario on a multi-threaded runtime, and maps
/// the outcome to the process exit code.
#[must_use]
pub fn run() -> ExitCode {
    let args = match RunArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if let Err(print_err) = err.print() {
                eprintln!("Failed to print usage: {}", print_err);
            }
            return if err.use_stderr() {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {}", err);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let result = runtime.block_on(run_local(&args));
    if let Err(err) = result.as_ref() {
        eprintln!("Error: {}", err);
    }
    ExitCode::from(exit_status(&result))
}

fn exit_status(result: &AppResult<RunOutcome>) -> u8 {
    match result {
        Ok(outcome) if outcome.passed() => 0,
        Ok(_) => EXIT_THRESHOLDS_FAILED,
        Err(err) if err.is_config() => EXIT_CONFIG_ERROR,
        Err(_) => EXIT_FAILURE,
    }
}
