use super::*;
use crate::error::{AppError, AppResult};
use clap::Parser;
use std::time::Duration;

fn parse_test_args<I, T>(args: I) -> AppResult<RunArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    RunArgs::try_parse_from(args).map_err(AppError::from)
}

#[test]
fn parse_header_valid() -> AppResult<()> {
    let parsed = parse_header("Content-Type: application/json");
    match parsed {
        Ok((key, value)) => {
            if key != "Content-Type" {
                return Err(AppError::validation(format!("Unexpected key: {}", key)));
            }
            if value != "application/json" {
                return Err(AppError::validation(format!("Unexpected value: {}", value)));
            }
            Ok(())
        }
        Err(err) => Err(AppError::validation(format!(
            "Expected Ok, got Err: {}",
            err
        ))),
    }
}

#[test]
fn parse_header_invalid() -> AppResult<()> {
    if parse_header("MissingDelimiter").is_ok() {
        return Err(AppError::validation("Expected Err for invalid header"));
    }
    if parse_header(": value").is_ok() {
        return Err(AppError::validation("Expected Err for empty header name"));
    }
    Ok(())
}

#[test]
fn cli_defaults_are_unset() -> AppResult<()> {
    let args = parse_test_args(["surge"])?;
    if args.config.is_some() || args.timeout.is_some() || args.grace_period.is_some() {
        return Err(AppError::validation("Expected no overrides by default"));
    }
    if args.quiet || args.verbose || args.no_summary_export {
        return Err(AppError::validation("Expected flags to be off by default"));
    }
    Ok(())
}

#[test]
fn cli_parses_overrides() -> AppResult<()> {
    let args = parse_test_args([
        "surge",
        "-c",
        "baseline.toml",
        "--base-url",
        "http://127.0.0.1:8080",
        "--timeout",
        "5s",
        "--grace-period",
        "250ms",
        "--summary-export",
        "out.json",
        "-q",
    ])?;
    if args.config.as_deref() != Some("baseline.toml") {
        return Err(AppError::validation("Unexpected config path"));
    }
    if args.base_url.as_deref() != Some("http://127.0.0.1:8080") {
        return Err(AppError::validation("Unexpected base url"));
    }
    if args.timeout != Some(Duration::from_secs(5)) {
        return Err(AppError::validation(format!(
            "Unexpected timeout: {:?}",
            args.timeout
        )));
    }
    if args.grace_period != Some(Duration::from_millis(250)) {
        return Err(AppError::validation(format!(
            "Unexpected grace period: {:?}",
            args.grace_period
        )));
    }
    if args.summary_export.as_deref() != Some("out.json") || !args.quiet {
        return Err(AppError::validation("Unexpected summary/quiet flags"));
    }
    Ok(())
}

#[test]
fn cli_rejects_zero_timeout() -> AppResult<()> {
    if parse_test_args(["surge", "--timeout", "0s"]).is_ok() {
        return Err(AppError::validation("Expected zero timeout to be rejected"));
    }
    Ok(())
}

#[test]
fn cli_rejects_conflicting_summary_flags() -> AppResult<()> {
    let parsed = parse_test_args([
        "surge",
        "--summary-export",
        "out.json",
        "--no-summary-export",
    ]);
    if parsed.is_ok() {
        return Err(AppError::validation(
            "Expected --summary-export to conflict with --no-summary-export",
        ));
    }
    Ok(())
}
