use std::time::Duration;

use crate::error::ValidationError;

use super::types::DurationValue;

/// Why a configured duration was rejected.
#[derive(Debug)]
pub(crate) enum DurationIssue {
    Negative,
    Invalid(ValidationError),
}

/// Parses `<digits><unit>` where unit is one of `ms`, `s`, `m`, `h` (default `s`).
pub(crate) fn parse_duration_value(value: &str, allow_zero: bool) -> Result<Duration, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let mut digits_len = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits_len = digits_len.saturating_add(1);
        } else {
            break;
        }
    }
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part.trim() };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        "h" => {
            let secs = number
                .checked_mul(60)
                .and_then(|seconds| seconds.checked_mul(60))
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };

    if !allow_zero && duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }

    Ok(duration)
}

pub(crate) fn resolve_duration(
    value: &DurationValue,
    allow_zero: bool,
) -> Result<Duration, DurationIssue> {
    match value {
        DurationValue::Seconds(secs) => {
            let secs = u64::try_from(*secs).map_err(|_err| DurationIssue::Negative)?;
            if !allow_zero && secs == 0 {
                return Err(DurationIssue::Invalid(ValidationError::DurationZero));
            }
            Ok(Duration::from_secs(secs))
        }
        DurationValue::Text(text) => {
            if text.trim_start().starts_with('-') {
                return Err(DurationIssue::Negative);
            }
            parse_duration_value(text, allow_zero).map_err(DurationIssue::Invalid)
        }
    }
}
