use std::time::Duration;

use crate::config::parse_duration_value;
use crate::error::ValidationError;

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) => {
            let key = key.trim();
            if key.is_empty() {
                return Err(ValidationError::InvalidHeaderName {
                    value: s.to_owned(),
                });
            }
            Ok((key.to_owned(), value.trim().to_owned()))
        }
        None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(super) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    parse_duration_value(s, false)
}
