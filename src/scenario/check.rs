use std::time::Duration;

use reqwest::header::HeaderName;

use crate::http::ExecutionRecord;
use crate::metrics::MetricId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn holds<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }

    /// Splits a leading operator off `input`, longest match first.
    pub(crate) fn split_prefix(input: &str) -> Option<(CompareOp, &str)> {
        const OPS: [(&str, CompareOp); 6] = [
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ];
        let input = input.trim_start();
        OPS.iter().find_map(|(token, op)| {
            input
                .strip_prefix(token)
                .map(|rest| (*op, rest.trim()))
        })
    }
}

/// Condition evaluated against one response record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Status(CompareOp, u16),
    Duration(CompareOp, Duration),
    HeaderPresent(HeaderName),
    HeaderEquals(HeaderName, String),
    BodyContains(String),
}

impl Predicate {
    /// Parses `status == 200`, `duration < 500`, `header(Cache-Control)`,
    /// `header(Content-Type) == text/html` or `body contains "ok"`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the predicate is malformed.
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix("status") {
            let (op, value) = CompareOp::split_prefix(rest)
                .ok_or_else(|| format!("expected a comparison after 'status' in '{}'", input))?;
            let code: u16 = value
                .parse()
                .map_err(|err| format!("invalid status code '{}': {}", value, err))?;
            return Ok(Predicate::Status(op, code));
        }
        if let Some(rest) = input.strip_prefix("duration") {
            let (op, value) = CompareOp::split_prefix(rest)
                .ok_or_else(|| format!("expected a comparison after 'duration' in '{}'", input))?;
            return Ok(Predicate::Duration(op, parse_millis(value)?));
        }
        if let Some(rest) = input.strip_prefix("header") {
            return parse_header_predicate(rest.trim_start());
        }
        if let Some(rest) = input.strip_prefix("body") {
            let text = rest
                .trim_start()
                .strip_prefix("contains")
                .ok_or_else(|| format!("expected 'body contains <text>' in '{}'", input))?;
            let text = unquote(text.trim());
            if text.is_empty() {
                return Err("'body contains' needs non-empty text".to_owned());
            }
            return Ok(Predicate::BodyContains(text.to_owned()));
        }
        Err(format!(
            "unknown predicate '{}' (expected status, duration, header or body)",
            input
        ))
    }

    #[must_use]
    pub const fn needs_body(&self) -> bool {
        matches!(self, Predicate::BodyContains(_))
    }

    /// Missing data (no status, headers or body after a failed request)
    /// evaluates to `false`.
    #[must_use]
    pub fn evaluate(&self, record: &ExecutionRecord) -> bool {
        match self {
            Predicate::Status(op, expected) => record
                .status
                .is_some_and(|status| op.holds(status, *expected)),
            Predicate::Duration(op, limit) => op.holds(record.duration, *limit),
            Predicate::HeaderPresent(name) => record
                .headers
                .as_ref()
                .is_some_and(|headers| headers.contains_key(name)),
            Predicate::HeaderEquals(name, expected) => record
                .headers
                .as_ref()
                .and_then(|headers| headers.get(name))
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == expected),
            Predicate::BodyContains(needle) => record
                .body
                .as_deref()
                .is_some_and(|body| contains_bytes(body, needle.as_bytes())),
        }
    }
}

/// A named predicate whose outcome is reported to `metric`.
#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub predicate: Predicate,
    pub metric: String,
    pub metric_id: MetricId,
}

fn parse_header_predicate(rest: &str) -> Result<Predicate, String> {
    let inner = rest
        .strip_prefix('(')
        .ok_or_else(|| "expected 'header(<Name>)'".to_owned())?;
    let (name, tail) = inner
        .split_once(')')
        .ok_or_else(|| "missing ')' after header name".to_owned())?;
    let name = name.trim();
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| format!("invalid header name '{}': {}", name, err))?;

    let tail = tail.trim();
    if tail.is_empty() {
        return Ok(Predicate::HeaderPresent(header));
    }
    let value = tail
        .strip_prefix("==")
        .ok_or_else(|| format!("expected '== <value>' after header({}), got '{}'", name, tail))?;
    Ok(Predicate::HeaderEquals(header, unquote(value.trim()).to_owned()))
}

#[expect(
    clippy::float_arithmetic,
    reason = "latency bounds may be fractional milliseconds"
)]
fn parse_millis(value: &str) -> Result<Duration, String> {
    let millis: f64 = value
        .parse()
        .map_err(|err| format!("invalid duration '{}': {}", value, err))?;
    if !millis.is_finite() || millis < 0.0 {
        return Err(format!("duration must be a non-negative number, got '{}'", value));
    }
    Duration::try_from_secs_f64(millis / 1000.0)
        .map_err(|err| format!("duration '{}' out of range: {}", value, err))
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty()
        || haystack
            .windows(needle.len())
            .any(|window| window == needle)
}
