use crossterm::style::{Color, Stylize};

use crate::metrics::MetricSummary;

use super::summary::RunSummary;

/// Metric names are padded with dots to this width.
const NAME_WIDTH: usize = 28;
const PASS_MARK: &str = "✓";
const FAIL_MARK: &str = "✗";

/// Condensed human-readable table: one row per metric, then thresholds,
/// totals, and the overall verdict.
#[must_use]
pub fn render_table(summary: &RunSummary, color: bool) -> String {
    summary_lines(summary, color).join("\n")
}

fn summary_lines(summary: &RunSummary, color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let state = if summary.cancelled {
        "aborted"
    } else {
        "completed"
    };
    lines.push(format!(
        "Run {} in {} (started {})",
        state,
        format_duration_ms(summary.duration_ms),
        summary.started_at
    ));
    lines.push(String::new());

    for (name, metric) in &summary.metrics {
        lines.push(format!("  {} {}", dotted_name(name), metric_cells(metric)));
    }

    if !summary.thresholds.is_empty() {
        lines.push(String::new());
        lines.push("Thresholds:".to_owned());
        for verdict in &summary.thresholds {
            let mark = paint(
                if verdict.passed { PASS_MARK } else { FAIL_MARK },
                verdict.passed,
                color,
            );
            lines.push(format!(
                "  {} {} {} (actual {:.2})",
                mark,
                dotted_name(&verdict.metric),
                verdict.expression,
                verdict.actual
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Requests: {} ({} failed)  Iterations: {}  VUs max: {}  Abandoned VUs: {}",
        summary.totals.requests,
        summary.totals.failed_requests,
        summary.totals.iterations,
        summary.totals.vus_max,
        summary.totals.abandoned_vus
    ));
    let verdict = if summary.passed {
        "PASSED"
    } else {
        "FAILED"
    };
    lines.push(format!("Result: {}", paint(verdict, summary.passed, color)));
    lines
}

fn paint(text: &str, passed: bool, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    let tone = if passed { Color::Green } else { Color::Red };
    text.with(tone).to_string()
}

fn dotted_name(name: &str) -> String {
    let dots = NAME_WIDTH.saturating_sub(name.chars().count()).max(2);
    format!("{}{}:", name, ".".repeat(dots))
}

#[expect(
    clippy::float_arithmetic,
    reason = "rates are shown as percentages"
)]
fn metric_cells(metric: &MetricSummary) -> String {
    match metric {
        MetricSummary::Counter(counter) => {
            format!("{:<10} {:.2}/s", counter.count, counter.rate_per_sec)
        }
        MetricSummary::Rate(rate) => format!(
            "{:.2}%  {} / {}",
            rate.rate * 100.0,
            rate.nonzero,
            rate.total
        ),
        MetricSummary::Trend(trend) => format!(
            "avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms p(99)={:.2}ms",
            trend.avg, trend.min, trend.med, trend.max, trend.p90, trend.p95, trend.p99
        ),
    }
}

fn format_duration_ms(duration_ms: u64) -> String {
    let secs = duration_ms.checked_div(1_000).unwrap_or(0);
    let millis = duration_ms.checked_rem(1_000).unwrap_or(0);
    let minutes = secs.checked_div(60).unwrap_or(0);
    let seconds = secs.checked_rem(60).unwrap_or(0);
    if minutes > 0 {
        format!("{}m{}.{:03}s", minutes, seconds, millis)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}
