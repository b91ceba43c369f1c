
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

use tempfile::tempdir;

use support_single::{run_surge, spawn_http_server_or_skip, write_scenario};

fn scenario(url: &str, predicate: &str, threshold: &str) -> String {
    format!(
        r#"base_url = "{url}"
vus = 2
duration = "1s"

[options]
tick = "20ms"
grace_period = "2s"

[[steps]]
name = "Homepage"
path = "/"
think_time_ms = 50

[[steps.checks]]
name = "Homepage check"
predicate = "{predicate}"

[[steps]]
name = "Static asset"
path = "/static/main.css"
headers = ["Accept: text/css"]
think_time_ms = {{ min = 10, max = 40 }}

[[steps.checks]]
name = "Static asset has cache headers"
predicate = "header(Cache-Control)"

[thresholds]
http_req_duration = ["p(95)<5000"]
errors = ["{threshold}"]
"#
    )
}

fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn run_scenario(dir: &Path, contents: &str, summary: &Path) -> Result<Output, String> {
    let config = write_scenario(dir, "surge.toml", contents)?;
    run_surge([
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--summary-export"),
        summary.as_os_str(),
        OsStr::new("--no-color"),
    ])
}

#[test]
fn e2e_passing_thresholds_exit_zero() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let summary_path = dir.path().join("summary.json");

    let output = run_scenario(
        dir.path(),
        &scenario(&url, "status == 200", "rate<0.1"),
        &summary_path,
    )?;
    if output.status.code() != Some(0) {
        return Err(describe(&output));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for expected in ["http_req_duration", "errors", "✓", "PASSED"] {
        if !stdout.contains(expected) {
            return Err(format!("Table is missing '{}'\n{}", expected, describe(&output)));
        }
    }

    let raw = std::fs::read_to_string(&summary_path)
        .map_err(|err| format!("read summary failed: {}", err))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|err| format!("parse summary failed: {}", err))?;
    if value.get("passed") != Some(&serde_json::Value::Bool(true)) {
        return Err(format!("Summary should record a pass: {}", raw));
    }
    let requests = value
        .get("totals")
        .and_then(|totals| totals.get("requests"))
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);
    if requests == 0 {
        return Err(format!("Summary should count requests: {}", raw));
    }
    Ok(())
}

#[test]
fn e2e_failing_threshold_exits_99() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip()? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let summary_path = dir.path().join("summary.json");

    let output = run_scenario(
        dir.path(),
        &scenario(&url, "status == 201", "rate<0.1"),
        &summary_path,
    )?;
    if output.status.code() != Some(99) {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("✗") || !stdout.contains("FAILED") {
        return Err(format!("Expected a failed threshold row\n{}", describe(&output)));
    }
    if !summary_path.exists() {
        return Err("Summary should be written for failing runs".to_owned());
    }
    Ok(())
}

#[test]
fn e2e_malformed_scenario_exits_104() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let summary_path = dir.path().join("summary.json");

    let negative = "base_url = \"http://127.0.0.1:9\"\n\n[[stages]]\nduration = \"10s\"\ntarget = -1\n\n[[steps]]\npath = \"/\"\n";
    let output = run_scenario(dir.path(), negative, &summary_path)?;
    if output.status.code() != Some(104) {
        return Err(describe(&output));
    }

    let output = run_scenario(dir.path(), "stages = [", &summary_path)?;
    if output.status.code() != Some(104) {
        return Err(describe(&output));
    }

    let unknown_metric = scenario("http://127.0.0.1:9", "status == 200", "rate<0.1")
        .replace("errors = [", "login_errors = [");
    let output = run_scenario(dir.path(), &unknown_metric, &summary_path)?;
    if output.status.code() != Some(104) {
        return Err(describe(&output));
    }
    if summary_path.exists() {
        return Err("No summary should be written before a run starts".to_owned());
    }
    Ok(())
}
