mod support;

use std::fs;
use std::time::{Duration, Instant};

use tempfile::tempdir;

use support::{
    free_local_addr, http_get, run_loadpulse, spawn_http_server, spawn_loadpulse,
    wait_for_listener,
};

fn describe(output: &std::process::Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn parse_report(stdout: &[u8]) -> Result<serde_json::Value, String> {
    serde_json::from_slice(stdout).map_err(|err| format!("stdout is not JSON: {}", err))
}

#[test]
fn e2e_cli_run_writes_all_outputs() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let csv_path = dir.path().join("out").join("metrics.csv");
    let json_path = dir.path().join("report.json");
    let csv_arg = csv_path.to_string_lossy().into_owned();
    let json_arg = json_path.to_string_lossy().into_owned();

    let output = run_loadpulse(
        dir.path(),
        [
            "-u",
            url.as_str(),
            "-r",
            "5",
            "-t",
            "1",
            "--output-format",
            "json",
            "--csv",
            csv_arg.as_str(),
            "--json",
            json_arg.as_str(),
        ],
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let report = parse_report(&output.stdout)?;
    if report.get("total_requests").and_then(serde_json::Value::as_u64) != Some(5) {
        return Err(format!("Unexpected report: {}", report));
    }
    let ok_count = report
        .get("status_metrics")
        .and_then(|metrics| metrics.get("200"))
        .and_then(|status| status.get("count"))
        .and_then(serde_json::Value::as_u64);
    if ok_count != Some(5) {
        return Err(format!("Unexpected status metrics: {}", report));
    }

    let csv = fs::read_to_string(&csv_path).map_err(|err| format!("read csv failed: {}", err))?;
    if csv.lines().count() != 1 || !csv.contains(",5,") {
        return Err(format!("Unexpected CSV: {}", csv));
    }
    let json = fs::read_to_string(&json_path).map_err(|err| format!("read json failed: {}", err))?;
    let file_report: serde_json::Value =
        serde_json::from_str(&json).map_err(|err| format!("json file invalid: {}", err))?;
    if file_report.get("url") != report.get("url") {
        return Err("JSON file and stdout disagree".to_owned());
    }
    Ok(())
}

#[test]
fn e2e_cli_counts_server_errors_as_completed() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let target = format!("{}/fail", url);

    let output = run_loadpulse(
        dir.path(),
        ["-u", target.as_str(), "-r", "3", "-t", "1", "--output-format", "json"],
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let report = parse_report(&output.stdout)?;
    if report.get("error_rate").and_then(serde_json::Value::as_f64) != Some(0.0) {
        return Err(format!("5xx must not count as errors: {}", report));
    }
    if report
        .get("status_metrics")
        .and_then(|metrics| metrics.get("500"))
        .is_none()
    {
        return Err(format!("Missing 500 bucket: {}", report));
    }
    Ok(())
}

#[test]
fn e2e_cli_reports_unreachable_target() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let target = format!("http://{}/", free_local_addr()?);

    let output = run_loadpulse(
        dir.path(),
        [
            "-u",
            target.as_str(),
            "-r",
            "2",
            "-t",
            "1",
            "--timeout",
            "2s",
            "--output-format",
            "json",
        ],
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let report = parse_report(&output.stdout)?;
    if report.get("error_rate").and_then(serde_json::Value::as_f64) != Some(100.0) {
        return Err(format!("Expected every request to fail: {}", report));
    }
    if report.get("min_latency").and_then(serde_json::Value::as_str) != Some("0s") {
        return Err(format!("Expected zero latencies: {}", report));
    }
    Ok(())
}

#[test]
fn e2e_cli_rejects_invalid_parameters() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    for args in [
        vec!["-u", "http://127.0.0.1:9/", "-r", "0"],
        vec!["-u", "http://127.0.0.1:9/", "-r", "1", "-t", "0"],
        vec!["-u", "notaurl", "-r", "1"],
        vec!["-r", "1"],
    ] {
        let output = run_loadpulse(dir.path(), &args)?;
        if output.status.success() {
            return Err(format!("Expected {:?} to fail: {}", args, describe(&output)));
        }
    }
    Ok(())
}

#[test]
fn e2e_cli_reads_config_file() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = format!(
        "url = \"{}\"\nrate = 4\nduration = 1\nstrategy = \"paced\"\nworkers = 2\noutput_format = \"json\"\n",
        url
    );
    fs::write(dir.path().join("loadpulse.toml"), config)
        .map_err(|err| format!("write config failed: {}", err))?;

    let output = run_loadpulse(dir.path(), ["--config", "loadpulse.toml"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let report = parse_report(&output.stdout)?;
    if report.get("total_requests").and_then(serde_json::Value::as_u64) != Some(4) {
        return Err(format!("Unexpected report: {}", report));
    }
    Ok(())
}

#[test]
fn e2e_serve_runs_load_tests_on_request() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let listen = free_local_addr()?;
    let mut child = spawn_loadpulse(dir.path(), ["serve", "--listen", listen.as_str()])?;

    let result = (|| {
        wait_for_listener(&listen, Duration::from_secs(10))?;

        let target = format!("/loadtest?url={}/&rps=2&duration=1", url);
        let (status, body) = http_get(&listen, &target)?;
        if status != 200 {
            return Err(format!("Expected 200, got {}: {}", status, body));
        }
        let report: serde_json::Value =
            serde_json::from_str(&body).map_err(|err| format!("invalid JSON: {}", err))?;
        if report.get("total_requests").and_then(serde_json::Value::as_u64) != Some(2) {
            return Err(format!("Unexpected report: {}", report));
        }

        let (status, body) = http_get(&listen, "/loadtest?url=x&rps=1&duration=1")?;
        if status != 400 {
            return Err(format!("Expected 400, got {}: {}", status, body));
        }

        let csv = fs::read_to_string(dir.path().join("metrics.csv"))
            .map_err(|err| format!("read metrics.csv failed: {}", err))?;
        if csv.lines().count() != 1 {
            return Err(format!("Expected one CSV row, got:\n{}", csv));
        }
        Ok(())
    })();

    drop(child.kill());
    drop(child.wait());
    result
}

#[cfg(unix)]
#[test]
fn e2e_serve_exits_on_sigterm() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let listen = free_local_addr()?;
    let mut child = spawn_loadpulse(
        dir.path(),
        ["serve", "--listen", listen.as_str(), "--shutdown-grace", "1s"],
    )?;
    wait_for_listener(&listen, Duration::from_secs(10))?;

    let signalled = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .map_err(|err| format!("kill failed: {}", err))?;
    if !signalled.success() {
        drop(child.kill());
        return Err("Failed to send SIGTERM".to_owned());
    }

    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(10) {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => return Err(format!("Server exited with {}", status)),
            Ok(None) => std::thread::sleep(Duration::from_millis(50)),
            Err(err) => return Err(format!("try_wait failed: {}", err)),
        }
    }
    drop(child.kill());
    Err("Server did not exit after SIGTERM".to_owned())
}
