use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Short dwell keeps replay traces small.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[analyzer]
sensitivity = "medium"
time_threshold_s = 1.0

[runner]
sample_rate_hz = 20
# no reminders in test output
announce_interval_s = 0.0
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

// Stationary subject sampled every 100 ms for `secs` seconds.
fn write_still_trace(dir: &tempfile::TempDir, secs: u64) -> PathBuf {
    let path = dir.path().join("trace.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "t_ms,x,y").unwrap();
    for t in (0..=secs * 1000).step_by(100) {
        writeln!(f, "{t},320.0,240.0").unwrap();
    }
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["health"], 0, "ok", "stdout")]
#[case(&["presets"], 0, "mri-skull", "stdout")]
#[case(&["self-check"], 0, "OK:", "stdout")]
#[case(&["teleport"], 2, "unrecognized subcommand", "stderr")]
#[case(&["replay"], 2, "--trace", "stderr")]
#[case(&["--procedure", "dental", "self-check"], 4, "Invalid configuration", "stderr")]
#[case(&["replay", "--trace", "/definitely/not/here.csv"], 4, "trace could not be loaded", "stderr")]
#[case(&["simulate", "--seconds", "0.2", "--jitter-px=-1"], 4, "simulated source", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("steady").unwrap();

    // Always include a valid config to avoid relying on defaults
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn invalid_config_file_exits_with_config_code() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[analyzer]\ntime_threshold_s = -1.0\n").unwrap();

    let mut cmd = Command::cargo_bin("steady").unwrap();
    cmd.arg("--config").arg(&cfg).arg("self-check");
    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("time_threshold_s must be > 0"));
}

#[rstest]
fn missing_config_file_is_reported() {
    let mut cmd = Command::cargo_bin("steady").unwrap();
    cmd.arg("--config")
        .arg("/definitely/not/here.toml")
        .arg("self-check");
    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("Could not read config file"));
}

#[rstest]
fn replay_announces_ready_and_session() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_still_trace(&dir, 4);

    let mut cmd = Command::cargo_bin("steady").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--trace")
        .arg(&trace)
        .arg("--start-at-ms")
        .arg("2500")
        .arg("--stop-at-ms")
        .arg("3500");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("BecameReady"))
        .stdout(predicate::str::contains("Procedure started."))
        .stdout(predicate::str::contains("Procedure complete after 1.0 seconds."))
        .stdout(predicate::str::contains("Verdict: ready"));
}

#[rstest]
fn stop_without_active_session_is_an_intent_error() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_still_trace(&dir, 2);

    let mut cmd = Command::cargo_bin("steady").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--trace")
        .arg(&trace)
        .arg("--stop-at-ms")
        .arg("500");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("no procedure is active"));
}

#[rstest]
fn early_start_needs_confirmation_unless_forced() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_still_trace(&dir, 2);

    let mut cmd = Command::cargo_bin("steady").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--trace")
        .arg(&trace)
        .arg("--start-at-ms")
        .arg("200");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("NeedsConfirmation"))
        .stdout(predicate::str::contains("Session: idle"));

    let mut forced = Command::cargo_bin("steady").unwrap();
    forced
        .arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--trace")
        .arg(&trace)
        .arg("--start-at-ms")
        .arg("200")
        .arg("--force-start");
    forced
        .assert()
        .success()
        .stdout(predicate::str::contains("SessionStarted"))
        .stdout(predicate::str::contains("Session: active"));
}

#[rstest]
fn short_simulation_prints_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("steady").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .arg("--seconds")
        .arg("0.3")
        .arg("--jitter-px")
        .arg("0");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Stability summary"))
        .stdout(predicate::str::contains("Frames:"));
}
