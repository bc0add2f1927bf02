use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Fast timers so sequences finish in well under a second
fn write_fast_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sampling]
sweep_interval_ms = 5
period_interval_ms = 10
countdown_interval_ms = 10
countdown_s = 1

[logging]
level = "warn"
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn sampler() -> Command {
    let mut cmd = Command::cargo_bin("sampler").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("SAMPLER_SIM_UNPLUGGED")
        .env_remove("SAMPLER_SIM_GLITCH_EVERY");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["sweep", "--duration-ms", "50"], 0, "Run finished", "stdout")]
#[case(&["sweep", "--duration-ms", "30", "--throttle", "20"], 0, "thrust", "stdout")]
#[case(&["sweep", "--duration-ms", "30", "--throttle", "80"], 2, "out of range", "stderr")]
#[case(&["period", "--period-ms", "20", "--steps", "2"], 0, "Sampling by step done", "stdout")]
#[case(&["period", "--period-ms", "20", "--steps", "0"], 2, "Invalid values", "stderr")]
#[case(&["period", "--period-ms", "-5", "--steps", "3"], 2, "Invalid values", "stdout")]
#[case(&["self-check"], 0, "Link ok", "stdout")]
#[case(&["sweep"], 2, "required", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let mut cmd = sampler();
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

#[test]
fn period_runs_countdown_then_steps_in_order() {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let out = sampler()
        .arg("--config")
        .arg(&cfg)
        .args(["period", "--period-ms", "20", "--steps", "3", "--countdown", "2"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();

    let order = [
        "Countdown begin at: 2 seconds",
        "Countdown: 1 seconds",
        "Countdown: 0 seconds",
        "Sampling by step begin. Throttle at: 0",
        "Step change. Throttle at: 32",
        "Step change. Throttle at: 65",
        "Sampling by step done",
        "throttle steps: 0, 0, 32.5, 65",
    ];
    let mut from = 0;
    for needle in order {
        let at = stdout[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("missing {needle:?} after byte {from}:\n{stdout}"));
        from += at + needle.len();
    }
}

#[test]
fn unplugged_bench_exits_with_connectivity_code() {
    sampler()
        .env("SAMPLER_SIM_UNPLUGGED", "1")
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Connection error"));
}

#[test]
fn json_errors_are_structured() {
    let out = sampler()
        .env("SAMPLER_SIM_UNPLUGGED", "1")
        .args(["--json", "self-check"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .expect("json error line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "Connectivity");
    assert_eq!(v["exit_code"], 3);
}

#[test]
fn garbled_lines_are_reported_and_skipped() {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);
    sampler()
        .env("SAMPLER_SIM_GLITCH_EVERY", "3")
        .arg("--config")
        .arg(&cfg)
        .args(["sweep", "--duration-ms", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped malformed line"))
        .stdout(predicate::str::contains("Run finished"));
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sampling]\nsweep_interval_ms = 0\n").unwrap();

    sampler()
        .arg("--config")
        .arg(&path)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sweep_interval_ms"));
}

#[test]
fn unparsable_config_is_a_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sampling\n").unwrap();

    sampler()
        .arg("--config")
        .arg(&path)
        .arg("self-check")
        .assert()
        .code(2);
}

#[test]
fn decode_prints_json_samples() {
    let dir = tempdir().unwrap();
    let rec = dir.path().join("run.txt");
    fs::write(
        &rec,
        "boot\nHX7T 0 0.5 0 10 0\nHX7M 1 0.02 0 20 0\nHX7M 2 0.04 0 30 0\nRPMp 0 oops 0 40 0\n",
    )
    .unwrap();

    let out = sampler()
        .arg("--json")
        .arg("decode")
        .arg(&rec)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let values: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["channel"], "thrust");
    assert_eq!(values[1]["channel"], "torque");
    assert_eq!(values[1]["timestamp_ms"], 25);
    assert_eq!(values[2]["decoded"], 2);
    assert_eq!(values[2]["malformed"], 1);

    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("skipped"));
}

#[test]
fn decode_reads_stdin() {
    assert_cmd::Command::cargo_bin("sampler")
        .unwrap()
        .arg("decode")
        .write_stdin("HX7T 0 1.25 0 7 0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Decoded 1 samples, 0 malformed"));
}

#[test]
fn transcript_file_collects_the_run() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("transcript.txt");
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        format!(
            "[sampling]\nsweep_interval_ms = 5\n\n[transcript]\nfile = {:?}\n",
            log.display().to_string()
        ),
    )
    .unwrap();

    sampler()
        .arg("--config")
        .arg(&cfg)
        .args(["--quiet", "sweep", "--duration-ms", "40"])
        .assert()
        .success();

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.lines().any(|l| l.starts_with("HX7T")), "{text}");
}
