use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::tempdir;

fn outbreak() -> Command {
    Command::cargo_bin("outbreak").unwrap()
}

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[test]
fn prints_final_summary() {
    let output = outbreak()
        .args(["--no-reports", "--horizon", "30", "--population", "500"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("day 30:"), "unexpected output: {stdout}");
}

#[test]
fn writes_reports() {
    let dir = tempdir().unwrap();
    outbreak()
        .args(["--horizon", "20", "--random-seed", "4", "--file-prefix", "cli_"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success();

    let daily = fs::read_to_string(dir.path().join("cli_daily_counts.csv")).unwrap();
    let mut lines = daily.lines();
    assert_eq!(
        lines.next(),
        Some("day,new_infections,total_infected,currently_infected,recovered,deaths")
    );
    assert_eq!(lines.count(), 21);
    assert!(dir.path().join("cli_resolutions.csv").exists());
}

#[test]
fn refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let run = |force: bool| {
        let mut command = outbreak();
        command.args(["--horizon", "5"]).arg("--output-dir").arg(dir.path());
        if force {
            command.arg("--force-overwrite");
        }
        command.assert()
    };
    run(false).success();
    run(false).failure();
    run(true).success();
}

#[test]
fn loads_config_file() {
    outbreak()
        .args(["--no-reports", "--horizon", "10"])
        .arg("--config")
        .arg(data_file("covid19.json"))
        .assert()
        .success();
}

#[test]
fn rejects_invalid_config() {
    let output = outbreak()
        .args(["--no-reports", "--horizon", "10"])
        .arg("--config")
        .arg(data_file("invalid_fractions.json"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("percent_mild + percent_severe"), "{stderr}");
}

#[test]
fn accepts_module_log_levels() {
    outbreak()
        .args([
            "--no-reports",
            "--horizon",
            "10",
            "--log-level",
            "outbreak::spread=debug,outbreak::clock=info",
        ])
        .assert()
        .success();
}
