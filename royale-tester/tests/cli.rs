use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "royale-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_royale-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args(["--report", "json", "--seeds", "1,2", "--iterations", "2", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(value["summary"]["matches"], 4);
}

#[test]
fn cli_prints_console_report() {
    let exe = env!("CARGO_BIN_EXE_royale-tester");
    let output = Command::new(exe)
        .args(["--seeds", "99", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Royale Batch Tester"));
    assert!(stdout.contains("Leaderboard"));
}

#[test]
fn cli_rejects_missing_roster_file() {
    let exe = env!("CARGO_BIN_EXE_royale-tester");
    let output = Command::new(exe)
        .args(["--roster", "/no/such/roster.json", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/no/such/roster.json"));
}

#[test]
fn cli_rejects_invalid_seed() {
    let exe = env!("CARGO_BIN_EXE_royale-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
