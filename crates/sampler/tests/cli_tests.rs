//! CLI integration tests

use std::process::Command;

/// Test that the sampler shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "churn-sampler", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Sampler help should succeed");
    assert!(
        stdout.contains("Inference sampler for churn model monitoring"),
        "Should show description"
    );
    assert!(stdout.contains("--prediction-url"), "Should show prediction URL flag");
    assert!(stdout.contains("--exporter-url"), "Should show exporter URL flag");
    assert!(stdout.contains("--max-cycles"), "Should show bounded run flag");
}

/// Test that the sampler shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "churn-sampler", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Sampler version should succeed");
    assert!(stdout.contains("churn-sampler"), "Should show binary name");
}

/// Test that missing datasets fail fast with a non-zero exit code
#[test]
fn test_missing_dataset_fails() {
    let output = Command::new("cargo")
        .args([
            "run",
            "-p",
            "churn-sampler",
            "--",
            "--raw-data",
            "/nonexistent/raw.csv",
            "--processed-data",
            "/nonexistent/processed.csv",
            "--max-cycles",
            "1",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Missing datasets should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to load sample datasets"),
        "Should explain the failure"
    );
}
