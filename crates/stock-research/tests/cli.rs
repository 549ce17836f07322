//! Command-line behavior that needs no network

use std::process::{Command, Output, Stdio};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stock-research"))
        .args(args)
        .current_dir(std::env::temp_dir())
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

#[test]
fn test_missing_api_key_fails_before_the_form() {
    let output = run(&[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("OPENAI_API_KEY not found. Check your .env file"));
    assert!(!stdout.contains("Select a company"));
    assert!(!stderr.contains("An error occurred during research"));
}

#[test]
fn test_list_companies_needs_no_configuration() {
    let output = run(&["--list-companies"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Apple Inc."));
    assert!(stdout.contains("TWTR"));
}
