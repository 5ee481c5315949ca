//! Integration tests for the lottery CLI
//!
//! These tests invoke the actual `lottery` binary and verify:
//! - Exit codes (0 = success, 1 = a scenario step failed, 2 = error)
//! - stdout/stderr output
//! - JSON report format

use std::path::PathBuf;
use std::process::Command;

// ── Helpers ───────────────────────────────────────────────

fn lottery_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lottery"))
}

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(format!("../../tests/fixtures/scenarios/{}", name))
}

fn config(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(format!("../../tests/fixtures/configs/{}", name))
}

fn run_lottery(args: &[&str]) -> std::process::Output {
    Command::new(lottery_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to execute lottery")
}

fn run_json(name: &str, extra: &[&str]) -> (Option<i32>, serde_json::Value) {
    let path = scenario(name);
    let mut args = vec!["run", "--json", "--seed", "42", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    let output = run_lottery(&args);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json = serde_json::from_str(&stdout).expect("should be valid JSON");
    (output.status.code(), json)
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_lottery(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lottery"), "should contain 'lottery'");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "should contain version"
    );
}

#[test]
fn test_version_flag() {
    let output = run_lottery(&["--version"]);
    assert!(output.status.success(), "--version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "should contain version"
    );
}

// ── Run ───────────────────────────────────────────────────

#[test]
fn test_run_deploys_contract() {
    let (code, json) = run_json("one-entry.json", &[]);
    assert_eq!(code, Some(0));
    let contract = json["contract"].as_str().expect("contract address");
    assert!(contract.starts_with("0x"));
    assert_eq!(contract.len(), 42);
    assert_ne!(json["contract"], json["manager"]);
}

#[test]
fn test_run_one_account_enters() {
    let (code, json) = run_json("one-entry.json", &[]);
    assert_eq!(code, Some(0), "successful scenario should exit 0");
    assert_eq!(json["success"], true);
    let players = json["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0], json["manager"]);
}

#[test]
fn test_run_multiple_accounts_enter() {
    let (code, json) = run_json("multiple-entries.json", &[]);
    assert_eq!(code, Some(0));
    let players = json["players"].as_array().unwrap();
    assert_eq!(players.len(), 3);
    assert_eq!(json["results"][3]["players"], json["players"]);

    let entrants: Vec<&serde_json::Value> = (0..3).map(|i| &json["results"][i]["from"]).collect();
    for (i, entrant) in entrants.iter().enumerate() {
        assert_eq!(**entrant, players[i], "players must follow entry order");
    }
    assert_eq!(json["contract_balance"], "0.06 ether");
}

#[test]
fn test_run_requires_minimum_stake() {
    let (code, json) = run_json("minimum-stake.json", &[]);
    assert_eq!(code, Some(1), "failed step should exit 1");
    assert_eq!(json["success"], false);
    assert_eq!(json["results"][0]["error_kind"], "InsufficientStake");
    assert!(json["players"].as_array().unwrap().is_empty());
    assert_eq!(json["contract_balance"], "0 ether");
}

#[test]
fn test_run_unauthorized_pick_winner() {
    let (code, json) = run_json("unauthorized.json", &[]);
    assert_eq!(code, Some(1));
    assert_eq!(json["results"][1]["error_kind"], "Unauthorized");
    assert_eq!(json["players"].as_array().unwrap().len(), 1);
    assert_eq!(json["contract_balance"], "0.02 ether");
}

#[test]
fn test_run_settles_round() {
    let (code, json) = run_json("settle-round.json", &[]);
    assert_eq!(code, Some(0));
    let settled = &json["results"][2];
    assert_eq!(settled["prize"], "0.04 ether");
    let winner = settled["winner"].as_str().unwrap();
    let first = json["results"][0]["from"].as_str().unwrap();
    let second = json["results"][1]["from"].as_str().unwrap();
    assert!(winner == first || winner == second);

    assert!(json["results"][3]["players"].as_array().unwrap().is_empty());
    assert_eq!(json["contract_balance"], "0 ether");
}

#[test]
fn test_run_same_seed_same_report() {
    let (_, first) = run_json("settle-round.json", &[]);
    for _ in 0..5 {
        let (_, again) = run_json("settle-round.json", &[]);
        assert_eq!(first, again, "seeded runs must be deterministic");
    }
}

#[test]
fn test_run_with_config() {
    let cfg = config("high-minimum.toml");
    let (code, json) = run_json("one-entry.json", &["--config", cfg.to_str().unwrap()]);
    assert_eq!(code, Some(1), "0.02 ether is below a 1 ether minimum");
    assert_eq!(json["results"][0]["error_kind"], "InsufficientStake");
    assert_eq!(json["balances"].as_object().unwrap().len(), 4);
}

#[test]
fn test_run_invalid_config() {
    let cfg = config("invalid.toml");
    let output = run_lottery(&[
        "run",
        "--config",
        cfg.to_str().unwrap(),
        scenario("one-entry.json").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(2), "bad config should exit 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "should mention error");
}

#[test]
fn test_run_malformed_scenario() {
    let output = run_lottery(&["run", scenario("malformed.json").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2), "malformed JSON should exit 2");
}

#[test]
fn test_run_nonexistent_file() {
    let output = run_lottery(&["run", "nonexistent.json"]);
    assert_eq!(output.status.code(), Some(2), "missing file should exit 2");
}

#[test]
fn test_run_human_output() {
    let output = run_lottery(&[
        "run",
        "--seed",
        "1",
        scenario("multiple-entries.json").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Contract"), "should show contract");
    assert!(stdout.contains("Players: 3"), "should count players");
    assert!(stdout.contains("scenario completed"));
}

#[test]
fn test_run_quiet() {
    let output = run_lottery(&[
        "--quiet",
        "run",
        scenario("one-entry.json").to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.is_empty(), "quiet mode should produce no stdout");
}

#[test]
fn test_run_quiet_keeps_exit_code() {
    let output = run_lottery(&[
        "--quiet",
        "run",
        scenario("unauthorized.json").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
}

// ── Accounts ──────────────────────────────────────────────

#[test]
fn test_accounts_json() {
    let output = run_lottery(&["accounts", "--json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("should be valid JSON");
    let accounts = json.as_array().unwrap();
    assert_eq!(accounts.len(), 10);
    assert_eq!(accounts[0]["index"], 0);
    assert_eq!(accounts[0]["balance"], "1000 ether");
}

#[test]
fn test_accounts_match_run_manager() {
    let output = run_lottery(&["accounts", "--json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let accounts: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let (_, report) = run_json("one-entry.json", &[]);
    assert_eq!(accounts[0]["address"], report["manager"]);
}

#[test]
fn test_accounts_human_output() {
    let output = run_lottery(&["accounts"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 10);
    assert!(stdout.contains("manager"));
}

// ── Init ──────────────────────────────────────────────────

#[test]
fn test_init_creates_scenario() {
    let temp_dir = std::env::temp_dir().join("lottery_test_init");
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir).expect("create temp dir");

    let output = Command::new(lottery_bin())
        .args(["init", "weekly"])
        .current_dir(&temp_dir)
        .output()
        .expect("run init");
    assert!(output.status.success(), "init should exit 0");

    let file = temp_dir.join("weekly.json");
    assert!(file.exists(), "should create .json file");

    let run = Command::new(lottery_bin())
        .args(["run", "--json", "--seed", "3", "weekly.json"])
        .current_dir(&temp_dir)
        .output()
        .expect("run scaffolded scenario");
    assert!(run.status.success(), "starter scenario should run cleanly");

    let again = Command::new(lottery_bin())
        .args(["init", "weekly"])
        .current_dir(&temp_dir)
        .output()
        .expect("run init twice");
    assert_eq!(again.status.code(), Some(2), "init must not overwrite");

    let _ = std::fs::remove_dir_all(&temp_dir);
}
