//! CLI tests for the `scoreboard` binary.
//!
//! Spawns the binary against a temporary data directory and checks JSON
//! output and exit codes.

use std::path::Path;
use std::process::{Command, Output};

use scoreboard::exit_codes;
use serde_json::Value;

fn scoreboard(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scoreboard"))
        .current_dir(root)
        .arg("--config")
        .arg(root.join("scoreboard.toml"))
        .arg("--data-dir")
        .arg(root.join("data"))
        .arg("--json")
        .args(args)
        .output()
        .expect("run scoreboard")
}

fn json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn register_claim_and_inspect() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();

    let ada = scoreboard(root, &["register", "Ada"]);
    assert_eq!(ada.status.code(), Some(exit_codes::OK));
    let ada_id = json(&ada)["id"].as_str().expect("id").to_string();
    assert_eq!(ada_id.len(), 24);
    let bob = scoreboard(root, &["register", "Bob"]);
    assert_eq!(bob.status.code(), Some(exit_codes::OK));

    let claim = scoreboard(root, &["claim", &ada_id]);
    assert_eq!(claim.status.code(), Some(exit_codes::OK));
    let outcome = json(&claim);
    let amount = outcome["amount"].as_u64().expect("amount");
    assert!((1..=10).contains(&amount));
    assert_eq!(outcome["participant"]["score"].as_u64(), Some(amount));
    assert_eq!(outcome["participant"]["rank"].as_u64(), Some(1));
    assert_eq!(outcome["leaderboard"].as_array().map(Vec::len), Some(2));

    let leaderboard = json(&scoreboard(root, &["leaderboard"]));
    assert_eq!(leaderboard[0]["name"], "Ada");
    assert_eq!(leaderboard[0]["rank"], 1);
    assert_eq!(leaderboard[1]["name"], "Bob");
    assert_eq!(leaderboard[1]["rank"], 2);

    let history = json(&scoreboard(root, &["history", &ada_id]));
    let entries = history.as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["participant_name"], "Ada");
    assert_eq!(entries[0]["amount"].as_u64(), Some(amount));

    let verify = scoreboard(root, &["verify"]);
    assert_eq!(verify.status.code(), Some(exit_codes::OK));
    assert_eq!(json(&verify)["awards_checked"], 1);
}

#[test]
fn rejected_input_and_unknown_ids_have_distinct_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();

    assert_eq!(
        scoreboard(root, &["register", "  "]).status.code(),
        Some(exit_codes::REJECTED)
    );
    scoreboard(root, &["register", "Ada"]);
    assert_eq!(
        scoreboard(root, &["register", " Ada "]).status.code(),
        Some(exit_codes::REJECTED)
    );

    let missing = scoreboard(root, &["claim", "ffffffffffffffffffffffff"]);
    assert_eq!(missing.status.code(), Some(exit_codes::NOT_FOUND));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("not found"));
    assert_eq!(
        scoreboard(root, &["history", "nope"]).status.code(),
        Some(exit_codes::REJECTED)
    );
}

#[test]
fn ledger_naming_unknown_participant_is_refused() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();

    let ada = json(&scoreboard(root, &["register", "Ada"]));
    let ada_id = ada["id"].as_str().expect("id").to_string();
    scoreboard(root, &["claim", &ada_id]);

    // An award filed under a participant id that replays onto nobody makes
    // the journal unreadable, so open fails outright.
    let awards_path = root.join("data").join("awards.jsonl");
    let mut awards = std::fs::read_to_string(&awards_path).expect("read awards");
    awards.push_str(
        "{\"id\":\"aaaaaaaaaaaaaaaaaaaaaaaa\",\"participant_id\":\"bbbbbbbbbbbbbbbbbbbbbbbb\",\"amount\":3,\"awarded_at\":\"2024-01-01T00:00:00Z\"}\n",
    );
    std::fs::write(&awards_path, awards).expect("write awards");

    let verify = scoreboard(root, &["verify"]);
    assert_eq!(verify.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&verify.stderr).contains("unknown participant"));
}

#[test]
fn init_writes_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();

    let first = scoreboard(root, &["init"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    let written = std::fs::read_to_string(root.join("scoreboard.toml")).expect("config");
    assert!(written.contains("[storage]"));
    assert!(written.contains("[server]"));

    let second = scoreboard(root, &["init"]);
    assert!(String::from_utf8_lossy(&second.stdout).contains("already exists"));
}

#[test]
fn commands_refuse_a_data_dir_held_by_another_process() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let held = scoreboard::Scoreboard::open(&scoreboard::test_support::storage_config(root))
        .expect("hold data dir");

    let register = scoreboard(root, &["register", "Ada"]);
    assert_eq!(register.status.code(), Some(exit_codes::FAILED));
    assert!(String::from_utf8_lossy(&register.stderr).contains("in use by another scoreboard process"));
    assert!(held.leaderboard().is_empty());

    drop(held);
    assert_eq!(
        scoreboard(root, &["register", "Ada"]).status.code(),
        Some(exit_codes::OK)
    );
}
