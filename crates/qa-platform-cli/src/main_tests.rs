// crates/qa-platform-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, bounded reads and fixtures.
// Purpose: Ensure fixture inputs fail closed and seed the configured store.
// Dependencies: qa-platform-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Validates command parsing, `read_bytes_with_limit`, and fixture loading
//! into both store backends.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use qa_platform_core::QuestionId;
use qa_platform_server::open_store;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::FixturesCommand;
use super::FixturesLoadCommand;
use super::ReadLimitError;
use super::build_server;
use super::command_fixtures_load;
use super::load_config;
use super::read_bytes_with_limit;
use super::read_fixture;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const FIXTURE_JSON: &str = r#"{
  "users": [
    {"id": 1, "email": "ann@example.test", "fullName": "Ann", "registeredAt": "2024-01-01T00:00:00Z"},
    {"id": 2, "email": "bob@example.test", "fullName": "Bob", "registeredAt": "2024-01-02T00:00:00Z"}
  ],
  "questions": [
    {"id": 1, "title": "Borrowing", "description": "Why?", "authorId": 1,
     "createdAt": "2024-01-03T00:00:00Z", "tags": [{"name": "rust"}]}
  ],
  "votes": [
    {"questionId": 1, "userId": 2, "vote": "UP_VOTE"},
    {"questionId": 1, "userId": 2, "vote": "DOWN_VOTE"}
  ]
}"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn sqlite_config(dir: &Path) -> PathBuf {
    let db = dir.join("data").join("forum.sqlite");
    let toml = format!(
        "[server.audit]\nsink = \"none\"\n\n[[auth.tokens]]\ntoken = \"t-1\"\nuser_id = 1\n\n\
         [store]\ntype = \"sqlite\"\npath = \"{}\"\n",
        db.display()
    );
    write_file(dir, "qa-platform.toml", &toml)
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parses_fixture_load_arguments() {
    let cli = Cli::try_parse_from([
        "qa-platform",
        "fixtures",
        "load",
        "--file",
        "seed.json",
        "--config",
        "qa.toml",
    ])
    .unwrap();
    let Some(Commands::Fixtures {
        command: FixturesCommand::Load(command),
    }) = cli.command
    else {
        panic!("expected fixtures load");
    };
    assert_eq!(command.file, PathBuf::from("seed.json"));
    assert_eq!(command.config, Some(PathBuf::from("qa.toml")));
}

#[test]
fn parses_serve_and_config_validate() {
    let serve = Cli::try_parse_from(["qa-platform", "serve", "--fixtures", "seed.json"]).unwrap();
    assert!(matches!(serve.command, Some(Commands::Serve(ref command)) if command.config.is_none()));
    let validate = Cli::try_parse_from(["qa-platform", "config", "validate"]).unwrap();
    assert!(matches!(
        validate.command,
        Some(Commands::Config {
            command: ConfigCommand::Validate(_)
        })
    ));
    assert!(Cli::try_parse_from(["qa-platform", "fixtures", "load"]).is_err());
}

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_bytes_with_limit_rejects_oversized_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "big.json", "0123456789");
    let err = read_bytes_with_limit(&path, 4).unwrap_err();
    assert!(matches!(err, ReadLimitError::TooLarge { size: 10, limit: 4 }));
    assert_eq!(read_bytes_with_limit(&path, 10).unwrap().len(), 10);
}

#[test]
fn read_fixture_reports_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bad.json", "{\"users\": 3}");
    let err = read_fixture(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse fixture"));
    let missing = read_fixture(&dir.path().join("absent.json")).unwrap_err();
    assert!(missing.to_string().contains("failed to read fixture"));
}

// ============================================================================
// SECTION: Fixture Loading
// ============================================================================

#[test]
fn fixtures_load_persists_into_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(dir.path());
    let fixture_path = write_file(dir.path(), "seed.json", FIXTURE_JSON);
    let command = FixturesLoadCommand {
        file: fixture_path,
        config: Some(config_path.clone()),
    };
    assert!(command_fixtures_load(&command).is_ok());

    let config = load_config(Some(&config_path)).unwrap();
    let store = open_store(&config.store).unwrap();
    assert_eq!(store.question_count().unwrap(), 1);
    assert_eq!(store.vote_sum(QuestionId::from_raw(1).unwrap()).unwrap(), 1);
}

#[test]
fn serve_fixtures_seed_memory_store() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_file(
        dir.path(),
        "memory.toml",
        "[server.audit]\nsink = \"none\"\n\n[[auth.tokens]]\ntoken = \"t-1\"\nuser_id = 1\n",
    );
    let fixture_path = write_file(dir.path(), "seed.json", FIXTURE_JSON);
    let config = load_config(Some(&config_path)).unwrap();
    let fixture = read_fixture(&fixture_path).unwrap();
    let server = build_server(config, Some(fixture)).unwrap();
    assert_eq!(server.state().service().question_count().unwrap(), 1);
}

#[test]
fn failed_fixture_load_reports_kept_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(dir.path());
    let broken = r#"{
      "users": [
        {"id": 1, "email": "ann@example.test", "fullName": "Ann", "registeredAt": "2024-01-01T00:00:00Z"}
      ],
      "questions": [
        {"id": 1, "title": "Kept", "description": "?", "authorId": 1, "createdAt": "2024-01-03T00:00:00Z", "tags": []},
        {"id": 2, "title": "Orphan", "description": "?", "authorId": 9, "createdAt": "2024-01-03T00:00:00Z", "tags": []}
      ]
    }"#;
    let command = FixturesLoadCommand {
        file: write_file(dir.path(), "broken.json", broken),
        config: Some(config_path.clone()),
    };
    let err = command_fixtures_load(&command).unwrap_err();
    assert!(err.to_string().contains("rows before the failure were kept"));

    let config = load_config(Some(&config_path)).unwrap();
    let store = open_store(&config.store).unwrap();
    assert_eq!(store.question_count().unwrap(), 1);
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_file(dir.path(), "empty.toml", "");
    let err = load_config(Some(&config_path)).unwrap_err();
    assert!(err.to_string().contains("auth requires at least one token"));
}
