//! Integration tests for the sitepress CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// Helper to create a sitepress Command
fn sitepress() -> Command {
    cargo_bin_cmd!("sitepress")
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        sitepress().arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        sitepress().arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_command_fails() {
        sitepress().arg("publish").assert().failure();
    }
}

// =============================================================================
// Flatten / Unflatten
// =============================================================================

mod transform {
    use super::*;

    #[test]
    fn test_flatten_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("page.json");
        fs::write(
            &file,
            r#"{"author": {"first": "Ada"}, "tags": [{"name": "x"}, {"name": "y"}], "empty": []}"#,
        )
        .unwrap();

        let output = sitepress().arg("flatten").arg(&file).output().unwrap();
        assert!(output.status.success());
        assert_eq!(
            stdout_json(&output.stdout),
            json!({"author.first": "Ada", "tags.0.name": "x", "tags.1.name": "y"})
        );
    }

    #[test]
    fn test_flatten_stdin() {
        let output = sitepress()
            .arg("flatten")
            .write_stdin(r#"{"items": ["a", "b", "c"]}"#)
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(
            stdout_json(&output.stdout),
            json!({"items.0": "a", "items.1": "b", "items.2": "c"})
        );
    }

    #[test]
    fn test_flatten_invalid_json_fails() {
        sitepress()
            .arg("flatten")
            .write_stdin("{nope")
            .assert()
            .failure()
            .stderr(predicate::str::contains("not valid JSON"));
    }

    #[test]
    fn test_unflatten_json_object() {
        let output = sitepress()
            .arg("unflatten")
            .write_stdin(r#"{"tags.0.name": "x", "tags.1.name": "y", "title": "Hello"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(
            stdout_json(&output.stdout),
            json!({"tags": [{"name": "x"}, {"name": "y"}], "title": "Hello"})
        );
    }

    #[test]
    fn test_unflatten_form_body() {
        let output = sitepress()
            .args(["unflatten", "--form"])
            .write_stdin("hero.title=Big+Win&hero.links.0=%2Fplay\n")
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(
            stdout_json(&output.stdout),
            json!({"hero": {"title": "Big Win", "links": ["/play"]}})
        );
    }

    #[test]
    fn test_unflatten_rejects_non_object() {
        sitepress()
            .arg("unflatten")
            .write_stdin("[1, 2]")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Expected a JSON object"));
    }

    #[test]
    fn test_unflatten_rejects_empty_segment() {
        sitepress()
            .arg("unflatten")
            .write_stdin(r#"{"a..b": "x"}"#)
            .assert()
            .failure()
            .stderr(predicate::str::contains("empty segment"));
    }

    #[test]
    fn test_round_trip_through_cli() {
        let document = json!({
            "hero": {"title": "Spin", "buttons": [{"label": "Play", "href": "/play"}]},
            "footer": {"year": "2024"}
        });
        let flat = sitepress()
            .arg("flatten")
            .write_stdin(document.to_string())
            .output()
            .unwrap();
        assert!(flat.status.success());

        let nested = sitepress()
            .arg("unflatten")
            .write_stdin(flat.stdout)
            .output()
            .unwrap();
        assert!(nested.status.success());
        assert_eq!(stdout_json(&nested.stdout), document);
    }
}

// =============================================================================
// Config
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = TempDir::new().unwrap();
        sitepress()
            .arg("--root")
            .arg(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No site.toml found"))
            .stdout(predicate::str::contains("port = 3000"));
    }

    #[test]
    fn test_config_init_writes_file_once() {
        let dir = TempDir::new().unwrap();
        sitepress()
            .arg("--root")
            .arg(dir.path())
            .args(["config", "init"])
            .assert()
            .success();
        let written = fs::read_to_string(dir.path().join("site.toml")).unwrap();
        assert!(written.contains("[server]"));
        assert!(written.contains("/privacy-policy"));

        sitepress()
            .arg("--root")
            .arg(dir.path())
            .args(["config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        sitepress()
            .arg("--root")
            .arg(dir.path())
            .args(["config", "init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn test_config_show_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("site.toml"), "[server]\nport = 8123\n").unwrap();
        sitepress()
            .arg("--root")
            .arg(dir.path())
            .args(["config", "show"])
            .env_remove("SITEPRESS_PORT")
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 8123"));
    }
}
