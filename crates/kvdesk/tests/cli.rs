use std::fs;

use assert_cmd::Command;
use kvdesk_test_utils::{CannedResponse, CannedServer};
use serde_json::json;
use tempfile::TempDir;

/// `kvdesk` with an empty home directory and no URL in the environment
fn kvdesk(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kvdesk").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("KVDESK_URL")
        .env_remove("RUST_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .env("NO_COLOR", "1");
    cmd
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_lists_the_commands() {
    let home = TempDir::new().unwrap();
    let output = kvdesk(&home).arg("--help").output().unwrap();
    assert!(output.status.success());
    let help = stdout(&output);
    for command in ["keys", "get", "put", "delete", "fmt", "search", "config", "browse", "settings", "tui"] {
        assert!(help.contains(command), "missing {command} in:\n{help}");
    }
}

#[test]
fn settings_are_saved_under_home() {
    let home = TempDir::new().unwrap();
    kvdesk(&home)
        .args(["settings", "--set-url", "http://kv.local:9000/", "--timeout", "7"])
        .assert()
        .success();

    let saved = fs::read_to_string(home.path().join(".kvdesk/settings.toml")).unwrap();
    insta::assert_snapshot!(saved, @r#"
    url = "http://kv.local:9000"
    timeout_secs = 7
    "#);

    let output = kvdesk(&home).arg("settings").output().unwrap();
    let shown = stdout(&output);
    assert!(shown.contains("http://kv.local:9000"));
    assert!(shown.contains("from settings file"));
    assert!(shown.contains("7s"));

    let output = kvdesk(&home)
        .env("KVDESK_URL", "http://env:1")
        .arg("settings")
        .output()
        .unwrap();
    assert!(stdout(&output).contains("from KVDESK_URL"));
}

#[test]
fn keys_in_store_order() {
    let home = TempDir::new().unwrap();
    let server = CannedServer::start(vec![CannedResponse::ok(json!({"keys": ["b", "a", "ab"]}))]);

    let output = kvdesk(&home)
        .args(["--url", server.url().as_str(), "keys", "--filter", "A"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "a\nab\n");
    assert_eq!(server.join()[0].target, "/api/keys");
}

#[test]
fn get_prints_pretty_json() {
    let home = TempDir::new().unwrap();
    let server = CannedServer::start(vec![CannedResponse::ok(json!({
        "success": true,
        "data": {"key": "cfg", "value": {"a": 1}, "raw_value": "{\"a\":1}", "is_json": true}
    }))]);

    let output = kvdesk(&home)
        .args(["--url", server.url().as_str(), "get", "cfg"])
        .output()
        .unwrap();
    assert!(output.status.success());
    insta::assert_snapshot!(stdout(&output), @r#"
    {
      "a": 1
    }
    "#);
}

#[test]
fn put_with_yes_saves_plain_text() {
    let home = TempDir::new().unwrap();
    let server = CannedServer::start(vec![
        CannedResponse::ok(json!({
            "success": true,
            "data": {"key": "note", "value": "old", "raw_value": "old", "is_json": false}
        })),
        CannedResponse::ok(json!({"success": true, "message": "updated"})),
    ]);

    let output = kvdesk(&home)
        .args(["--url", server.url().as_str(), "put", "note", "new text", "--yes"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Saved note"));

    let requests = server.join();
    assert_eq!(requests[1].method, "PUT");
    assert_eq!(requests[1].target, "/api/record/note");
    let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(body, json!({"value": "new text"}));
}

#[test]
fn global_search_as_html() {
    let home = TempDir::new().unwrap();
    let server = CannedServer::start(vec![CannedResponse::ok(json!({
        "success": true,
        "results": [
            {"key": "user:1", "preview": "{\"name\":\"Ada\"}", "match_in_key": false, "match_in_value": true}
        ]
    }))]);

    let output = kvdesk(&home)
        .args(["--url", server.url().as_str(), "search", "ada", "--global", "--format", "html"])
        .output()
        .unwrap();
    assert!(output.status.success());
    insta::assert_snapshot!(stdout(&output).trim_end(), @"<li><strong>user:1</strong> <span>Value</span><pre>{&quot;name&quot;:&quot;<mark>Ada</mark>&quot;}</pre></li>");
    assert_eq!(server.join()[0].target, "/api/search?q=ada");
}

#[test]
fn api_errors_are_reported() {
    let home = TempDir::new().unwrap();
    let server = CannedServer::start(vec![CannedResponse::json(
        404,
        json!({"success": false, "error": "Key not found"}),
    )]);

    let output = kvdesk(&home)
        .args(["--url", server.url().as_str(), "get", "ghost"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load \"ghost\""), "{stderr}");
    assert!(stderr.contains("HTTP 404 Not Found: Key not found"), "{stderr}");
}
