//! Integration tests for `omni chat`, `omni export` and `omni deploy`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn omni(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("omni").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path()).env("NO_COLOR", "1")
        .env_remove("OMNIVERSE_ENDPOINT")
        .env_remove("OMNIVERSE_MODEL");
    cmd
}

#[test]
fn test_chat_applies_reply() {
    let mut server = mockito::Server::new();
    let reply = "Done!\n\n```tsx App.tsx\nexport default function App() { return <h1>Hi</h1>; }\n```";
    let mock = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({"model": "GPT-5.2"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::json!({"choices": [{"message": {"role": "assistant", "content": reply}}]}).to_string())
        .create();

    let temp_dir = TempDir::new().unwrap();
    let assert = omni(&temp_dir)
        .args(["chat", "Say hi", "--json", "--endpoint"])
        .arg(format!("{}/", server.url()))
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["reply"], reply);
    assert_eq!(json["changed"], serde_json::json!(["src/App.tsx"]));
    assert_eq!(json["active"]["content"], "export default function App() { return <h1>Hi</h1>; }\n");
    assert_eq!(json["notice"], serde_json::Value::Null);

    mock.assert();
}

#[test]
fn test_chat_failure_sets_notice() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("POST", "/").with_status(500).with_body("boom").create();

    let temp_dir = TempDir::new().unwrap();
    omni(&temp_dir)
        .args(["chat", "Say hi", "--endpoint"])
        .arg(format!("{}/", server.url()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to communicate with the model."));
}

#[test]
fn test_chat_blank_prompt() {
    let temp_dir = TempDir::new().unwrap();
    omni(&temp_dir)
        .args(["chat", "   ", "--endpoint", "http://127.0.0.1:9/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to send"));
}

#[test]
fn test_export_writes_archive() {
    let temp_dir = TempDir::new().unwrap();
    omni(&temp_dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 5 files"));

    let bytes = std::fs::read(temp_dir.path().join("project-alpha.tar.gz")).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
}

#[test]
fn test_deploy_reports_url() {
    let temp_dir = TempDir::new().unwrap();
    omni(&temp_dir)
        .args(["deploy", "--delay-ms", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Live at https://omniverse-app.web.app/demo"));
}

#[test]
fn test_config_file_overrides_deploy_url() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join(".omniverserc"),
        "[agent]\ndeploy_delay_ms = 5\ndeploy_url = \"https://example.test/app\"\n",
    )
    .unwrap();

    omni(&temp_dir)
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Live at https://example.test/app"));
}

#[test]
fn test_bad_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(".omniverserc"), "[agent\n").unwrap();

    omni(&temp_dir)
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
