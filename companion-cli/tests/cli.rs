use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `companion` running in an empty scratch directory with no config from
/// the environment.
fn companion(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("companion");
    cmd.current_dir(dir.path())
        .env_remove("COMPANION_CONFIG")
        .env_remove("COMPANION_GENERATOR_URL")
        .env_remove("RUST_LOG");
    cmd
}

async fn model_replying(response: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:1b",
            "response": response,
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    companion(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("recipes"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn recipes_lists_built_ins() {
    let dir = TempDir::new().unwrap();
    companion(&dir)
        .arg("recipes")
        .assert()
        .success()
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("action_items"))
        .stdout(predicate::str::contains("brainstorm"));
}

#[test]
fn scan_redacts_without_a_model() {
    let dir = TempDir::new().unwrap();
    companion(&dir)
        .args(["scan", "--text", "call 555-123-4567 or mail jo@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("call [PHONE] or mail [EMAIL]"))
        .stdout(predicate::str::contains("jo@example.com").not());
}

#[test]
fn unknown_recipe_fails() {
    let dir = TempDir::new().unwrap();
    companion(&dir)
        .args(["run", "--recipe", "translate", "--text", "hola"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown recipe: translate"));
}

#[test]
fn blank_stdin_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    companion(&dir)
        .args(["run", "--recipe", "summary"])
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid input"));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    companion(&dir)
        .args(["--config", "missing.toml", "recipes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_redacts_before_calling_the_model() {
    let server = model_replying("Contact John at [EMAIL] for details.").await;
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.json");

    companion(&dir)
        .env("COMPANION_GENERATOR_URL", server.uri())
        .args([
            "run",
            "--recipe",
            "summary",
            "--text",
            "Contact John at john@example.com for details.",
            "--events",
        ])
        .arg(&events)
        .assert()
        .success()
        .stdout("- Contact John at [EMAIL] for details.\n");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("john@example.com"));
    assert!(body.contains("[EMAIL]"));

    let log = std::fs::read_to_string(&events).unwrap();
    let logged: serde_json::Value = serde_json::from_str(&log).unwrap();
    assert_eq!(logged[0]["recipe_id"], "summary");
    assert_eq!(logged[0]["source"], "text");
    assert!(!log.contains("john@example.com"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn config_file_limits_output() {
    let server = model_replying(&"lorem ipsum dolor sit amet ".repeat(40)).await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("companion.toml"),
        format!(
            "[generator]\nbase_url = \"{}\"\n\n[guardrails]\nmax_output_chars = 40\n",
            server.uri()
        ),
    )
    .unwrap();

    let output = companion(&dir)
        .args(["run", "--recipe", "summary", "--text", "weekly notes", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["recipe_id"], "summary");
    assert_eq!(result["truncated"], true);
    let text = result["text"].as_str().unwrap();
    assert!(text.chars().count() <= 40, "{text:?}");
    assert!(text.ends_with('…'));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_errors_are_retried_once_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "loading model"})))
        .expect(2)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    companion(&dir)
        .env("COMPANION_GENERATOR_URL", server.uri())
        .args(["run", "--recipe", "action_items", "--text", "ship the release"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("generation failed"))
        .stderr(predicate::str::contains("loading model"));
}
