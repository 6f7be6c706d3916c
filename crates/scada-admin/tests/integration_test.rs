use scada_io::mock::MockBackend;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};

fn admin(base_url: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scada-admin"))
        .args(["--base-url", base_url])
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to run scada-admin")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn plant() -> MockBackend {
    let backend = MockBackend::start().expect("Failed to start mock backend");
    backend.route_json("GET", "/health", &json!({"status": "healthy"}));
    backend.route_json(
        "GET",
        "/tags",
        &json!({"success": true, "data": {"tags": [
            {"name": "FIT_100", "description": "Main flow"},
            {"name": "FIT_100.PV", "quality": "Good", "last_update": 1700000000.0},
            {"name": "PRC_200.SP", "quality": "Good"},
            {"name": "PRC_200.PV", "quality": "Good"}
        ]}}),
    );
    backend
}

#[test]
fn tags_list_prints_the_hierarchy() {
    let backend = plant();
    let output = admin(backend.base_url(), &["tags", "list"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let table = stdout(&output);
    assert!(table.contains("FIT_100"), "{table}");
    assert!(table.contains("PRC_200"), "{table}");
    assert!(stderr(&output).contains("Loaded 2 parent tags with 3 variables"));
}

#[test]
fn health_succeeds_against_a_healthy_backend() {
    let backend = plant();
    let output = admin(backend.base_url(), &["health"]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("Backend is healthy"));
    assert_eq!(backend.hits("GET", "/health"), 1);
}

#[test]
fn unreachable_backend_exits_non_zero() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().expect("Failed to resolve bound address");
    drop(listener);

    let output = admin(&format!("http://{addr}"), &["status"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Connection error"), "{}", stderr(&output));
}

#[test]
fn declined_confirmation_exits_with_cancel_status() {
    let backend = plant();
    // stdin is closed, so the prompt reads no answer.
    let output = admin(backend.base_url(), &["opcua", "unassign", "3"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(backend.requests().is_empty());
}

#[test]
fn assume_yes_skips_the_prompt() {
    let backend = plant();
    backend.route_json("POST", "/opcua-assign", &json!({"success": true}));

    let output = admin(backend.base_url(), &["--yes", "opcua", "unassign", "3"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"tag_name": "", "index": 3}));
}

#[test]
fn audit_log_records_the_session() {
    let backend = plant();
    let dir = tempfile::tempdir().unwrap();
    let audit = dir.path().join("audit.jsonl");

    let output = admin(
        backend.base_url(),
        &["--audit-log", audit.to_str().unwrap(), "health"],
    );
    assert!(output.status.success());

    let events: Vec<Value> = std::fs::read_to_string(&audit)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|e| e["event_type"].as_str())
        .collect();
    assert_eq!(kinds, vec!["session_start", "session_end"]);
    assert_eq!(events[0]["details"]["command"], "health");
    assert_eq!(events[1]["details"]["exit_code"], 0);
}

#[test]
fn bounded_watch_session_exits_cleanly() {
    let backend = plant();
    let output = admin(
        backend.base_url(),
        &["watch", "--surface", "tags", "--run-seconds", "1"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("FIT_100"));
    assert!(backend.hits("GET", "/tags") >= 1);
}
