use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tidyup(home: &TempDir, remote: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tidyup"));
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env("NO_COLOR", "1")
        .env_remove("TIDYUP_REMOTE_URL")
        .env_remove("RUST_LOG")
        .args(["--remote", remote]);
    cmd
}

fn hold_identity(home: &TempDir) {
    let dir = home.path().join(".tidyup");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(
        dir.join("household.json"),
        json!({"id": "hh-1", "joinCode": "123456"}).to_string(),
    )
    .expect("write identity");
}

async fn server_with_member(name: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/households/hh-1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "roommates": [{"id": "m1", "name": name}],
            "chores": [],
            "startEpoch": 1_717_372_740_000_i64,
            "doneByWeek": {}
        })))
        .mount(&server)
        .await;
    server
}

// The CLI is blocking; keep a second worker free for the mock server.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pull_reports_the_snapshot_adopted_on_open() {
    let home = TempDir::new().expect("tempdir");
    hold_identity(&home);
    let server = server_with_member("Bo").await;

    tidyup(&home, &server.uri())
        .arg("pull")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated from remote."));

    let cached = std::fs::read_to_string(home.path().join(".tidyup/state.json")).expect("state");
    assert!(cached.contains("Bo"));

    tidyup(&home, &server.uri())
        .arg("pull")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up to date."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pull_surfaces_an_unreachable_remote() {
    let home = TempDir::new().expect("tempdir");
    hold_identity(&home);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/households/hh-1/state"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    tidyup(&home, &server.uri())
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500"));
}
