use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn tidyup(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tidyup"));
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env("NO_COLOR", "1")
        .env_remove("TIDYUP_REMOTE_URL")
        .env_remove("TIDYUP_POLL_INTERVAL_SECS")
        .env_remove("RUST_LOG")
        .arg("--offline");
    cmd
}

fn run(home: &TempDir, args: &[&str]) {
    tidyup(home).args(args).assert().success();
}

fn show_json(home: &TempDir) -> Value {
    let output = tidyup(home)
        .args(["show", "--json"])
        .output()
        .expect("run show");
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).expect("show --json output")
}

fn pairs(report: &Value) -> Vec<(String, String)> {
    report["assignments"]
        .as_array()
        .expect("assignments array")
        .iter()
        .map(|a| {
            (
                a["choreName"].as_str().expect("chore").to_string(),
                a["memberName"].as_str().expect("member").to_string(),
            )
        })
        .collect()
}

fn pair(chore: &str, member: &str) -> (String, String) {
    (chore.to_string(), member.to_string())
}

fn seed(home: &TempDir) {
    run(home, &["member", "add", "Al"]);
    run(home, &["member", "add", "Bo"]);
    run(home, &["chore", "add", "Dishes"]);
    run(home, &["chore", "add", "Trash", "--details", "bins out Tuesday"]);
}

#[test]
fn empty_household_prompts_for_members_and_chores() {
    let home = TempDir::new().expect("tempdir");
    tidyup(&home)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Add members and chores"))
        .stdout(predicate::str::contains("Next rotation in"));

    let report = show_json(&home);
    assert_eq!(report["weekIndex"], 0);
    assert!(report["assignments"].as_array().expect("array").is_empty());
    assert!(home.path().join(".tidyup/state.json").exists());
}

#[test]
fn fresh_household_assigns_in_list_order() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);

    let report = show_json(&home);
    assert_eq!(report["weekKey"], "0");
    assert_eq!(
        pairs(&report),
        vec![pair("Dishes", "Al"), pair("Trash", "Bo")]
    );
    assert_eq!(report["assignments"][1]["details"], "bins out Tuesday");

    let countdown = report["countdown"].as_str().expect("countdown");
    let units: Vec<&str> = countdown.split(' ').collect();
    assert_eq!(units.len(), 4, "{countdown}");
    assert!(units[0].ends_with('d') && units[3].ends_with('s'), "{countdown}");
}

#[test]
fn state_file_uses_wire_field_names() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    let raw = std::fs::read_to_string(home.path().join(".tidyup/state.json")).expect("state");
    let state: Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(state["roommates"][0]["name"], "Al");
    assert_eq!(state["chores"][0]["freq"], "weekly");
    assert!(state["startEpoch"].is_i64());
}

#[test]
fn rotate_now_advances_one_week() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);

    tidyup(&home)
        .arg("rotate-now")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rotated to week 1"));

    let report = show_json(&home);
    assert_eq!(report["weekIndex"], 1);
    assert_eq!(
        pairs(&report),
        vec![pair("Dishes", "Bo"), pair("Trash", "Al")]
    );
}

#[test]
fn rotate_now_server_falls_back_to_local_when_offline() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    run(&home, &["rotate-now", "--server"]);
    assert_eq!(show_json(&home)["weekIndex"], 1);
}

#[test]
fn reset_start_returns_to_week_zero() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    run(&home, &["rotate-now"]);
    run(&home, &["rotate-now"]);
    tidyup(&home)
        .arg("reset-start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Next rotation: Sun"));
    assert_eq!(show_json(&home)["weekIndex"], 0);
}

#[test]
fn week_offset_previews_future_weeks() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    let output = tidyup(&home)
        .args(["show", "--json", "--week-offset", "-1"])
        .output()
        .expect("run show");
    assert!(output.status.success(), "{output:?}");
    let report: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["weekIndex"], -1);
    assert_eq!(pairs(&report)[0], pair("Dishes", "Bo"));
}

#[test]
fn done_and_undo_track_the_current_week() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);

    tidyup(&home)
        .args(["done", "dishes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dishes is done for week 0"));
    let report = show_json(&home);
    assert_eq!(report["assignments"][0]["done"], true);
    assert_eq!(report["assignments"][1]["done"], false);

    run(&home, &["done", "1", "--undo"]);
    assert_eq!(show_json(&home)["assignments"][0]["done"], false);

    run(&home, &["toggle", "Trash"]);
    assert_eq!(show_json(&home)["assignments"][1]["done"], true);

    run(&home, &["rotate-now"]);
    let next_week = show_json(&home);
    assert_eq!(next_week["assignments"][1]["done"], false);
}

#[test]
fn members_reorder_by_position_or_name() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    run(&home, &["member", "add", "Cy"]);
    run(&home, &["member", "up", "cy"]);
    run(&home, &["member", "down", "1"]);

    tidyup(&home)
        .args(["member", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)1 .*Cy.*2 .*Al.*3 .*Bo").expect("regex"));
}

#[test]
fn removing_members_and_chores() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    run(&home, &["member", "remove", "Al"]);
    run(&home, &["chore", "remove", "2"]);
    assert_eq!(pairs(&show_json(&home)), vec![pair("Dishes", "Bo")]);

    tidyup(&home)
        .args(["member", "remove", "Zed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no member matches 'Zed'"));
}

#[test]
fn blank_names_are_ignored() {
    let home = TempDir::new().expect("tempdir");
    tidyup(&home)
        .args(["member", "add", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing added"))
        .stdout(predicate::str::contains("No members yet"));
}

#[test]
fn clear_requires_confirmation() {
    let home = TempDir::new().expect("tempdir");
    seed(&home);
    tidyup(&home)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(pairs(&show_json(&home)).len(), 2);

    run(&home, &["clear", "--yes"]);
    let report = show_json(&home);
    assert!(report["assignments"].as_array().expect("array").is_empty());
    assert_eq!(report["weekIndex"], 0);
}

#[test]
fn offline_create_mints_a_local_join_code() {
    let home = TempDir::new().expect("tempdir");
    tidyup(&home)
        .arg("code")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tidyup create"));

    tidyup(&home)
        .arg("create")
        .assert()
        .success()
        .stdout(predicate::str::contains("Join code:"));

    let output = tidyup(&home).arg("code").output().expect("run code");
    assert!(output.status.success());
    let code = String::from_utf8(output.stdout).expect("utf8").trim().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(code, code.to_uppercase());

    // The held code is accepted in any case; anything else is rejected.
    run(&home, &["join", &format!(" {} ", code.to_lowercase())]);
    tidyup(&home)
        .args(["join", "000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid join code"));

    let identity = std::fs::read_to_string(home.path().join(".tidyup/household.json"))
        .expect("identity file");
    assert!(identity.contains("joinCode"));
}

#[test]
fn join_without_a_household_is_rejected_offline() {
    let home = TempDir::new().expect("tempdir");
    tidyup(&home)
        .args(["join", "123456"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid join code '123456'"));
    assert!(!home.path().join(".tidyup/household.json").exists());
}

#[test]
fn malformed_config_is_reported() {
    let home = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(home.path().join(".tidyup")).expect("mkdir");
    std::fs::write(home.path().join(".tidyup/config.yaml"), "poll_interval_secs: [").expect("write");
    tidyup(&home)
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.yaml"));
}

#[test]
fn corrupt_cache_falls_back_to_an_empty_household() {
    let home = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(home.path().join(".tidyup")).expect("mkdir");
    std::fs::write(home.path().join(".tidyup/state.json"), "{ not json").expect("write");
    let report = show_json(&home);
    assert!(report["assignments"].as_array().expect("array").is_empty());
}

#[test]
fn pull_without_a_household_fails() {
    let home = TempDir::new().expect("tempdir");
    tidyup(&home)
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no household yet"));
}
