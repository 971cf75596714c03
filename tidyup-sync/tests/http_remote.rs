//! HTTP adapter contract against a mock TidyUp backend.

use serde_json::json;
use tidyup_core::{HouseholdId, HouseholdState, JoinCode, SequentialIds};
use tidyup_sync::{HttpRemoteStore, RemoteError, RemoteStore};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn empty_wire_state() -> serde_json::Value {
    json!({"roommates": [], "chores": [], "startEpoch": null, "doneByWeek": {}})
}

#[tokio::test(flavor = "multi_thread")]
async fn create_reads_id_code_and_initial_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/households"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "join_code": "482913",
            "state": empty_wire_state(),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpRemoteStore::new(server.uri());
    let created = store.create().await.expect("create");
    assert_eq!(created.identity.id, HouseholdId::from("abc123"));
    assert_eq!(created.identity.join_code, JoinCode::from("482913"));
    assert_eq!(created.state, HouseholdState::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn join_sends_code_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/join"))
        .and(query_param("code", "482913"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "id": "abc123"})))
        .mount(&server)
        .await;

    let store = HttpRemoteStore::new(server.uri());
    let id = store.join(&JoinCode::from(" 482913 ")).await.expect("join");
    assert_eq!(id, HouseholdId::from("abc123"));
}

#[tokio::test(flavor = "multi_thread")]
async fn join_rejection_is_invalid_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/join"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Invalid join code"})))
        .mount(&server)
        .await;

    let store = HttpRemoteStore::new(server.uri());
    let err = store.join(&JoinCode::from("000000")).await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidJoinCode), "got: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_decodes_state_and_maps_404_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/households/abc123/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "roommates": [{"id": "r1", "name": "Al"}],
            "chores": [{"id": "c1", "name": "Dishes", "details": "", "freq": "weekly"}],
            "startEpoch": 1717372740000i64,
            "doneByWeek": {"0": {"c1": true}},
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/households/gone/state"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = HttpRemoteStore::new(server.uri());
    let state = store
        .fetch_state(&HouseholdId::from("abc123"))
        .await
        .expect("fetch")
        .expect("present");
    assert_eq!(state.members[0].name, "Al");
    assert!(state.completion.is_done(&"0".into(), &"c1".into()));

    let missing = store.fetch_state(&HouseholdId::from("gone")).await.expect("fetch");
    assert_eq!(missing, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn store_sends_auth_cookie_and_wire_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/households/abc123/state"))
        .and(header("cookie", "tidyup_auth=abc123"))
        .and(body_partial_json(json!({"roommates": [{"id": "m-1", "name": "Al"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = HouseholdState::default();
    state.add_member("Al", &SequentialIds::new("m"));
    let store = HttpRemoteStore::new(server.uri());
    store
        .store_state(&HouseholdId::from("abc123"), &state)
        .await
        .expect("store");
}

#[tokio::test(flavor = "multi_thread")]
async fn unauthorized_write_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/households/abc123/rotate-now"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let store = HttpRemoteStore::new(server.uri());
    let err = store.rotate_now(&HouseholdId::from("abc123")).await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 403, .. }), "got: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_error() {
    let store = HttpRemoteStore::new("http://127.0.0.1:9");
    let err = store.fetch_state(&HouseholdId::from("abc123")).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }), "got: {err}");
}
