use std::time::Duration;

use kvdesk_api::HttpStore;
use kvdesk_core::{EntryKind, KvError, RecordStore};
use kvdesk_test_utils::{CannedResponse, CannedServer};
use serde_json::json;

fn store(server: &CannedServer) -> HttpStore {
    HttpStore::new(server.url(), Duration::from_secs(5)).unwrap()
}

#[test]
fn lists_keys() {
    let server = CannedServer::start(vec![CannedResponse::ok(json!({"keys": ["b", "a"]}))]);
    assert_eq!(store(&server).list_keys().unwrap(), ["b", "a"]);

    let requests = server.join();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/api/keys");
}

#[test]
fn fetches_a_record_by_encoded_key() {
    let server = CannedServer::start(vec![CannedResponse::ok(json!({
        "success": true,
        "data": {"key": "user/1", "value": "plain", "raw_value": "plain", "is_json": false}
    }))]);
    let record = store(&server).fetch_record("user/1").unwrap();
    assert_eq!(record.key, "user/1");
    assert!(!record.is_json);

    assert_eq!(server.join()[0].target, "/api/record/user%2F1");
}

#[test]
fn update_sends_the_text_verbatim() {
    let server = CannedServer::start(vec![CannedResponse::ok(json!({"success": true, "message": "ok"}))]);
    store(&server).update_record("k", "{ \"a\" :1 }").unwrap();

    let requests = server.join();
    assert_eq!(requests[0].method, "PUT");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"value": "{ \"a\" :1 }"}));
}

#[test]
fn success_false_is_an_api_error() {
    let server = CannedServer::start(vec![CannedResponse::ok(json!({
        "success": false,
        "message": "Record to delete not found"
    }))]);
    let err = store(&server).delete_record("gone").unwrap_err();
    assert_eq!(err, KvError::Api("Record to delete not found".to_string()));
    assert_eq!(server.join()[0].method, "DELETE");
}

#[test]
fn non_2xx_is_a_network_error_with_detail() {
    let server = CannedServer::start(vec![
        CannedResponse::json(404, json!({"success": false, "error": "Key not found"})),
        CannedResponse {
            status: 500,
            body: "oops".to_string(),
        },
    ]);
    let store = store(&server);

    let err = store.fetch_record("x").unwrap_err();
    assert_eq!(err, KvError::Network("HTTP 404 Not Found: Key not found".to_string()));

    let err = store.list_keys().unwrap_err();
    assert_eq!(err, KvError::Network("HTTP 500 Internal Server Error".to_string()));
}

#[test]
fn malformed_body_is_a_parse_error() {
    let server = CannedServer::start(vec![CannedResponse {
        status: 200,
        body: "<html>".to_string(),
    }]);
    assert!(matches!(store(&server).list_keys(), Err(KvError::Parse(_))));
}

#[test]
fn search_encodes_the_term() {
    let server = CannedServer::start(vec![CannedResponse::ok(json!({
        "success": true,
        "results": [
            {"key": "k1", "preview": "a & b", "match_in_key": false, "match_in_value": true}
        ]
    }))]);
    let hits = store(&server).search("a & b").unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].match_in_value);

    assert_eq!(server.join()[0].target, "/api/search?q=a%20%26%20b");
}

#[test]
fn config_round_trip() {
    let server = CannedServer::start(vec![
        CannedResponse::ok(json!({"success": true, "config": {"db_path": "/old.db"}})),
        CannedResponse::ok(json!({"success": true, "message": "saved", "config": {"db_path": "/new.db"}})),
    ]);
    let store = store(&server);

    assert_eq!(store.get_config().unwrap().db_path.as_deref(), Some("/old.db"));
    assert_eq!(store.put_config("/new.db").unwrap().db_path.as_deref(), Some("/new.db"));

    let requests = server.join();
    assert_eq!(requests[1].method, "PUT");
    assert_eq!(requests[1].target, "/api/config");
    let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(body, json!({"db_path": "/new.db"}));
}

#[test]
fn browse_lists_a_directory() {
    let server = CannedServer::start(vec![CannedResponse::ok(json!({
        "success": true,
        "directory": "/srv",
        "parent": "/",
        "items": [
            {"name": "data", "path": "/srv/data", "type": "directory"},
            {"name": "kv.db", "path": "/srv/kv.db", "type": "file"}
        ]
    }))]);
    let listing = store(&server).browse("/srv").unwrap();
    assert_eq!(listing.parent.as_deref(), Some("/"));
    assert_eq!(listing.items[0].kind, EntryKind::Directory);
    assert_eq!(listing.items[1].kind, EntryKind::File);

    assert_eq!(server.join()[0].target, "/api/browse?directory=%2Fsrv");
}

#[test]
fn unreachable_server_is_a_network_error() {
    // Nothing listens on the port once the server has served its responses
    let server = CannedServer::start(vec![]);
    let url = server.url();
    server.join();

    let store = HttpStore::new(url, Duration::from_secs(1)).unwrap();
    assert!(matches!(store.list_keys(), Err(KvError::Network(_))));
}
