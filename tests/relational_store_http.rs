// tests/relational_store_http.rs
// Relational store adapter against a mock PostgREST endpoint.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use portfolio_board::backend::{BackendAdapter, RelationalStoreAdapter};
use portfolio_board::model::{NewGuestPost, NewNotice, Notice, RecordId};
use portfolio_board::{LocalStore, SiteConfig, SiteContext};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "anon-test-key";

fn adapter(server: &MockServer) -> RelationalStoreAdapter {
    let mut cfg = SiteConfig::default();
    cfg.backend.demo_mode = false;
    cfg.relational_store.url = server.uri();
    cfg.relational_store.anon_key = KEY.into();
    RelationalStoreAdapter::new(SiteContext::with_store(cfg, LocalStore::in_memory()))
}

#[tokio::test]
async fn init_needs_url_and_key() {
    let server = MockServer::start().await;
    assert!(adapter(&server).init().await);

    let mut cfg = SiteConfig::default();
    cfg.relational_store.url = "YOUR_SUPABASE_URL".into();
    cfg.relational_store.anon_key = KEY.into();
    let a = RelationalStoreAdapter::new(SiteContext::with_store(cfg, LocalStore::in_memory()));
    assert!(!a.init().await);
}

#[tokio::test]
async fn increment_prefers_rpc() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_visitor_count"))
        .and(header("apikey", KEY))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(8)))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(adapter(&server).increment_visitor_count().await.unwrap(), 8);
}

#[tokio::test]
async fn increment_falls_back_to_upsert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/increment_visitor_count"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "function not found"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/visitor_counter"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "count": 10 }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/visitor_counter"))
        .and(header("prefer", "resolution=merge-duplicates"))
        .and(body_json(json!({ "id": 1, "count": 11 })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(adapter(&server).increment_visitor_count().await.unwrap(), 11);
}

#[tokio::test]
async fn inserts_return_row_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notices"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([{
            "title": "T", "content": "C", "timestamp": 3, "is_admin": true
        }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 17, "title": "T", "content": "C", "timestamp": 3, "is_admin": true
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/guest_posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 4, "author": "a", "content": "hi", "timestamp": 3
        }])))
        .mount(&server)
        .await;

    let a = adapter(&server);
    let id = a
        .add_notice(NewNotice {
            title: "T".into(),
            content: "C".into(),
            timestamp: 3,
            is_admin: true,
        })
        .await
        .unwrap();
    assert_eq!(id, RecordId::Num(17));
    let id = a
        .add_guest_post(NewGuestPost {
            author: "a".into(),
            content: "hi".into(),
            timestamp: 3,
        })
        .await
        .unwrap();
    assert_eq!(id, RecordId::Num(4));
}

#[tokio::test]
async fn reads_map_snake_case_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notices"))
        .and(query_param("order", "timestamp.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "title": "new", "content": "b", "timestamp": 20, "is_admin": true },
            { "id": 1, "title": "old", "content": "a", "timestamp": 10, "is_admin": false }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/guest_posts"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let a = adapter(&server);
    let notices = a.get_notices().await.unwrap();
    assert_eq!(notices.len(), 2);
    assert!(notices[0].is_admin);
    assert_eq!(notices[1].id, Some(RecordId::Num(1)));
    assert!(a.get_guest_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_filters_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/guest_posts"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    adapter(&server)
        .delete_guest_post(&RecordId::Num(9))
        .await
        .unwrap();
}

#[tokio::test]
async fn polling_delivers_only_changes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "t", "content": "c", "timestamp": 1, "is_admin": true }
        ])))
        .mount(&server)
        .await;

    let a = adapter(&server).with_poll_interval(Duration::from_millis(30));
    let seen: Arc<Mutex<Vec<Vec<Notice>>>> = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let mut sub = a.subscribe_notices(Arc::new(move |list: Vec<Notice>| {
        s.lock().unwrap().push(list);
    }));

    // Several polls of an unchanged table: one delivery.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(sub.close());
    assert!(!sub.close());
}
