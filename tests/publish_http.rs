// tests/publish_http.rs
// GitHub contents publishing against a mock API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use portfolio_board::content::{self, EditableSurface, Region, RegionMap};
use portfolio_board::{AdminMode, ContentDocument, LocalStore, PublishError, SiteConfig, SiteContext};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const CONTENTS: &str = "/repos/Owner/web/contents/content.json";

fn admin(server: &MockServer) -> AdminMode<RegionMap> {
    let mut cfg = SiteConfig::default();
    cfg.publish.api_base = server.uri();
    cfg.publish.owner = "Owner".into();
    cfg.publish.repo = "web".into();
    let page = content::layout(&ContentDocument::default())
        .with(Region::HeroTitle, "Hello 세계");
    AdminMode::new(SiteContext::with_store(cfg, LocalStore::in_memory()), page)
}

async fn ready(server: &MockServer) -> AdminMode<RegionMap> {
    let mut a = admin(server);
    assert!(a.enable("admin12"));
    a.save().unwrap();
    a.set_token("ghp_test").unwrap();
    a
}

#[tokio::test]
async fn publishes_base64_body_against_current_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .and(header("authorization", "token ghp_test"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "abc123" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .respond_with(|req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            let ok = body["sha"] == "abc123" && body["branch"] == "master";
            let decoded = STANDARD
                .decode(body["content"].as_str().unwrap_or_default())
                .unwrap_or_default();
            let doc: Value = serde_json::from_slice(&decoded).unwrap_or(Value::Null);
            if ok && doc["hero"]["title"] == "Hello 세계" {
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "commit": { "sha": "0123456789abcdef" } }))
            } else {
                ResponseTemplate::new(422).set_body_json(json!({ "message": "bad body" }))
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let out = ready(&server).await.deploy().await.unwrap();
    assert_eq!(out.commit_sha, "0123456");
    assert_eq!(out.site_url, "https://owner.github.io/web/");
}

#[tokio::test]
async fn auth_failures_are_classified() {
    for (status, expected) in [
        (401, PublishError::Unauthorized),
        (403, PublishError::Forbidden),
        (404, PublishError::NotFound),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONTENTS))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": "no" })))
            .mount(&server)
            .await;
        let err = ready(&server).await.deploy().await.unwrap_err();
        assert_eq!(err, expected);
    }
}

#[tokio::test]
async fn conflict_is_a_generic_error_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "old" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "sha does not match" })),
        )
        .mount(&server)
        .await;

    let err = ready(&server).await.deploy().await.unwrap_err();
    assert_eq!(err, PublishError::Other("409 - sha does not match".into()));
}

#[tokio::test]
async fn set_token_trims_and_reports_status() {
    let server = MockServer::start().await;
    let a = admin(&server);
    assert!(!a.has_token());
    a.set_token("  ghp_x  ").unwrap();
    assert!(a.has_token());
    assert!(a.surface().text(Region::HeroTitle).is_some());
}
