//! Realtime document store adapter (Firebase Realtime Database REST API).
//!
//! Data layout: `/visitorCount` (number), `/notices/<pushKey>`,
//! `/guestPosts/<pushKey>`. Listeners use the REST event stream
//! (`Accept: text/event-stream`): the first `put` carries the whole value, later
//! `put`/`patch` events trigger a re-read so callbacks always get the full
//! collection.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::sse::{EventStreamParser, SseEvent};
use super::{BackendAdapter, Callback, Subscription};
use crate::config::site::PLACEHOLDER_API_KEY;
use crate::context::SharedContext;
use crate::error::{check_status, BackendError, BackendResult};
use crate::model::{
    sort_newest_first, GuestPost, NewGuestPost, NewNotice, Notice, NoticeUpdate, RecordId,
    GUEST_POST_LIMIT,
};

const PATH_VISITOR_COUNT: &str = "visitorCount";
const PATH_NOTICES: &str = "notices";
const PATH_GUEST_POSTS: &str = "guestPosts";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DocumentStoreAdapter {
    ctx: SharedContext,
    base: String,
    auth: Option<String>,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct StreamPayload {
    path: String,
    #[serde(default)]
    data: Value,
}

/// One resource the stream listener can materialise.
#[derive(Clone, Copy)]
enum Resource {
    VisitorCount,
    Notices,
    GuestPosts,
}

impl Resource {
    fn path(self) -> &'static str {
        match self {
            Resource::VisitorCount => PATH_VISITOR_COUNT,
            Resource::Notices => PATH_NOTICES,
            Resource::GuestPosts => PATH_GUEST_POSTS,
        }
    }

    fn query(self) -> Vec<(&'static str, String)> {
        match self {
            Resource::GuestPosts => vec![
                ("orderBy", "\"timestamp\"".to_string()),
                ("limitToLast", GUEST_POST_LIMIT.to_string()),
            ],
            _ => Vec::new(),
        }
    }
}

impl DocumentStoreAdapter {
    pub fn new(ctx: SharedContext) -> Self {
        let cfg = &ctx.config.document_store;
        let base = cfg.database_url.trim().trim_end_matches('/').to_string();
        let auth = cfg.auth_token.clone().filter(|t| !t.trim().is_empty());
        Self { ctx, base, auth }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base, path)
    }

    fn auth_query(&self) -> Vec<(&'static str, String)> {
        self.auth
            .as_ref()
            .map(|t| vec![("auth", t.clone())])
            .unwrap_or_default()
    }

    async fn get_value(&self, path: &str, query: &[(&'static str, String)]) -> BackendResult<Value> {
        let resp = self
            .ctx
            .http
            .get(self.url(path))
            .query(&self.auth_query())
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<Value>().await?)
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> BackendResult<reqwest::Response> {
        let resp = self
            .ctx
            .http
            .request(method, self.url(path))
            .query(&self.auth_query())
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        check_status(resp).await
    }

    async fn remove(&self, path: &str) -> BackendResult<()> {
        let resp = self
            .ctx
            .http
            .delete(self.url(path))
            .query(&self.auth_query())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn read_count(&self) -> BackendResult<u64> {
        count_from_value(&self.get_value(PATH_VISITOR_COUNT, &[]).await?)
    }

    async fn read_resource(&self, res: Resource) -> BackendResult<Value> {
        self.get_value(res.path(), &res.query()).await
    }

    /// Open the event stream for `res` and feed every materialised value to
    /// `deliver` until the server cancels or the connection drops.
    async fn listen(self, res: Resource, deliver: impl Fn(Value)) {
        let resp = self
            .ctx
            .http
            .get(self.url(res.path()))
            .query(&self.auth_query())
            .query(&res.query())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, path = res.path(), "event stream request failed");
                return;
            }
        };
        let resp = match check_status(resp).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, path = res.path(), "event stream rejected");
                return;
            }
        };
        debug!(path = res.path(), "event stream open");

        let mut parser = EventStreamParser::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, path = res.path(), "event stream read failed");
                    return;
                }
            };
            for ev in parser.push(&chunk) {
                match self.on_event(res, &ev).await {
                    StreamStep::Deliver(v) => deliver(v),
                    StreamStep::Skip => {}
                    StreamStep::Stop => {
                        info!(path = res.path(), event = %ev.event, "event stream ended by server");
                        return;
                    }
                }
            }
        }
        debug!(path = res.path(), "event stream closed");
    }

    async fn on_event(&self, res: Resource, ev: &SseEvent) -> StreamStep {
        match ev.event.as_str() {
            "put" | "patch" => {}
            "cancel" | "auth_revoked" => return StreamStep::Stop,
            _ => return StreamStep::Skip,
        }
        // A root `put` carries the full value; anything else is a partial
        // change, so re-read the whole resource.
        if ev.event == "put" {
            if let Ok(p) = serde_json::from_str::<StreamPayload>(&ev.data) {
                if p.path == "/" {
                    return StreamStep::Deliver(p.data);
                }
            }
        }
        match self.read_resource(res).await {
            Ok(v) => StreamStep::Deliver(v),
            Err(e) => {
                warn!(error = %e, path = res.path(), "re-read after change failed");
                StreamStep::Skip
            }
        }
    }
}

enum StreamStep {
    Deliver(Value),
    Skip,
    Stop,
}

fn count_from_value(v: &Value) -> BackendResult<u64> {
    match v {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| BackendError::decode(format!("visitor count is not a count: {n}"))),
        other => Err(BackendError::decode(format!(
            "visitor count is not a number: {other}"
        ))),
    }
}

/// `{ "<key>": {...}, ... }` → records with `id = key`. `null` is empty.
fn records_from_value<T: DeserializeOwned>(
    v: Value,
    set_id: impl Fn(&mut T, RecordId),
) -> BackendResult<Vec<T>> {
    if v.is_null() {
        return Ok(Vec::new());
    }
    let map: BTreeMap<String, T> = serde_json::from_value(v)?;
    Ok(map
        .into_iter()
        .map(|(k, mut rec)| {
            set_id(&mut rec, RecordId::Key(k));
            rec
        })
        .collect())
}

fn notices_from_value(v: Value) -> BackendResult<Vec<Notice>> {
    let mut list = records_from_value(v, |n: &mut Notice, id| n.id = Some(id))?;
    sort_newest_first(&mut list, |n| n.timestamp);
    Ok(list)
}

fn guest_posts_from_value(v: Value) -> BackendResult<Vec<GuestPost>> {
    let mut list = records_from_value(v, |p: &mut GuestPost, id| p.id = Some(id))?;
    sort_newest_first(&mut list, |p| p.timestamp);
    list.truncate(GUEST_POST_LIMIT);
    Ok(list)
}

#[async_trait]
impl BackendAdapter for DocumentStoreAdapter {
    fn name(&self) -> &'static str {
        "document-store"
    }

    async fn init(&self) -> bool {
        let cfg = &self.ctx.config.document_store;
        if cfg.api_key.trim() == PLACEHOLDER_API_KEY {
            warn!("document store still uses the placeholder API key; check the site config");
            return false;
        }
        match reqwest::Url::parse(&self.base) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {
                info!(database = %self.base, "document store configured");
                true
            }
            _ => {
                warn!(database = %self.base, "document store database_url missing or invalid");
                false
            }
        }
    }

    async fn increment_visitor_count(&self) -> BackendResult<u64> {
        // Read-then-write; concurrent visitors may overwrite each other.
        let next = self.read_count().await? + 1;
        self.send_json(reqwest::Method::PUT, PATH_VISITOR_COUNT, &json!(next))
            .await?;
        Ok(next)
    }

    fn subscribe_visitor_count(&self, callback: Callback<u64>) -> Subscription {
        let this = self.clone();
        Subscription::spawn("visitor_count", async move {
            this.listen(Resource::VisitorCount, |v| match count_from_value(&v) {
                Ok(n) => callback(n),
                Err(e) => warn!(error = %e, "bad visitor count in stream"),
            })
            .await
        })
    }

    async fn get_notices(&self) -> BackendResult<Vec<Notice>> {
        notices_from_value(self.read_resource(Resource::Notices).await?)
    }

    fn subscribe_notices(&self, callback: Callback<Vec<Notice>>) -> Subscription {
        let this = self.clone();
        Subscription::spawn("notices", async move {
            this.listen(Resource::Notices, |v| match notices_from_value(v) {
                Ok(list) => callback(list),
                Err(e) => warn!(error = %e, "bad notices in stream"),
            })
            .await
        })
    }

    async fn add_notice(&self, notice: NewNotice) -> BackendResult<RecordId> {
        let body = json!({
            "title": notice.title,
            "content": notice.content,
            "timestamp": notice.timestamp,
            "isAdmin": notice.is_admin,
        });
        let resp = self
            .send_json(reqwest::Method::POST, PATH_NOTICES, &body)
            .await?;
        let pushed: PushResponse = resp.json().await?;
        Ok(RecordId::Key(pushed.name))
    }

    async fn update_notice(&self, id: &RecordId, update: NoticeUpdate) -> BackendResult<()> {
        let body = serde_json::to_value(&update)?;
        self.send_json(
            reqwest::Method::PATCH,
            &format!("{PATH_NOTICES}/{id}"),
            &body,
        )
        .await?;
        Ok(())
    }

    async fn delete_notice(&self, id: &RecordId) -> BackendResult<()> {
        self.remove(&format!("{PATH_NOTICES}/{id}")).await
    }

    async fn get_guest_posts(&self) -> BackendResult<Vec<GuestPost>> {
        guest_posts_from_value(self.read_resource(Resource::GuestPosts).await?)
    }

    fn subscribe_guest_posts(&self, callback: Callback<Vec<GuestPost>>) -> Subscription {
        let this = self.clone();
        Subscription::spawn("guest_posts", async move {
            this.listen(Resource::GuestPosts, |v| match guest_posts_from_value(v) {
                Ok(list) => callback(list),
                Err(e) => warn!(error = %e, "bad guest posts in stream"),
            })
            .await
        })
    }

    async fn add_guest_post(&self, post: NewGuestPost) -> BackendResult<RecordId> {
        let body = json!({
            "author": post.author,
            "content": post.content,
            "timestamp": post.timestamp,
        });
        let resp = self
            .send_json(reqwest::Method::POST, PATH_GUEST_POSTS, &body)
            .await?;
        let pushed: PushResponse = resp.json().await?;
        Ok(RecordId::Key(pushed.name))
    }

    async fn delete_guest_post(&self, id: &RecordId) -> BackendResult<()> {
        self.remove(&format!("{PATH_GUEST_POSTS}/{id}")).await
    }
}
