//! Realtime relational store adapter (Supabase PostgREST API).
//!
//! Tables: `visitor_counter (id, count)`, `notices (id, title, content,
//! timestamp, is_admin)`, `guest_posts (id, author, content, timestamp)`.
//! Listeners poll their table on an interval and are also woken right after
//! any write made through this adapter; a callback only fires when the
//! materialised collection actually changed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{BackendAdapter, Callback, Subscription};
use crate::config::site::PLACEHOLDER_SUPABASE_URL;
use crate::context::SharedContext;
use crate::error::{check_status, BackendError, BackendResult};
use crate::model::{
    sort_newest_first, GuestPost, NewGuestPost, NewNotice, Notice, NoticeUpdate, RecordId,
    GUEST_POST_LIMIT,
};

const TABLE_COUNTER: &str = "visitor_counter";
const TABLE_NOTICES: &str = "notices";
const TABLE_GUEST_POSTS: &str = "guest_posts";
const RPC_INCREMENT: &str = "rpc/increment_visitor_count";
const COUNTER_ROW_ID: i64 = 1;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bumped after every successful write, per table.
#[derive(Debug)]
struct ChangeSignals {
    counter: watch::Sender<u64>,
    notices: watch::Sender<u64>,
    guest_posts: watch::Sender<u64>,
}

impl ChangeSignals {
    fn new() -> Self {
        Self {
            counter: watch::channel(0).0,
            notices: watch::channel(0).0,
            guest_posts: watch::channel(0).0,
        }
    }

    fn bump(tx: &watch::Sender<u64>) {
        tx.send_modify(|v| *v = v.wrapping_add(1));
    }
}

#[derive(Clone)]
pub struct RelationalStoreAdapter {
    ctx: SharedContext,
    base: String,
    key: String,
    poll_every: Duration,
    signals: Arc<ChangeSignals>,
}

#[derive(Deserialize)]
struct CounterRow {
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct InsertedRow {
    id: RecordId,
}

impl RelationalStoreAdapter {
    pub fn new(ctx: SharedContext) -> Self {
        let cfg = &ctx.config.relational_store;
        let base = cfg.url.trim().trim_end_matches('/').to_string();
        let key = cfg.anon_key.trim().to_string();
        let poll_every = Duration::from_secs(cfg.poll_interval_secs.max(1));
        Self {
            ctx,
            base,
            key,
            poll_every,
            signals: Arc::new(ChangeSignals::new()),
        }
    }

    /// Override the polling period (tests use milliseconds).
    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_every = every;
        self
    }

    fn rest(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.ctx
            .http
            .request(method, self.rest(path))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .timeout(REQUEST_TIMEOUT)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> BackendResult<Vec<T>> {
        let resp = self
            .request(reqwest::Method::GET, table)
            .query(&[("select", "*")])
            .query(query)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<Vec<T>>().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<RecordId> {
        let resp = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&json!([row]))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let rows: Vec<InsertedRow> = resp.json().await?;
        rows.into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| BackendError::decode(format!("insert into {table} returned no row")))
    }

    async fn delete_where_id(&self, table: &str, id: &RecordId) -> BackendResult<()> {
        let resp = self
            .request(reqwest::Method::DELETE, table)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn read_count(&self) -> BackendResult<u64> {
        let rows: Vec<CounterRow> = self
            .select(TABLE_COUNTER, &[("id", format!("eq.{COUNTER_ROW_ID}"))])
            .await?;
        Ok(rows.first().and_then(|r| r.count).unwrap_or(0))
    }

    /// Fallback when the `increment_visitor_count` function is not installed.
    async fn increment_by_upsert(&self) -> BackendResult<u64> {
        let next = self.read_count().await? + 1;
        let resp = self
            .request(reqwest::Method::POST, TABLE_COUNTER)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!({ "id": COUNTER_ROW_ID, "count": next }))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(next)
    }

    /// Poll `load` every `poll_every` (or as soon as `signal` moves) and hand
    /// changed results to `callback`.
    fn poll<T, F, Fut>(
        &self,
        resource: &'static str,
        signal: &watch::Sender<u64>,
        load: F,
        callback: Callback<T>,
    ) -> Subscription
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn(RelationalStoreAdapter) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = BackendResult<T>> + Send + 'static,
    {
        let this = self.clone();
        let mut changed = signal.subscribe();
        let every = self.poll_every;
        Subscription::spawn(resource, async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<T> = None;
            loop {
                match load(this.clone()).await {
                    Ok(v) if last.as_ref() != Some(&v) => {
                        last = Some(v.clone());
                        callback(v);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, resource, "poll failed"),
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    res = changed.changed() => {
                        if res.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

fn notices_query() -> Vec<(&'static str, String)> {
    vec![("order", "timestamp.desc".to_string())]
}

fn guest_posts_query() -> Vec<(&'static str, String)> {
    vec![
        ("order", "timestamp.desc".to_string()),
        ("limit", GUEST_POST_LIMIT.to_string()),
    ]
}

#[async_trait]
impl BackendAdapter for RelationalStoreAdapter {
    fn name(&self) -> &'static str {
        "relational-store"
    }

    async fn init(&self) -> bool {
        if self.base.is_empty() || self.base == PLACEHOLDER_SUPABASE_URL {
            warn!("relational store url is not configured; check the site config");
            return false;
        }
        if self.key.is_empty() {
            warn!("relational store anon key is missing");
            return false;
        }
        match reqwest::Url::parse(&self.base) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {
                info!(url = %self.base, "relational store configured");
                true
            }
            _ => {
                warn!(url = %self.base, "relational store url is invalid");
                false
            }
        }
    }

    async fn increment_visitor_count(&self) -> BackendResult<u64> {
        let rpc = async {
            let resp = self
                .request(reqwest::Method::POST, RPC_INCREMENT)
                .json(&json!({}))
                .send()
                .await?;
            let resp = check_status(resp).await?;
            let v: Value = resp.json().await?;
            v.as_u64()
                .ok_or_else(|| BackendError::decode(format!("rpc returned {v}")))
        };
        let next = match rpc.await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "increment rpc unavailable, updating the row directly");
                self.increment_by_upsert().await?
            }
        };
        ChangeSignals::bump(&self.signals.counter);
        Ok(next)
    }

    fn subscribe_visitor_count(&self, callback: Callback<u64>) -> Subscription {
        self.poll(
            "visitor_count",
            &self.signals.counter,
            |a| async move { a.read_count().await },
            callback,
        )
    }

    async fn get_notices(&self) -> BackendResult<Vec<Notice>> {
        let mut rows: Vec<Notice> = self.select(TABLE_NOTICES, &notices_query()).await?;
        sort_newest_first(&mut rows, |n| n.timestamp);
        Ok(rows)
    }

    fn subscribe_notices(&self, callback: Callback<Vec<Notice>>) -> Subscription {
        self.poll(
            "notices",
            &self.signals.notices,
            |a| async move { a.get_notices().await },
            callback,
        )
    }

    async fn add_notice(&self, notice: NewNotice) -> BackendResult<RecordId> {
        debug!(table = TABLE_NOTICES, "inserting notice");
        let id = self
            .insert(
                TABLE_NOTICES,
                json!({
                    "title": notice.title,
                    "content": notice.content,
                    "timestamp": notice.timestamp,
                    "is_admin": notice.is_admin,
                }),
            )
            .await?;
        ChangeSignals::bump(&self.signals.notices);
        Ok(id)
    }

    async fn update_notice(&self, id: &RecordId, update: NoticeUpdate) -> BackendResult<()> {
        let resp = self
            .request(reqwest::Method::PATCH, TABLE_NOTICES)
            .query(&[("id", format!("eq.{id}"))])
            .json(&update)
            .send()
            .await?;
        check_status(resp).await?;
        ChangeSignals::bump(&self.signals.notices);
        Ok(())
    }

    async fn delete_notice(&self, id: &RecordId) -> BackendResult<()> {
        self.delete_where_id(TABLE_NOTICES, id).await?;
        ChangeSignals::bump(&self.signals.notices);
        Ok(())
    }

    async fn get_guest_posts(&self) -> BackendResult<Vec<GuestPost>> {
        let mut rows: Vec<GuestPost> = self.select(TABLE_GUEST_POSTS, &guest_posts_query()).await?;
        sort_newest_first(&mut rows, |p| p.timestamp);
        rows.truncate(GUEST_POST_LIMIT);
        Ok(rows)
    }

    fn subscribe_guest_posts(&self, callback: Callback<Vec<GuestPost>>) -> Subscription {
        self.poll(
            "guest_posts",
            &self.signals.guest_posts,
            |a| async move { a.get_guest_posts().await },
            callback,
        )
    }

    async fn add_guest_post(&self, post: NewGuestPost) -> BackendResult<RecordId> {
        debug!(table = TABLE_GUEST_POSTS, "inserting guest post");
        let id = self
            .insert(
                TABLE_GUEST_POSTS,
                json!({
                    "author": post.author,
                    "content": post.content,
                    "timestamp": post.timestamp,
                }),
            )
            .await?;
        ChangeSignals::bump(&self.signals.guest_posts);
        Ok(id)
    }

    async fn delete_guest_post(&self, id: &RecordId) -> BackendResult<()> {
        self.delete_where_id(TABLE_GUEST_POSTS, id).await?;
        ChangeSignals::bump(&self.signals.guest_posts);
        Ok(())
    }
}
