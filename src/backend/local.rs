//! Local fallback: every board operation against the [`LocalStore`](crate::store::LocalStore),
//! no network. Lists are read, modified and written back whole.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::{BackendAdapter, Callback, Subscription};
use crate::context::SharedContext;
use crate::error::{BackendError, BackendResult};
use crate::model::{
    sort_newest_first, GuestPost, NewGuestPost, NewNotice, Notice, NoticeUpdate, RecordId,
};
use crate::store::{KEY_GUEST_POSTS, KEY_NOTICES, KEY_VISITOR_COUNT};

#[derive(Clone)]
pub struct LocalAdapter {
    ctx: SharedContext,
}

impl LocalAdapter {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    /// Current counter without incrementing.
    pub fn visitor_count(&self) -> u64 {
        self.ctx
            .store
            .get_item(KEY_VISITOR_COUNT)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> BackendResult<Vec<T>> {
        match self.ctx.store.get_item(key) {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| BackendError::storage(format!("{key} is not a valid list: {e}"))),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> BackendResult<()> {
        let raw = serde_json::to_string(items)?;
        self.ctx.store.set_item(key, raw)
    }

    fn notices(&self) -> BackendResult<Vec<Notice>> {
        let mut v: Vec<Notice> = self.read_list(KEY_NOTICES)?;
        sort_newest_first(&mut v, |n| n.timestamp);
        Ok(v)
    }

    fn guest_posts(&self) -> BackendResult<Vec<GuestPost>> {
        let mut v: Vec<GuestPost> = self.read_list(KEY_GUEST_POSTS)?;
        sort_newest_first(&mut v, |p| p.timestamp);
        Ok(v)
    }

    /// Spawn a listener that delivers `load()` now and after every write to `key`.
    fn watch_key<T, L>(
        &self,
        resource: &'static str,
        key: &'static str,
        load: L,
        callback: Callback<T>,
    ) -> Subscription
    where
        T: Send + 'static,
        L: Fn(&LocalAdapter) -> BackendResult<T> + Send + 'static,
    {
        let this = self.clone();
        let mut rx = self.ctx.store.watch();
        Subscription::spawn(resource, async move {
            match load(&this) {
                Ok(v) => callback(v),
                Err(e) => warn!(error = %e, resource, "initial local read failed"),
            }
            loop {
                match rx.recv().await {
                    Ok(changed) if changed != key => continue,
                    Ok(_) | Err(RecvError::Lagged(_)) => match load(&this) {
                        Ok(v) => callback(v),
                        Err(e) => warn!(error = %e, resource, "local read failed"),
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Generation timestamp, bumped until it is unique among `taken`.
fn fresh_id(taken: impl Iterator<Item = Option<RecordId>>, ts: i64) -> RecordId {
    let used: std::collections::HashSet<RecordId> = taken.flatten().collect();
    let mut n = ts;
    while used.contains(&RecordId::Num(n)) {
        n += 1;
    }
    RecordId::Num(n)
}

#[async_trait]
impl BackendAdapter for LocalAdapter {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn init(&self) -> bool {
        true
    }

    async fn increment_visitor_count(&self) -> BackendResult<u64> {
        let next = self.visitor_count() + 1;
        self.ctx.store.set_item(KEY_VISITOR_COUNT, next.to_string())?;
        debug!(count = next, "local visitor count incremented");
        Ok(next)
    }

    fn subscribe_visitor_count(&self, callback: Callback<u64>) -> Subscription {
        self.watch_key(
            "visitor_count",
            KEY_VISITOR_COUNT,
            |a| Ok(a.visitor_count()),
            callback,
        )
    }

    async fn get_notices(&self) -> BackendResult<Vec<Notice>> {
        self.notices()
    }

    fn subscribe_notices(&self, callback: Callback<Vec<Notice>>) -> Subscription {
        self.watch_key("notices", KEY_NOTICES, |a| a.notices(), callback)
    }

    async fn add_notice(&self, notice: NewNotice) -> BackendResult<RecordId> {
        let mut list = self.notices()?;
        let id = fresh_id(list.iter().map(|n| n.id.clone()), notice.timestamp);
        list.insert(0, notice.into_notice(id.clone()));
        self.write_list(KEY_NOTICES, &list)?;
        Ok(id)
    }

    async fn update_notice(&self, id: &RecordId, update: NoticeUpdate) -> BackendResult<()> {
        let mut list = self.notices()?;
        let Some(n) = list.iter_mut().find(|n| n.id.as_ref() == Some(id)) else {
            debug!(%id, "update of unknown local notice ignored");
            return Ok(());
        };
        n.title = update.title;
        n.content = update.content;
        self.write_list(KEY_NOTICES, &list)
    }

    async fn delete_notice(&self, id: &RecordId) -> BackendResult<()> {
        let mut list = self.notices()?;
        list.retain(|n| n.id.as_ref() != Some(id));
        self.write_list(KEY_NOTICES, &list)
    }

    async fn get_guest_posts(&self) -> BackendResult<Vec<GuestPost>> {
        self.guest_posts()
    }

    fn subscribe_guest_posts(&self, callback: Callback<Vec<GuestPost>>) -> Subscription {
        self.watch_key("guest_posts", KEY_GUEST_POSTS, |a| a.guest_posts(), callback)
    }

    async fn add_guest_post(&self, post: NewGuestPost) -> BackendResult<RecordId> {
        let mut list = self.guest_posts()?;
        let id = fresh_id(list.iter().map(|p| p.id.clone()), post.timestamp);
        list.insert(0, post.into_post(id.clone()));
        self.write_list(KEY_GUEST_POSTS, &list)?;
        Ok(id)
    }

    async fn delete_guest_post(&self, id: &RecordId) -> BackendResult<()> {
        let mut list = self.guest_posts()?;
        list.retain(|p| p.id.as_ref() != Some(id));
        self.write_list(KEY_GUEST_POSTS, &list)
    }
}
