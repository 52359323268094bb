//! Backend adapters: one interface over the hosted realtime stores and the
//! local fallback.
//!
//! The two hosted stores disagree on how change notification works (key-path
//! event streams vs. table polling). Every adapter hides that and hands
//! listeners the materialised value or collection, newest-first.

pub mod document_store;
pub mod local;
pub mod relational_store;
pub mod sse;
pub mod subscription;

use async_trait::async_trait;

use crate::context::SharedContext;
use crate::error::BackendResult;
use crate::model::{GuestPost, NewGuestPost, NewNotice, Notice, NoticeUpdate, RecordId};

pub use document_store::DocumentStoreAdapter;
pub use local::LocalAdapter;
pub use relational_store::RelationalStoreAdapter;
pub use subscription::{Callback, Subscription};

/// Capability set every storage strategy provides.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Short name for logs ("document-store", "relational-store", "local").
    fn name(&self) -> &'static str;

    /// Check that the store is configured. Never errors; `false` means
    /// "fall back to local storage".
    async fn init(&self) -> bool;

    /// Read, add one, persist, return the new value. Absent counter reads as 0.
    async fn increment_visitor_count(&self) -> BackendResult<u64>;
    fn subscribe_visitor_count(&self, callback: Callback<u64>) -> Subscription;

    /// Newest first.
    async fn get_notices(&self) -> BackendResult<Vec<Notice>>;
    fn subscribe_notices(&self, callback: Callback<Vec<Notice>>) -> Subscription;
    async fn add_notice(&self, notice: NewNotice) -> BackendResult<RecordId>;
    /// Best-effort; a store may answer [`BackendError::Unsupported`](crate::error::BackendError::Unsupported).
    async fn update_notice(&self, id: &RecordId, update: NoticeUpdate) -> BackendResult<()>;
    /// Deleting an id that does not exist succeeds.
    async fn delete_notice(&self, id: &RecordId) -> BackendResult<()>;

    /// Newest first; hosted stores cap this at [`GUEST_POST_LIMIT`](crate::model::GUEST_POST_LIMIT).
    async fn get_guest_posts(&self) -> BackendResult<Vec<GuestPost>>;
    fn subscribe_guest_posts(&self, callback: Callback<Vec<GuestPost>>) -> Subscription;
    async fn add_guest_post(&self, post: NewGuestPost) -> BackendResult<RecordId>;
    async fn delete_guest_post(&self, id: &RecordId) -> BackendResult<()>;
}

/// Provider names accepted in `backend.provider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    DocumentStore,
    RelationalStore,
    Unknown(String),
}

impl Provider {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "firebase" | "document-store" | "document_store" => Provider::DocumentStore,
            "supabase" | "relational-store" | "relational_store" => Provider::RelationalStore,
            other => Provider::Unknown(other.to_string()),
        }
    }
}

/// The storage strategy picked once at startup.
#[derive(Clone)]
pub enum Backend {
    DocumentStore(DocumentStoreAdapter),
    RelationalStore(RelationalStoreAdapter),
    Local(LocalAdapter),
}

impl Backend {
    /// Build the adapter for a recognised provider. `None` for unknown names.
    pub fn for_provider(provider: &Provider, ctx: &SharedContext) -> Option<Self> {
        match provider {
            Provider::DocumentStore => {
                Some(Backend::DocumentStore(DocumentStoreAdapter::new(ctx.clone())))
            }
            Provider::RelationalStore => Some(Backend::RelationalStore(
                RelationalStoreAdapter::new(ctx.clone()),
            )),
            Provider::Unknown(_) => None,
        }
    }

    pub fn local(ctx: &SharedContext) -> Self {
        Backend::Local(LocalAdapter::new(ctx.clone()))
    }

    pub fn adapter(&self) -> &dyn BackendAdapter {
        match self {
            Backend::DocumentStore(a) => a,
            Backend::RelationalStore(a) => a,
            Backend::Local(a) => a,
        }
    }
}
