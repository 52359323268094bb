//! Board coordinator: picks the storage strategy once at startup, keeps the
//! latest notices / guest posts / visitor count, and re-renders them through a
//! [`BoardView`] whenever they change.

pub mod render;
pub mod view;

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::backend::{Backend, Provider, Subscription};
use crate::context::SharedContext;
use crate::error::BackendResult;
use crate::metrics;
use crate::model::{
    now_millis, GuestPost, NewGuestPost, NewNotice, Notice, NoticeUpdate, RecordId,
    ANONYMOUS_AUTHOR,
};

pub use view::{BoardView, Interaction};

pub const MSG_EMPTY_CONTENT: &str = "Please enter a message.";
pub const MSG_NOTICE_FIELDS: &str = "Please enter both a title and content.";
pub const MSG_POST_FAILED: &str = "Could not post your message. Please try again.";
pub const MSG_NOTICE_ADD_FAILED: &str = "Could not add the notice.";
pub const MSG_NOTICE_UPDATE_FAILED: &str = "Could not update the notice.";
pub const MSG_NOTICE_DELETE_FAILED: &str = "Could not delete the notice.";
pub const MSG_POST_DELETE_FAILED: &str = "Could not delete the guest post.";
pub const CONFIRM_DELETE_NOTICE: &str = "Delete this notice?";
pub const CONFIRM_DELETE_POST: &str = "Delete this guest post?";

/// `Uninitialized → (DemoMode | BackendMode) → Ready`. Nothing leaves Ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    Uninitialized,
    DemoMode,
    BackendMode,
    Ready,
}

/// Short anonymised digest for logging visitor-written text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, Default)]
struct Snapshot {
    notices: Vec<Notice>,
    guest_posts: Vec<GuestPost>,
    visitor_count: u64,
    admin: bool,
}

/// State shared with subscription callbacks.
struct Shared {
    snapshot: Mutex<Snapshot>,
    view: Arc<dyn BoardView>,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.snapshot.lock().expect("board snapshot poisoned")
    }

    fn set_notices(&self, notices: Vec<Notice>) {
        let html = {
            let mut s = self.lock();
            s.notices = notices;
            render::render_notices(&s.notices, s.admin, now_millis())
        };
        self.view.render_notices(&html);
    }

    fn set_guest_posts(&self, posts: Vec<GuestPost>) {
        let html = {
            let mut s = self.lock();
            s.guest_posts = posts;
            render::render_guest_posts(&s.guest_posts, s.admin, now_millis())
        };
        self.view.render_guest_posts(&html);
    }

    fn set_visitor_count(&self, count: u64) {
        self.lock().visitor_count = count;
        self.view.show_visitor_count(count);
    }

    fn set_admin(&self, admin: bool) {
        let (notices, posts) = {
            let mut s = self.lock();
            s.admin = admin;
            let now = now_millis();
            (
                render::render_notices(&s.notices, admin, now),
                render::render_guest_posts(&s.guest_posts, admin, now),
            )
        };
        self.view.render_notices(&notices);
        self.view.render_guest_posts(&posts);
    }
}

pub struct BoardCoordinator {
    ctx: SharedContext,
    interaction: Arc<dyn Interaction>,
    shared: Arc<Shared>,
    backend: Backend,
    state: BoardState,
    demo: bool,
    subscriptions: Vec<Subscription>,
}

impl BoardCoordinator {
    /// Until [`start`](Self::start) runs, operations go to local storage.
    pub fn new(
        ctx: SharedContext,
        view: Arc<dyn BoardView>,
        interaction: Arc<dyn Interaction>,
    ) -> Self {
        let backend = Backend::local(&ctx);
        Self {
            ctx,
            interaction,
            shared: Arc::new(Shared {
                snapshot: Mutex::new(Snapshot::default()),
                view,
            }),
            backend,
            state: BoardState::Uninitialized,
            demo: false,
            subscriptions: Vec::new(),
        }
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    /// True once start() settled on local storage.
    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.adapter().name()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.shared.lock().notices.clone()
    }

    pub fn guest_posts(&self) -> Vec<GuestPost> {
        self.shared.lock().guest_posts.clone()
    }

    pub fn visitor_count(&self) -> u64 {
        self.shared.lock().visitor_count
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn transition(&mut self, next: BoardState) {
        debug!(from = ?self.state, to = ?next, "board state");
        self.state = next;
    }

    /// Choose the strategy and bring the board to Ready. Calling it again is
    /// a no-op.
    pub async fn start(&mut self) -> BoardState {
        if self.state != BoardState::Uninitialized {
            return self.state;
        }
        let ctx = self.ctx.clone();
        let cfg = &ctx.config.backend;

        let fallback = if cfg.demo_mode {
            info!("demo mode enabled; using local storage");
            Some("demo_flag")
        } else {
            let provider = Provider::parse(&cfg.provider);
            match Backend::for_provider(&provider, &ctx) {
                None => {
                    error!(provider = %cfg.provider, "unknown backend provider");
                    Some("unknown_provider")
                }
                Some(backend) => {
                    if backend.adapter().init().await {
                        info!(backend = backend.adapter().name(), "backend initialised");
                        self.backend = backend;
                        None
                    } else {
                        warn!(provider = %cfg.provider, "backend init failed; switching to demo mode");
                        Some("init_failed")
                    }
                }
            }
        };

        match fallback {
            Some(reason) => self.enter_demo(reason).await,
            None => self.enter_backend().await,
        }
        self.transition(BoardState::Ready);
        self.state
    }

    async fn enter_demo(&mut self, reason: &'static str) {
        self.transition(BoardState::DemoMode);
        metrics::record_fallback(reason);
        self.demo = true;
        self.backend = Backend::local(&self.ctx);

        let adapter = self.backend.adapter();
        match adapter.increment_visitor_count().await {
            Ok(n) => {
                metrics::record_visitor_increment(true);
                self.shared.set_visitor_count(n);
            }
            Err(e) => {
                metrics::record_visitor_increment(false);
                warn!(error = %e, "local visitor count not updated");
            }
        }
        self.refresh_notices().await;
        self.refresh_guest_posts().await;
    }

    async fn enter_backend(&mut self) {
        self.transition(BoardState::BackendMode);
        let adapter = self.backend.adapter();

        match adapter.increment_visitor_count().await {
            Ok(n) => {
                metrics::record_visitor_increment(true);
                self.shared.set_visitor_count(n);
            }
            Err(e) => {
                metrics::record_visitor_increment(false);
                error!(error = %e, backend = adapter.name(), "visitor counter init failed");
            }
        }

        let shared = self.shared.clone();
        let count = adapter.subscribe_visitor_count(Arc::new(move |n| shared.set_visitor_count(n)));
        let shared = self.shared.clone();
        let notices = adapter.subscribe_notices(Arc::new(move |v| shared.set_notices(v)));
        let shared = self.shared.clone();
        let posts = adapter.subscribe_guest_posts(Arc::new(move |v| shared.set_guest_posts(v)));
        self.subscriptions.extend([count, notices, posts]);
        info!(backend = adapter.name(), "realtime listeners attached");
    }

    async fn refresh_notices(&self) {
        match self.backend.adapter().get_notices().await {
            Ok(v) => self.shared.set_notices(v),
            Err(e) => warn!(error = %e, "could not reload notices"),
        }
    }

    async fn refresh_guest_posts(&self) {
        match self.backend.adapter().get_guest_posts().await {
            Ok(v) => self.shared.set_guest_posts(v),
            Err(e) => warn!(error = %e, "could not reload guest posts"),
        }
    }

    fn report(&self, op: &'static str, res: BackendResult<()>, failure: &str) -> bool {
        match res {
            Ok(()) => {
                metrics::record_mutation(op, true);
                true
            }
            Err(e) => {
                metrics::record_mutation(op, false);
                error!(op, error = %e, backend = self.backend_name(), "board mutation failed");
                self.interaction.alert(failure);
                false
            }
        }
    }

    pub async fn submit_guest_post(&self, author: &str, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            self.interaction.alert(MSG_EMPTY_CONTENT);
            return false;
        }
        let author = match author.trim() {
            "" => ANONYMOUS_AUTHOR,
            a => a,
        };
        debug!(author = %anon_hash(author), content = %anon_hash(content), "guest post submitted");

        let post = NewGuestPost {
            author: author.to_string(),
            content: content.to_string(),
            timestamp: now_millis(),
        };
        let res = self.backend.adapter().add_guest_post(post).await.map(|_| ());
        if !self.report("add_guest_post", res, MSG_POST_FAILED) {
            return false;
        }
        self.refresh_guest_posts().await;
        true
    }

    pub async fn add_notice(&self, title: &str, content: &str) -> bool {
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            self.interaction.alert(MSG_NOTICE_FIELDS);
            return false;
        }
        let notice = NewNotice {
            title: title.to_string(),
            content: content.to_string(),
            timestamp: now_millis(),
            is_admin: true,
        };
        let res = self.backend.adapter().add_notice(notice).await.map(|id| {
            info!(%id, "notice added");
        });
        if !self.report("add_notice", res, MSG_NOTICE_ADD_FAILED) {
            return false;
        }
        self.refresh_notices().await;
        true
    }

    pub async fn update_notice(&self, id: &RecordId, title: &str, content: &str) -> bool {
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            self.interaction.alert(MSG_NOTICE_FIELDS);
            return false;
        }
        let update = NoticeUpdate {
            title: title.to_string(),
            content: content.to_string(),
        };
        let res = self.backend.adapter().update_notice(id, update).await;
        if !self.report("update_notice", res, MSG_NOTICE_UPDATE_FAILED) {
            return false;
        }
        self.refresh_notices().await;
        true
    }

    /// Prompt for a new title and content (pre-filled with the current ones)
    /// and update the notice. Cancelling either prompt changes nothing.
    pub async fn edit_notice(&self, id: &RecordId) -> bool {
        let current = self
            .notices()
            .into_iter()
            .find(|n| n.id.as_ref() == Some(id));
        let Some(current) = current else {
            debug!(%id, "edit requested for unknown notice");
            return false;
        };
        let title = match self.interaction.prompt("Notice title:", &current.title) {
            Some(t) if !t.trim().is_empty() => t,
            _ => return false,
        };
        let content = match self.interaction.prompt("Notice content:", &current.content) {
            Some(c) if !c.trim().is_empty() => c,
            _ => return false,
        };
        self.update_notice(id, &title, &content).await
    }

    pub async fn delete_notice(&self, id: &RecordId) -> bool {
        if !self.interaction.confirm(CONFIRM_DELETE_NOTICE) {
            return false;
        }
        let res = self.backend.adapter().delete_notice(id).await;
        if !self.report("delete_notice", res, MSG_NOTICE_DELETE_FAILED) {
            return false;
        }
        self.refresh_notices().await;
        true
    }

    pub async fn delete_guest_post(&self, id: &RecordId) -> bool {
        if !self.interaction.confirm(CONFIRM_DELETE_POST) {
            return false;
        }
        let res = self.backend.adapter().delete_guest_post(id).await;
        if !self.report("delete_guest_post", res, MSG_POST_DELETE_FAILED) {
            return false;
        }
        self.refresh_guest_posts().await;
        true
    }

    /// Toggle admin controls in the rendered lists.
    pub fn set_admin_mode(&self, admin: bool) {
        self.shared.set_admin(admin);
    }

    /// Close every listener. Returns how many were still attached.
    pub fn cleanup(&mut self) -> usize {
        let closed = self
            .subscriptions
            .drain(..)
            .map(|mut s| s.close())
            .filter(|&was_open| was_open)
            .count();
        if closed > 0 {
            info!(closed, "board listeners closed");
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("hello");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("hello"));
        assert_ne!(a, anon_hash("hello "));
    }
}
