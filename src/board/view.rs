//! What the coordinator needs from a front-end.

/// Output side. Implementations must tolerate being called from subscription
/// tasks as well as from the caller's task.
pub trait BoardView: Send + Sync {
    fn render_notices(&self, html: &str);
    fn render_guest_posts(&self, html: &str);
    fn show_visitor_count(&self, count: u64);
}

/// Blocking user dialogs.
pub trait Interaction: Send + Sync {
    fn alert(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
    /// `None` when the user cancels.
    fn prompt(&self, message: &str, default: &str) -> Option<String>;
}
