//! Demo that runs a scripted session against local storage (no network) and prints what the page would show.

use std::sync::Arc;

use portfolio_board::{BoardCoordinator, BoardView, Interaction, SiteConfig, SiteContext};

struct Stdout;

impl BoardView for Stdout {
    fn render_notices(&self, html: &str) {
        println!("notices: {html}");
    }
    fn render_guest_posts(&self, html: &str) {
        println!("guest posts: {html}");
    }
    fn show_visitor_count(&self, count: u64) {
        println!("visitors: {count}");
    }
}

/// Says yes to everything.
struct AutoConfirm;

impl Interaction for AutoConfirm {
    fn alert(&self, message: &str) {
        println!("alert: {message}");
    }
    fn confirm(&self, _message: &str) -> bool {
        true
    }
    fn prompt(&self, _message: &str, default: &str) -> Option<String> {
        Some(default.to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let dir = std::env::temp_dir().join("portfolio-board-demo");
    let ctx = SiteContext::from_config(SiteConfig::demo(dir.join("local_store.json")))?;
    let mut board = BoardCoordinator::new(ctx, Arc::new(Stdout), Arc::new(AutoConfirm));
    board.start().await;

    board.submit_guest_post("", "   ").await;
    board.submit_guest_post("", "first visit!").await;
    board.add_notice("Welcome", "The guest book is open.").await;
    board.set_admin_mode(true);

    if let Some(id) = board.guest_posts().first().and_then(|p| p.id.clone()) {
        board.delete_guest_post(&id).await;
    }

    board.cleanup();
    println!("board-demo done (state kept in {})", dir.display());
    Ok(())
}
