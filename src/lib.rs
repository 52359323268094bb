// src/lib.rs
// Public library surface for the console front-end, the demo binary and integration tests.

pub mod backend;
pub mod board;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod metrics;
pub mod model;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::backend::{Backend, BackendAdapter, Provider, Subscription};
pub use crate::board::{BoardCoordinator, BoardState, BoardView, Interaction};
pub use crate::config::SiteConfig;
pub use crate::content::{AdminMode, ContentDocument, ContentError, PublishError};
pub use crate::context::{SharedContext, SiteContext};
pub use crate::error::{BackendError, BackendResult};
pub use crate::store::LocalStore;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Env var consulted (before `RUST_LOG`) for the log filter.
pub const ENV_LOG_FILTER: &str = "BOARD_LOG";
const DEFAULT_LOG_FILTER: &str = "portfolio_board=info,warn";

/// Install the global tracing subscriber (compact fmt + EnvFilter).
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = std::env::var(ENV_LOG_FILTER)
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}
