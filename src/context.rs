//! Process-wide context: configuration, HTTP client, local store and the cached
//! admin token. Built once at startup and handed to every component as an `Arc`.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context as _, Result};
use tracing::warn;

use crate::config::SiteConfig;
use crate::error::BackendResult;
use crate::store::{LocalStore, KEY_GITHUB_TOKEN};

#[derive(Debug)]
pub struct SiteContext {
    pub config: SiteConfig,
    pub http: reqwest::Client,
    pub store: LocalStore,
    token: RwLock<Option<String>>,
}

pub type SharedContext = Arc<SiteContext>;

impl SiteContext {
    /// Build from config: opens the file-backed local store and the HTTP client.
    pub fn from_config(config: SiteConfig) -> Result<SharedContext> {
        let store = LocalStore::open(&config.local.data_path)
            .with_context(|| format!("opening local store {}", config.local.data_path.display()))?;
        let http = build_http_client()?;
        Ok(Arc::new(Self::assemble(config, http, store)))
    }

    /// Same wiring with a caller-supplied store (tests use an in-memory one).
    pub fn with_store(config: SiteConfig, store: LocalStore) -> SharedContext {
        let http = build_http_client().unwrap_or_else(|e| {
            warn!(error = ?e, "falling back to default HTTP client");
            reqwest::Client::new()
        });
        Arc::new(Self::assemble(config, http, store))
    }

    fn assemble(config: SiteConfig, http: reqwest::Client, store: LocalStore) -> Self {
        // Configured token wins; otherwise whatever the admin cached last time.
        let token = config
            .publish
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| store.get_item(KEY_GITHUB_TOKEN))
            .filter(|t| !t.trim().is_empty());
        Self {
            config,
            http,
            store,
            token: RwLock::new(token),
        }
    }

    pub fn admin_token(&self) -> Option<String> {
        self.token.read().expect("token rwlock poisoned").clone()
    }

    /// Cache the publish token in memory and in the local store.
    pub fn set_admin_token(&self, token: &str) -> BackendResult<()> {
        let token = token.trim().to_string();
        self.store.set_item(KEY_GITHUB_TOKEN, token.clone())?;
        *self.token.write().expect("token rwlock poisoned") = Some(token);
        Ok(())
    }

    pub fn has_admin_token(&self) -> bool {
        self.admin_token().is_some()
    }
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("portfolio-board/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .build()
        .context("building HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_cached_in_store() {
        let ctx = SiteContext::with_store(SiteConfig::default(), LocalStore::in_memory());
        assert!(!ctx.has_admin_token());
        ctx.set_admin_token("  ghp_abc  ").unwrap();
        assert_eq!(ctx.admin_token().as_deref(), Some("ghp_abc"));
        assert_eq!(ctx.store.get_item(KEY_GITHUB_TOKEN).as_deref(), Some("ghp_abc"));
    }

    #[test]
    fn cached_token_is_picked_up_on_start() {
        let store = LocalStore::in_memory();
        store.set_item(KEY_GITHUB_TOKEN, "cached").unwrap();
        let ctx = SiteContext::with_store(SiteConfig::default(), store);
        assert_eq!(ctx.admin_token().as_deref(), Some("cached"));
    }
}
