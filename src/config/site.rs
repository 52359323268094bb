// src/config/site.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "BOARD_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/site.toml";
pub const DEFAULT_JSON_PATH: &str = "config/site.json";

/// Placeholder values shipped in sample configs. A store configured with one of
/// these is treated as "not configured".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";
pub const PLACEHOLDER_SUPABASE_URL: &str = "YOUR_SUPABASE_URL";

fn default_provider() -> String {
    "supabase".to_string()
}
fn default_demo_mode() -> bool {
    true
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_data_path() -> PathBuf {
    PathBuf::from("state/local_store.json")
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_content_path() -> String {
    "content.json".to_string()
}
fn default_branch() -> String {
    "master".to_string()
}
fn default_commit_message() -> String {
    "Update content.json via admin panel".to_string()
}
fn default_admin_secret() -> String {
    "admin12".to_string()
}

/// Which storage strategy to use and whether to skip the network entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    /// "firebase" | "document-store" | "supabase" | "relational-store"
    /// (case-insensitive). Anything else falls back to local storage.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_demo_mode")]
    pub demo_mode: bool,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            demo_mode: default_demo_mode(),
        }
    }
}

/// Realtime document store (Firebase Realtime Database REST API).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStoreSection {
    #[serde(default)]
    pub database_url: String,
    /// "ENV" means: read from FIREBASE_API_KEY.
    #[serde(default)]
    pub api_key: String,
    /// Optional database secret / ID token appended as `?auth=`.
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Realtime relational store (Supabase PostgREST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalStoreSection {
    #[serde(default)]
    pub url: String,
    /// "ENV" means: read from SUPABASE_ANON_KEY.
    #[serde(default)]
    pub anon_key: String,
    /// How often subscriptions re-read their table to detect remote changes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for RelationalStoreSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSection {
    /// JSON file holding the key/value pairs of the local store.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

impl Default for LocalSection {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}

/// Where the admin panel commits `content.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_content_path")]
    pub path: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// "ENV" means: read from GITHUB_TOKEN. Otherwise the token is supplied
    /// interactively and cached in the local store.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            repo: String::new(),
            path: default_content_path(),
            branch: default_branch(),
            commit_message: default_commit_message(),
            token: None,
        }
    }
}

/// Shared admin secret. Compared in-process; it is not a security boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSection {
    #[serde(default = "default_admin_secret")]
    pub secret: String,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            secret: default_admin_secret(),
        }
    }
}

/// Static site configuration, read once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub document_store: DocumentStoreSection,
    #[serde(default)]
    pub relational_store: RelationalStoreSection,
    #[serde(default)]
    pub local: LocalSection,
    #[serde(default)]
    pub publish: PublishSection,
    #[serde(default)]
    pub admin: AdminSection,
}

impl SiteConfig {
    /// Load from an explicit path. TOML or JSON, chosen by extension with a
    /// content sniff as fallback.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading site config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&data, &ext)
            .with_context(|| format!("parsing site config {}", path.display()))?;
        cfg.resolve_env()?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $BOARD_CONFIG_PATH
    /// 2) config/site.toml
    /// 3) config/site.json
    /// 4) defaults (demo mode, local storage only)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
        if toml_p.exists() {
            return Self::load_from_file(&toml_p);
        }
        let json_p = PathBuf::from(DEFAULT_JSON_PATH);
        if json_p.exists() {
            return Self::load_from_file(&json_p);
        }
        Ok(Self::default())
    }

    /// A config that never touches the network, storing into `data_path`.
    pub fn demo(data_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendSection {
                provider: default_provider(),
                demo_mode: true,
            },
            local: LocalSection {
                data_path: data_path.into(),
            },
            ..Self::default()
        }
    }

    fn resolve_env(&mut self) -> Result<()> {
        if is_env_marker(&self.document_store.api_key) {
            self.document_store.api_key = env::var("FIREBASE_API_KEY")
                .map_err(|_| anyhow!("Missing FIREBASE_API_KEY env var"))?;
        }
        if is_env_marker(&self.relational_store.anon_key) {
            self.relational_store.anon_key = env::var("SUPABASE_ANON_KEY")
                .map_err(|_| anyhow!("Missing SUPABASE_ANON_KEY env var"))?;
        }
        if self.publish.token.as_deref().is_some_and(is_env_marker) {
            // A missing GITHUB_TOKEN is not fatal; the admin can enter one later.
            self.publish.token = env::var("GITHUB_TOKEN").ok();
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.backend.provider = self.backend.provider.trim().to_ascii_lowercase();
        self.document_store.database_url = trim_slash(&self.document_store.database_url);
        self.relational_store.url = trim_slash(&self.relational_store.url);
        self.publish.api_base = trim_slash(&self.publish.api_base);
        if self.relational_store.poll_interval_secs == 0 {
            self.relational_store.poll_interval_secs = default_poll_interval_secs();
        }
    }
}

fn is_env_marker(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("env")
}

fn trim_slash(s: &str) -> String {
    s.trim().trim_end_matches('/').to_string()
}

fn parse_config(s: &str, hint_ext: &str) -> Result<SiteConfig> {
    let looks_json = s.trim_start().starts_with('{');
    if hint_ext == "json" || (hint_ext != "toml" && looks_json) {
        return Ok(serde_json::from_str(s)?);
    }
    Ok(toml::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_demo_mode() {
        let cfg = SiteConfig::default();
        assert!(cfg.backend.demo_mode);
        assert_eq!(cfg.publish.branch, "master");
        assert_eq!(cfg.relational_store.poll_interval_secs, 5);
    }

    #[test]
    fn parses_toml_and_json() {
        let toml = r#"
[backend]
provider = " Firebase "
demo_mode = false

[document_store]
database_url = "https://demo-default-rtdb.firebaseio.com/"
api_key = "k"
"#;
        let mut cfg = parse_config(toml, "toml").unwrap();
        cfg.sanitize();
        assert_eq!(cfg.backend.provider, "firebase");
        assert!(!cfg.backend.demo_mode);
        assert_eq!(
            cfg.document_store.database_url,
            "https://demo-default-rtdb.firebaseio.com"
        );

        let json = r#"{"backend":{"provider":"supabase","demo_mode":false},"relational_store":{"url":"https://x.supabase.co","anon_key":"a","poll_interval_secs":0}}"#;
        let mut cfg = parse_config(json, "").unwrap();
        cfg.sanitize();
        assert_eq!(cfg.relational_store.url, "https://x.supabase.co");
        assert_eq!(cfg.relational_store.poll_interval_secs, 5);
    }
}
