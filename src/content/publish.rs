//! Publish `content.json` through the GitHub contents API: read the current
//! blob sha, then PUT the new base64 body against it.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::ContentDocument;
use crate::context::SharedContext;
use crate::metrics;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("no GitHub token configured; set one first")]
    MissingToken,
    #[error("nothing saved yet; save the page before publishing")]
    NothingSaved,
    #[error("the GitHub token is invalid (401); set a new one")]
    Unauthorized,
    #[error("the token lacks permission (403); it needs the repo scope")]
    Forbidden,
    #[error("file or repository not found (404); check owner/repo/path")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

impl PublishError {
    fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::Other(format!("{status} - {message}")),
        }
    }

    /// Label for the `content_publish_total` counter.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::NothingSaved => "nothing_saved",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Other(_) => "error",
        }
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(s) => Self::from_status(s.as_u16(), e.to_string()),
            None => Self::Other(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// First seven characters of the new commit.
    pub commit_sha: String,
    pub site_url: String,
}

#[derive(Deserialize)]
struct FileInfo {
    sha: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct UpdateResponse {
    commit: CommitInfo,
}

#[derive(Deserialize)]
struct CommitInfo {
    sha: String,
}

#[derive(Deserialize)]
struct GithubMessage {
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct Publisher {
    ctx: SharedContext,
}

impl Publisher {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    fn contents_url(&self) -> String {
        let p = &self.ctx.config.publish;
        format!(
            "{}/repos/{}/{}/contents/{}",
            p.api_base.trim_end_matches('/'),
            p.owner,
            p.repo,
            p.path.trim_start_matches('/')
        )
    }

    /// `https://<owner>.github.io/<repo>/`
    pub fn site_url(&self) -> String {
        let p = &self.ctx.config.publish;
        format!("https://{}.github.io/{}/", p.owner.to_lowercase(), p.repo)
    }

    /// Publish with the cached admin token.
    pub async fn publish(&self, doc: &ContentDocument) -> Result<PublishOutcome, PublishError> {
        let res = match self.ctx.admin_token() {
            Some(token) => self.publish_with(doc, &token).await,
            None => Err(PublishError::MissingToken),
        };
        match &res {
            Ok(out) => {
                metrics::record_publish("ok");
                info!(commit = %out.commit_sha, "content published");
            }
            Err(e) => {
                metrics::record_publish(e.metric_label());
                warn!(error = %e, "content publish failed");
            }
        }
        res
    }

    async fn publish_with(
        &self,
        doc: &ContentDocument,
        token: &str,
    ) -> Result<PublishOutcome, PublishError> {
        let url = self.contents_url();
        let auth = format!("token {token}");

        let resp = self
            .ctx
            .http
            .get(&url)
            .header("Authorization", &auth)
            .header("Accept", ACCEPT_V3)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let resp = error_for_status(resp).await?;
        let current: FileInfo = resp.json().await?;

        let body = doc
            .to_pretty_json()
            .map_err(|e| PublishError::Other(e.to_string()))?;
        let p = &self.ctx.config.publish;
        let req = UpdateRequest {
            message: &p.commit_message,
            content: BASE64.encode(body.as_bytes()),
            sha: &current.sha,
            branch: &p.branch,
        };

        let resp = self
            .ctx
            .http
            .put(&url)
            .header("Authorization", &auth)
            .header("Accept", ACCEPT_V3)
            .json(&req)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let resp = error_for_status(resp).await?;
        let done: UpdateResponse = resp.json().await?;

        Ok(PublishOutcome {
            commit_sha: done.commit.sha.chars().take(7).collect(),
            site_url: self.site_url(),
        })
    }
}

/// Map a non-2xx answer to a [`PublishError`], keeping GitHub's `message`.
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, PublishError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GithubMessage>(&text)
        .map(|m| m.message)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(PublishError::from_status(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::context::SiteContext;
    use crate::store::LocalStore;

    #[test]
    fn status_classification() {
        assert_eq!(PublishError::from_status(401, "x".into()), PublishError::Unauthorized);
        assert_eq!(PublishError::from_status(403, "x".into()), PublishError::Forbidden);
        assert_eq!(PublishError::from_status(404, "x".into()), PublishError::NotFound);
        assert_eq!(
            PublishError::from_status(409, "sha mismatch".into()),
            PublishError::Other("409 - sha mismatch".into())
        );
    }

    #[test]
    fn site_url_lowercases_owner() {
        let mut cfg = SiteConfig::default();
        cfg.publish.owner = "SomeOwner".into();
        cfg.publish.repo = "web".into();
        let p = Publisher::new(SiteContext::with_store(cfg, LocalStore::in_memory()));
        assert_eq!(p.site_url(), "https://someowner.github.io/web/");
    }

    #[tokio::test]
    async fn missing_token_fails_without_network() {
        let p = Publisher::new(SiteContext::with_store(
            SiteConfig::default(),
            LocalStore::in_memory(),
        ));
        let err = p.publish(&ContentDocument::default()).await.unwrap_err();
        assert_eq!(err, PublishError::MissingToken);
    }
}
