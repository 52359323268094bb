//! Admin mode: secret-gated editing of the page, saving it to a
//! [`ContentDocument`], and moving that document to a file or to GitHub.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::publish::{PublishError, PublishOutcome, Publisher};
use super::{apply, collect, ContentDocument, ContentError, EditableSurface};
use crate::context::SharedContext;

pub const EXPORT_FILE_NAME: &str = "content.json";

pub struct AdminMode<S: EditableSurface> {
    ctx: SharedContext,
    surface: S,
    publisher: Publisher,
    enabled: bool,
    /// Page as it was when admin mode was created; `reset` goes back to it.
    baseline: ContentDocument,
    saved: Option<ContentDocument>,
}

impl<S: EditableSurface> AdminMode<S> {
    pub fn new(ctx: SharedContext, surface: S) -> Self {
        let baseline = collect(&surface);
        let publisher = Publisher::new(ctx.clone());
        Self {
            ctx,
            surface,
            publisher,
            enabled: false,
            baseline,
            saved: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for typing into regions while editing.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn saved(&self) -> Option<&ContentDocument> {
        self.saved.as_ref()
    }

    /// Compare `secret` with the configured one; on match, make the surface
    /// editable. A wrong secret leaves everything as it was.
    pub fn enable(&mut self, secret: &str) -> bool {
        if secret != self.ctx.config.admin.secret {
            warn!("admin secret rejected");
            return false;
        }
        self.enabled = true;
        self.surface.set_editable(true);
        info!("admin mode enabled");
        true
    }

    pub fn disable(&mut self) {
        if self.enabled {
            info!("admin mode disabled");
        }
        self.enabled = false;
        self.surface.set_editable(false);
    }

    /// Scrape the surface into the saved document.
    pub fn save(&mut self) -> Result<&ContentDocument, ContentError> {
        if !self.enabled {
            return Err(ContentError::NotAdmin);
        }
        let doc = collect(&self.surface);
        info!("page content saved");
        Ok(self.saved.insert(doc))
    }

    /// Write the saved document as pretty JSON to `dir/content.json`.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ContentError> {
        let doc = self.saved.as_ref().ok_or(ContentError::NothingSaved)?;
        let path = dir.as_ref().join(EXPORT_FILE_NAME);
        write_atomic(&path, &doc.to_pretty_json()?)?;
        info!(path = %path.display(), "content exported");
        Ok(path)
    }

    /// Parse `path` completely, then apply it. On any failure the page and the
    /// saved document are unchanged.
    pub fn import(&mut self, path: impl AsRef<Path>) -> Result<usize, ContentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_str(&raw)
    }

    pub fn import_str(&mut self, raw: &str) -> Result<usize, ContentError> {
        let doc = ContentDocument::from_json(raw)?;
        let written = apply(&doc, &mut self.surface);
        info!(regions = written, "content imported");
        self.saved = Some(doc);
        Ok(written)
    }

    /// Discard the saved document and put the original page text back.
    pub fn reset(&mut self) {
        apply(&self.baseline, &mut self.surface);
        self.saved = None;
        info!("content reset");
    }

    pub fn set_token(&self, token: &str) -> Result<(), ContentError> {
        if token.trim().is_empty() {
            return Err(ContentError::EmptyToken);
        }
        self.ctx
            .set_admin_token(token)
            .map_err(|e| ContentError::Storage(e.to_string()))
    }

    pub fn has_token(&self) -> bool {
        self.ctx.has_admin_token()
    }

    /// Publish the saved document.
    pub async fn deploy(&self) -> Result<PublishOutcome, PublishError> {
        if !self.has_token() {
            return Err(PublishError::MissingToken);
        }
        let doc = self.saved.as_ref().ok_or(PublishError::NothingSaved)?;
        self.publisher.publish(doc).await
    }
}

fn write_atomic(path: &Path, body: &str) -> Result<(), ContentError> {
    let io = |source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(io)?;
    fs::rename(&tmp, path).map_err(io)
}
