use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::cache::ResponseCache;
use crate::error::{Error, Result};
use crate::theme::{FileFormat, Theme};
use crate::transport::Transport;
use crate::util::service_url;

/// Memoized access to the service's JSON documents.
pub struct Catalog {
    base_url: String,
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    param_gate: Semaphore,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("base_url", &self.base_url)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Catalog {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        param_gate: usize,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            cache: ResponseCache::default(),
            param_gate: Semaphore::new(param_gate.max(1)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The theme registry (`themes.json`).
    pub async fn themes(&self) -> Result<Arc<Value>> {
        self.cached_json(service_url(&self.base_url, &["themes.json"]))
            .await
    }

    /// The dataset catalog of a theme, keyed by dataset id (e.g. `nuts-2021`).
    pub async fn datasets(&self, theme: Theme) -> Result<Arc<Value>> {
        let url = service_url(&self.base_url, &[theme.as_str(), "datasets.json"]);
        self.cached_json(url).await
    }

    /// One entry of a theme's registry record.
    pub async fn property(&self, theme: Theme, key: &str) -> Result<Value> {
        let themes = self.themes().await?;
        let record = themes
            .get(theme.as_str())
            .ok_or_else(|| Error::not_found("theme", theme.as_str()))?;
        record
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found("theme property", format!("{}.{}", theme, key)))
    }

    /// A parameterized resource under the theme, gated by the parameter gate.
    pub async fn param(&self, theme: Theme, segments: &[&str]) -> Result<Arc<Value>> {
        let url = self.param_url(theme, segments);
        if let Some(hit) = self.cache.get(&url) {
            tracing::debug!(url = %url, "cache hit");
            return Ok(hit);
        }
        let _permit = self
            .param_gate
            .acquire()
            .await
            .map_err(|_| Error::Config("parameter gate closed".to_string()))?;
        self.cached_json(url).await
    }

    /// One unit's geometry under the theme's `distribution` namespace.
    ///
    /// Not gated here; the unit orchestrator holds its own gate.
    pub async fn distribution(&self, theme: Theme, path: &str) -> Result<Arc<Value>> {
        let url = self.param_url(theme, &["distribution", path]);
        self.cached_json(url).await
    }

    pub fn file_url(&self, theme: Theme, file_format: FileFormat, file_name: &str) -> String {
        service_url(
            &self.base_url,
            &[theme.as_str(), file_format.as_str(), file_name],
        )
    }

    pub async fn file(
        &self,
        theme: Theme,
        file_format: FileFormat,
        file_name: &str,
    ) -> Result<Vec<u8>> {
        let url = self.file_url(theme, file_format, file_name);
        self.transport.get_bytes(&url).await
    }

    pub async fn download_file(
        &self,
        theme: Theme,
        file_format: FileFormat,
        file_name: &str,
        target: &Path,
        progress: bool,
    ) -> Result<u64> {
        let url = self.file_url(theme, file_format, file_name);
        self.transport.download_to(&url, target, progress).await
    }

    /// An absolute link taken from dataset properties (metadata, documentation).
    pub async fn document(&self, url: &str) -> Result<Vec<u8>> {
        self.transport.get_bytes(url).await
    }

    fn param_url(&self, theme: Theme, segments: &[&str]) -> String {
        let mut parts = Vec::with_capacity(segments.len() + 1);
        parts.push(theme.as_str());
        parts.extend_from_slice(segments);
        service_url(&self.base_url, &parts)
    }

    async fn cached_json(&self, url: String) -> Result<Arc<Value>> {
        if let Some(hit) = self.cache.get(&url) {
            tracing::debug!(url = %url, "cache hit");
            return Ok(hit);
        }
        let value = self.transport.get_json(&url).await?;
        Ok(self.cache.insert(url, value))
    }
}
