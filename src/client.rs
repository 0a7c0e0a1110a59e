use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::assemble::{Assembled, Assembler, default_assembler};
use crate::catalog::Catalog;
use crate::config::{ClientConfig, load_config};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::fetch::{FetchOutcome, Interrupt, UnitFetcher, UnitRequest};
use crate::filename::{FileCatalog, FileRequest, resolve_file_name};
use crate::payload::GeometryPayload;
use crate::theme::{FileFormat, Theme};
use crate::transport::{HttpTransport, Transport};
use crate::units::{UnitCatalog, UnitFilter};
use crate::util::link_file_name;

#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    catalog: Arc<Catalog>,
    fetcher: UnitFetcher,
    assembler: Arc<dyn Assembler>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client using environment variables and/or `.giscorc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`verify` arguments
    /// - environment variables `GISCO_URL` / `GISCO_VERIFY` / `GISCO_TIMEOUT` / `GISCO_CONCURRENCY`
    /// - config file from `GISCO_RC` or `.giscorc`
    pub fn new(url: Option<String>, verify: Option<bool>) -> Result<Self> {
        Self::with_config(load_config(url, verify)?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.verify, config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Builds a client over any [`Transport`].
    ///
    /// Gate sizes below 1 are raised to 1.
    pub fn with_transport(mut config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        config.unit_concurrency = config.unit_concurrency.max(1);
        config.param_concurrency = config.param_concurrency.max(1);
        let catalog = Arc::new(Catalog::new(
            config.url.clone(),
            transport,
            config.param_concurrency,
        ));
        let fetcher = UnitFetcher::new(Arc::clone(&catalog), config.unit_concurrency);
        Self {
            config,
            catalog,
            fetcher,
            assembler: default_assembler(),
        }
    }

    pub fn with_assembler(mut self, assembler: Arc<dyn Assembler>) -> Self {
        self.assembler = assembler;
        self
    }

    /// Replaces the unit gate; 0 is raised to 1.
    pub fn with_unit_concurrency(mut self, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        self.config.unit_concurrency = concurrency;
        self.fetcher = UnitFetcher::new(Arc::clone(&self.catalog), concurrency);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.config.progress = progress;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn theme(&self, theme: Theme) -> ThemeClient<'_> {
        ThemeClient {
            client: self,
            theme,
        }
    }

    /// Fetches a link taken from dataset properties as text.
    pub async fn document_text(&self, url: &str) -> Result<String> {
        let bytes = self.catalog.document(url).await?;
        String::from_utf8(bytes).map_err(|e| Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Saves a link taken from dataset properties under `out_dir`.
    pub async fn download_document(&self, url: &str, out_dir: &Path) -> Result<PathBuf> {
        let name = link_file_name(url).unwrap_or("document");
        let target = prepare_target(out_dir, name).await?;
        self.catalog
            .transport()
            .download_to(url, &target, self.config.progress)
            .await?;
        Ok(target)
    }
}

/// Assembled units of a batch that may have stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledUnits {
    pub assembled: Assembled,
    /// Units whose geometry arrived.
    pub fetched: usize,
    /// Units the batch was started with.
    pub requested: usize,
    pub interrupted: bool,
}

impl AssembledUnits {
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.fetched == self.requested
    }
}

/// Operations on one theme.
#[derive(Debug, Clone, Copy)]
pub struct ThemeClient<'a> {
    client: &'a Client,
    theme: Theme,
}

impl ThemeClient<'_> {
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// This theme's record in the theme registry.
    pub async fn properties(&self) -> Result<Value> {
        let themes = self.client.catalog.themes().await?;
        themes
            .get(self.theme.as_str())
            .cloned()
            .ok_or_else(|| Error::not_found("theme", self.theme.as_str()))
    }

    pub async fn property(&self, key: &str) -> Result<Value> {
        self.client.catalog.property(self.theme, key).await
    }

    pub async fn datasets(&self) -> Result<Vec<Dataset>> {
        let datasets = self.client.catalog.datasets(self.theme).await?;
        Dataset::list(self.theme, &datasets)
    }

    pub async fn dataset(&self, year: &str) -> Result<Dataset> {
        let datasets = self.client.catalog.datasets(self.theme).await?;
        Dataset::find(self.theme, &datasets, year)
    }

    /// The last dataset the catalog lists.
    pub async fn default_dataset(&self) -> Result<Dataset> {
        self.datasets()
            .await?
            .pop()
            .ok_or_else(|| {
                Error::not_found("dataset", format!("{} (catalog is empty)", self.theme))
            })
    }

    async fn dataset_or_default(&self, year: Option<&str>) -> Result<Dataset> {
        match year {
            Some(year) => self.dataset(year).await,
            None => self.default_dataset().await,
        }
    }

    pub async fn units(&self, year: Option<&str>) -> Result<UnitCatalog> {
        let dataset = self.dataset_or_default(year).await?;
        dataset.units(&self.client.catalog).await
    }

    pub async fn files(&self, year: Option<&str>) -> Result<FileCatalog> {
        let dataset = self.dataset_or_default(year).await?;
        dataset.files(&self.client.catalog).await
    }

    /// Fetches the selected units' geometry; see [`UnitFetcher::fetch_units`].
    pub async fn fetch_units(
        &self,
        filter: &UnitFilter,
        request: UnitRequest,
        year: Option<&str>,
        interrupt: &mut Interrupt,
    ) -> Result<FetchOutcome> {
        if !self.theme.has_unit_distribution() {
            return Err(Error::InvalidParameter(format!(
                "theme {} has no per-unit geometry, use get_file or download",
                self.theme
            )));
        }
        let dataset = self.dataset_or_default(year).await?;
        self.client
            .fetcher
            .fetch_units(&dataset, filter, request, interrupt)
            .await
    }

    /// Fetches and assembles the selected units.
    pub async fn get_units(
        &self,
        filter: &UnitFilter,
        request: UnitRequest,
        year: Option<&str>,
    ) -> Result<Assembled> {
        let units = self
            .get_units_until(filter, request, year, &mut Interrupt::never())
            .await?;
        Ok(units.assembled)
    }

    /// Like [`get_units`](Self::get_units), but an interrupt returns the units
    /// collected so far.
    pub async fn get_units_until(
        &self,
        filter: &UnitFilter,
        request: UnitRequest,
        year: Option<&str>,
        interrupt: &mut Interrupt,
    ) -> Result<AssembledUnits> {
        let outcome = self.fetch_units(filter, request, year, interrupt).await?;
        let fetched = outcome.payloads.len();
        Ok(AssembledUnits {
            assembled: self.client.assembler.assemble(outcome.payloads)?,
            fetched,
            requested: outcome.requested,
            interrupted: outcome.interrupted,
        })
    }

    /// The file name matching `request` in its dataset's file catalog.
    pub async fn resolve_file_name(&self, request: &FileRequest) -> Result<String> {
        let dataset = self.dataset_or_default(request.year.as_deref()).await?;
        let files = dataset.files(&self.client.catalog).await?;
        let stem = request.stem(dataset.year());
        resolve_file_name(self.theme, &files, request.file_format.as_str(), &stem)
    }

    /// Fetches a whole-theme GeoJSON file and assembles it.
    pub async fn get_file(&self, request: &FileRequest) -> Result<Assembled> {
        if request.file_format != FileFormat::GeoJson {
            return Err(Error::InvalidParameter(format!(
                "get_file reads geojson files, got {}; use download for other formats",
                request.file_format
            )));
        }
        let file_name = self.resolve_file_name(request).await?;
        let bytes = self
            .client
            .catalog
            .file(self.theme, request.file_format, &file_name)
            .await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
            url: self
                .client
                .catalog
                .file_url(self.theme, request.file_format, &file_name),
            message: e.to_string(),
        })?;
        self.client
            .assembler
            .assemble(vec![GeometryPayload::new(value)])
    }

    /// Downloads the file matching `request` into `out_dir`, keeping its name.
    pub async fn download(&self, request: &FileRequest, out_dir: &Path) -> Result<PathBuf> {
        let file_name = self.resolve_file_name(request).await?;
        let target = prepare_target(out_dir, &file_name).await?;
        let bytes = self
            .client
            .catalog
            .download_file(
                self.theme,
                request.file_format,
                &file_name,
                &target,
                self.client.config.progress,
            )
            .await?;
        tracing::info!(theme = %self.theme, file = %file_name, bytes, "downloaded file");
        Ok(target)
    }
}

async fn prepare_target(out_dir: &Path, file_name: &str) -> Result<PathBuf> {
    if !out_dir.as_os_str().is_empty() {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| Error::io(out_dir, e))?;
    }
    Ok(out_dir.join(file_name))
}
