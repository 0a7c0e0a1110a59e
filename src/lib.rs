//! A Rust client for the Eurostat GISCO geodata distribution API.
//!
//! The service publishes geodata by theme (countries, NUTS regions, urban
//! audit zones, coastlines, communes, local administrative units, postal
//! codes). Each theme lists year-versioned datasets; each dataset has a unit
//! catalog and a file catalog.
//!
//! Two ways to get data:
//! - per-unit GeoJSON, fetched concurrently for every unit a filter selects
//!   ([`ThemeClient::get_units`]),
//! - whole files, located by request parameters and downloaded
//!   ([`ThemeClient::download`], [`ThemeClient::get_file`]).
//!
//! ## Quick start
//! - Optionally configure via environment variables (`GISCO_URL`,
//!   `GISCO_VERIFY`, `GISCO_TIMEOUT`, `GISCO_CONCURRENCY`) or a `.giscorc`
//!   file (current directory or home directory).
//!
//! ```no_run
//! use gisco_geodata::{Client, NutsLevel, Projection, Scale, Theme, UnitFilter, UnitRequest};
//!
//! # async fn run() -> gisco_geodata::Result<()> {
//! let client = Client::from_env()?;
//! let regions = client
//!     .theme(Theme::Nuts)
//!     .get_units(
//!         &UnitFilter::nuts(NutsLevel::Level2),
//!         UnitRequest::region(Scale::M20, Projection::Epsg4326),
//!         Some("2021"),
//!     )
//!     .await?;
//! println!("{} features", regions.feature_count());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod assemble;
mod cache;
mod catalog;
mod client;
mod config;
mod dataset;
mod error;
mod fetch;
mod filename;
mod payload;
mod theme;
mod transport;
mod units;
mod util;

#[cfg(feature = "geo")]
pub use assemble::{Row, RowAssembler, RowSet, rows_from_featurecollection};
pub use assemble::{Assembled, Assembler, PassthroughAssembler, default_assembler};
pub use catalog::Catalog;
pub use client::{AssembledUnits, Client, ThemeClient};
pub use config::{ClientConfig, DEFAULT_PARAM_CONCURRENCY, DEFAULT_TIMEOUT, DEFAULT_URL};
pub use dataset::{Dataset, MetadataLinks};
pub use error::{Error, FetchContext, Result};
pub use fetch::{
    DEFAULT_UNIT_CONCURRENCY, FetchOutcome, Interrupt, InterruptHandle, UnitFetcher, UnitRequest,
    interrupt_pair, unit_path,
};
pub use filename::{FileCatalog, FileRequest, file_stem, resolve_file_name};
pub use payload::GeometryPayload;
pub use theme::{
    CountryBoundary, FileFormat, Language, NutsLevel, Projection, Property, Scale, SpatialType,
    Theme, UrbanAuditCategory,
};
pub use transport::{HttpTransport, Transport};
pub use units::{UnitCatalog, UnitFilter, resolve_units};
