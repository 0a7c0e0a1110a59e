//! Locating literal file names from request parameters.
//!
//! File names look like `NUTS_RG_01M_2021_4326_LEVL_3.shp.zip`: a theme
//! prefix, then the request components in a fixed order, then optional
//! qualifiers. The prefix is not derivable from the theme code, and some
//! names carry trailing qualifiers the caller did not ask for, which is why
//! matching strips the prefix and compares with `starts_with`.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::theme::{CountryBoundary, FileFormat, NutsLevel, Projection, Scale, SpatialType, Theme};

/// File format → file names published in that format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCatalog {
    files: HashMap<String, Vec<String>>,
}

impl FileCatalog {
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| Error::Decode {
            url: "files".to_string(),
            message: "file catalog is not an object".to_string(),
        })?;
        let files = map
            .iter()
            .map(|(format, names)| {
                let names = names
                    .as_array()
                    .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default();
                (format.clone(), names)
            })
            .collect();
        Ok(Self { files })
    }

    pub fn names(&self, file_format: &str) -> &[String] {
        self.files.get(file_format).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for FileCatalog {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Parameters that select one downloadable file of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub file_format: FileFormat,
    pub spatial_type: SpatialType,
    pub scale: Option<Scale>,
    pub projection: Option<Projection>,
    pub country_boundary: Option<CountryBoundary>,
    pub nuts_level: Option<NutsLevel>,
    /// Dataset year; the theme's latest dataset when absent.
    pub year: Option<String>,
}

impl FileRequest {
    pub fn new(file_format: FileFormat, spatial_type: SpatialType) -> Self {
        Self {
            file_format,
            spatial_type,
            scale: None,
            projection: None,
            country_boundary: None,
            nuts_level: None,
            year: None,
        }
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn country_boundary(mut self, boundary: CountryBoundary) -> Self {
        self.country_boundary = Some(boundary);
        self
    }

    pub fn nuts_level(mut self, level: NutsLevel) -> Self {
        self.nuts_level = Some(level);
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Stem for the dataset `year`, e.g. `RG_01M_2021_4326_LEVL_3`.
    pub fn stem(&self, year: &str) -> String {
        let parts = [
            Some(self.spatial_type.as_str()),
            self.scale.map(|s| s.as_str()),
            Some(year),
            self.projection.map(|p| p.as_str()),
            self.country_boundary.map(|b| b.as_str()),
            self.nuts_level.map(|l| l.as_str()),
        ];
        file_stem(&parts)
    }
}

/// Joins the present components with `_` and upper-cases the result.
pub fn file_stem(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

fn strip_theme_prefix<'a>(theme: Theme, file_name: &'a str) -> &'a str {
    if let Some(rest) = file_name
        .strip_prefix(theme.file_prefix())
        .and_then(|r| r.strip_prefix('_'))
    {
        return rest;
    }
    file_name.split_once('_').map(|(_, rest)| rest).unwrap_or("")
}

/// First file of `file_format` whose name, minus the theme prefix, starts with `stem`.
pub fn resolve_file_name(
    theme: Theme,
    files: &FileCatalog,
    file_format: &str,
    stem: &str,
) -> Result<String> {
    let candidates = files.names(file_format);
    candidates
        .iter()
        .find(|name| strip_theme_prefix(theme, name).starts_with(stem))
        .cloned()
        .ok_or_else(|| Error::FileNotFound {
            theme,
            file_format: file_format.to_string(),
            stem: stem.to_string(),
            available: candidates.to_vec(),
        })
}
