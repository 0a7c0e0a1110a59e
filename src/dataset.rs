use serde::Deserialize;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::filename::FileCatalog;
use crate::theme::{Language, Property, Theme};
use crate::units::UnitCatalog;
use crate::util::year_from_key;

/// Links to a dataset's metadata documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataLinks {
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub xml: Option<String>,
}

/// One year-versioned release of a theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    theme: Theme,
    key: String,
    year: String,
    properties: Value,
}

impl Dataset {
    /// All datasets of a dataset catalog, in catalog order.
    pub fn list(theme: Theme, datasets: &Value) -> Result<Vec<Dataset>> {
        let map = datasets.as_object().ok_or_else(|| Error::Decode {
            url: format!("{}/datasets.json", theme),
            message: "dataset catalog is not an object".to_string(),
        })?;
        Ok(map
            .iter()
            .map(|(key, properties)| Dataset {
                theme,
                key: key.clone(),
                year: year_from_key(key).to_string(),
                properties: properties.clone(),
            })
            .collect())
    }

    /// The first catalog entry whose key contains `year`.
    pub fn find(theme: Theme, datasets: &Value, year: &str) -> Result<Dataset> {
        Self::list(theme, datasets)?
            .into_iter()
            .find(|d| d.key.contains(year))
            .ok_or_else(|| Error::not_found("dataset", format!("{} {}", theme, year)))
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Catalog key, e.g. `nuts-2021`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub fn property(&self, property: Property) -> Result<&Value> {
        self.properties.get(property.as_str()).ok_or_else(|| {
            Error::not_found("dataset property", format!("{}.{}", self.key, property))
        })
    }

    fn property_str(&self, property: Property) -> Option<&str> {
        self.properties.get(property.as_str()).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.property_str(Property::Title)
    }

    pub fn title_in(&self, language: Language) -> Option<&str> {
        self.properties
            .get(Property::TitleMultilingual.as_str())
            .and_then(|t| t.get(language.as_str()))
            .and_then(Value::as_str)
    }

    pub fn date(&self) -> Option<&str> {
        self.property_str(Property::Date)
    }

    pub fn hashtag(&self) -> Option<&str> {
        self.property_str(Property::Hashtag)
    }

    /// Link to the documentation text file.
    pub fn documentation(&self) -> Option<&str> {
        self.property_str(Property::Documentation)
    }

    pub fn metadata(&self) -> Option<MetadataLinks> {
        self.properties
            .get(Property::Metadata.as_str())
            .and_then(|m| MetadataLinks::deserialize(m).ok())
    }

    /// Path of the unit catalog, relative to the theme.
    pub fn units_pointer(&self) -> Result<&str> {
        self.pointer(Property::Units)
    }

    /// Path of the file catalog, relative to the theme.
    pub fn files_pointer(&self) -> Result<&str> {
        self.pointer(Property::Files)
    }

    fn pointer(&self, property: Property) -> Result<&str> {
        self.property(property)?.as_str().ok_or_else(|| Error::Decode {
            url: format!("{}/datasets.json", self.theme),
            message: format!("{}.{} is not a string", self.key, property),
        })
    }

    pub async fn units(&self, catalog: &Catalog) -> Result<UnitCatalog> {
        let value = catalog.param(self.theme, &[self.units_pointer()?]).await?;
        UnitCatalog::from_value(&value)
    }

    pub async fn files(&self, catalog: &Catalog) -> Result<FileCatalog> {
        let value = catalog.param(self.theme, &[self.files_pointer()?]).await?;
        FileCatalog::from_value(&value)
    }
}
