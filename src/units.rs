use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::theme::{NutsLevel, Theme, UrbanAuditCategory};
use crate::util::count_digits;

/// Unit id → descriptor strings, in the order the service lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitCatalog {
    entries: Vec<(String, Vec<String>)>,
}

impl UnitCatalog {
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| Error::Decode {
            url: "units".to_string(),
            message: "unit catalog is not an object".to_string(),
        })?;
        let entries = map
            .iter()
            .map(|(id, descriptors)| {
                let descriptors = match descriptors {
                    Value::Array(items) => items
                        .iter()
                        .map(|d| match d {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                (id.clone(), descriptors)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == id)
    }

    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.as_slice())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for UnitCatalog {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Which units of a theme to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitFilter {
    /// `None` selects every country.
    Countries { countries: Option<Vec<String>> },
    Nuts {
        level: NutsLevel,
        countries: Option<Vec<String>>,
    },
    UrbanAudit {
        category: Option<UrbanAuditCategory>,
        countries: Option<Vec<String>>,
    },
}

impl UnitFilter {
    pub fn all_countries() -> Self {
        UnitFilter::Countries { countries: None }
    }

    pub fn countries<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UnitFilter::Countries {
            countries: Some(countries.into_iter().map(Into::into).collect()),
        }
    }

    pub fn nuts(level: NutsLevel) -> Self {
        UnitFilter::Nuts {
            level,
            countries: None,
        }
    }

    pub fn urban_audit(category: Option<UrbanAuditCategory>) -> Self {
        UnitFilter::UrbanAudit {
            category,
            countries: None,
        }
    }

    /// Restricts any filter to the given country codes.
    pub fn in_countries<I, S>(self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes = Some(codes.into_iter().map(Into::into).collect());
        match self {
            UnitFilter::Countries { .. } => UnitFilter::Countries { countries: codes },
            UnitFilter::Nuts { level, .. } => UnitFilter::Nuts {
                level,
                countries: codes,
            },
            UnitFilter::UrbanAudit { category, .. } => UnitFilter::UrbanAudit {
                category,
                countries: codes,
            },
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            UnitFilter::Countries { .. } => Theme::Countries,
            UnitFilter::Nuts { .. } => Theme::Nuts,
            UnitFilter::UrbanAudit { .. } => Theme::UrbanAudit,
        }
    }

    pub fn check_theme(&self, theme: Theme) -> Result<()> {
        if self.theme() == theme {
            return Ok(());
        }
        Err(Error::InvalidParameter(format!(
            "unit filter for theme {} cannot be used with theme {}",
            self.theme(),
            theme
        )))
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            UnitFilter::Countries { countries } => in_codes(countries, |code| id == code),
            UnitFilter::Nuts { level, countries } => {
                count_digits(id) == level.digits() && in_codes(countries, |code| id == code)
            }
            UnitFilter::UrbanAudit {
                category,
                countries,
            } => {
                category.is_none_or(|c| id.ends_with(c.as_str()))
                    && in_codes(countries, |code| id.starts_with(code))
            }
        }
    }
}

fn in_codes(codes: &Option<Vec<String>>, pred: impl Fn(&str) -> bool) -> bool {
    match codes {
        None => true,
        Some(codes) => codes.iter().any(|c| pred(c)),
    }
}

impl fmt::Display for UnitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes = |c: &Option<Vec<String>>| match c {
            None => "all".to_string(),
            Some(c) => format!("[{}]", c.join(", ")),
        };
        match self {
            UnitFilter::Countries { countries } => write!(f, "countries={}", codes(countries)),
            UnitFilter::Nuts { level, countries } => {
                write!(f, "nuts_level={} countries={}", level, codes(countries))
            }
            UnitFilter::UrbanAudit {
                category,
                countries,
            } => write!(
                f,
                "category={} countries={}",
                category.map(|c| c.as_str()).unwrap_or("any"),
                codes(countries)
            ),
        }
    }
}

/// Unit ids of `catalog` accepted by `filter`, in catalog order.
pub fn resolve_units(catalog: &UnitCatalog, filter: &UnitFilter) -> Vec<String> {
    catalog
        .ids()
        .filter(|id| filter.matches(id))
        .map(str::to_string)
        .collect()
}
