use std::sync::Arc;

use crate::error::Result;
use crate::payload::GeometryPayload;

#[cfg(feature = "geo")]
pub use rows::{Row, RowAssembler, RowSet, rows_from_featurecollection};

/// Result of merging fetched payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    #[cfg(feature = "geo")]
    Rows(RowSet),
    Raw(Vec<GeometryPayload>),
}

impl Assembled {
    /// Number of features across the result.
    pub fn feature_count(&self) -> usize {
        match self {
            #[cfg(feature = "geo")]
            Assembled::Rows(rows) => rows.len(),
            Assembled::Raw(payloads) => payloads.iter().map(|p| p.features().len()).sum(),
        }
    }

    #[cfg(feature = "geo")]
    pub fn into_rows(self) -> Option<RowSet> {
        match self {
            Assembled::Rows(rows) => Some(rows),
            Assembled::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<Vec<GeometryPayload>> {
        match self {
            Assembled::Raw(payloads) => Some(payloads),
            #[cfg(feature = "geo")]
            Assembled::Rows(_) => None,
        }
    }
}

/// How fetched payloads are handed back to the caller.
pub trait Assembler: Send + Sync {
    fn assemble(&self, payloads: Vec<GeometryPayload>) -> Result<Assembled>;
}

/// Hands payloads back untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAssembler;

impl Assembler for PassthroughAssembler {
    fn assemble(&self, payloads: Vec<GeometryPayload>) -> Result<Assembled> {
        Ok(Assembled::Raw(payloads))
    }
}

/// Row assembly when the `geo` feature is compiled in, passthrough otherwise.
pub fn default_assembler() -> Arc<dyn Assembler> {
    #[cfg(feature = "geo")]
    {
        Arc::new(RowAssembler)
    }
    #[cfg(not(feature = "geo"))]
    {
        Arc::new(PassthroughAssembler)
    }
}

#[cfg(feature = "geo")]
mod rows {
    use geojson::{GeoJson, Geometry, feature::Id};
    use serde_json::{Map, Value};

    use super::{Assembled, Assembler};
    use crate::error::{Error, Result};
    use crate::payload::GeometryPayload;

    /// One feature of a merged table.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Row {
        pub id: Option<String>,
        pub geometry: Option<Geometry>,
        pub properties: Map<String, Value>,
    }

    /// Features of several payloads sharing one CRS.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct RowSet {
        pub crs: Option<String>,
        pub rows: Vec<Row>,
    }

    impl RowSet {
        pub fn len(&self) -> usize {
            self.rows.len()
        }

        pub fn is_empty(&self) -> bool {
            self.rows.is_empty()
        }
    }

    /// Rows of one feature collection payload, in feature order.
    pub fn rows_from_featurecollection(payload: &GeometryPayload) -> Result<Vec<Row>> {
        let decode = |message: String| Error::Decode {
            url: "geometry payload".to_string(),
            message,
        };
        let geojson = GeoJson::from_json_value(payload.as_value().clone())
            .map_err(|e| decode(e.to_string()))?;
        let found = match geojson {
            GeoJson::FeatureCollection(fc) => Ok(fc),
            GeoJson::Feature(_) => Err("Feature"),
            GeoJson::Geometry(_) => Err("Geometry"),
        };
        let collection =
            found.map_err(|kind| decode(format!("expected FeatureCollection, got {}", kind)))?;

        Ok(collection
            .features
            .into_iter()
            .map(|f| Row {
                id: f.id.map(|id| match id {
                    Id::String(s) => s,
                    Id::Number(n) => n.to_string(),
                }),
                geometry: f.geometry,
                properties: f.properties.unwrap_or_default(),
            })
            .collect())
    }

    /// Concatenates every payload's features into a single [`RowSet`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RowAssembler;

    impl Assembler for RowAssembler {
        fn assemble(&self, payloads: Vec<GeometryPayload>) -> Result<Assembled> {
            let mut set = RowSet::default();
            for payload in &payloads {
                match (set.crs.as_deref(), payload.crs()) {
                    (None, Some(crs)) => set.crs = Some(crs.to_string()),
                    (Some(current), Some(crs)) if current != crs => {
                        tracing::warn!(
                            expected = current,
                            found = crs,
                            "payloads declare different CRS; keeping the first"
                        );
                    }
                    _ => {}
                }
                set.rows.extend(rows_from_featurecollection(payload)?);
            }
            Ok(Assembled::Rows(set))
        }
    }
}
