use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A feature collection exactly as the service returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryPayload(Value);

impl GeometryPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Declared CRS name (`crs.properties.name`), if any.
    pub fn crs(&self) -> Option<&str> {
        self.0
            .get("crs")
            .and_then(|c| c.get("properties"))
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
    }

    pub fn features(&self) -> &[Value] {
        self.0
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for GeometryPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_crs_and_features() {
        let p = GeometryPayload::new(json!({
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}},
            "features": [{"type": "Feature", "geometry": null, "properties": {}}]
        }));
        assert_eq!(p.crs(), Some("urn:ogc:def:crs:EPSG::4326"));
        assert_eq!(p.features().len(), 1);
        assert!(GeometryPayload::new(json!({})).features().is_empty());
    }
}
