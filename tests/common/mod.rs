#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gisco_geodata::{Client, ClientConfig, Error, Result, Transport};
use serde_json::{Value, json};

pub const BASE: &str = "https://gisco.test/distribution/v2/";

#[derive(Debug, Clone)]
pub enum Route {
    Json(Value),
    Bytes(Vec<u8>),
    Status(u16),
    /// Answers with the value after waiting.
    Slow(Duration, Value),
    /// Never answers.
    Hang,
}

/// In-memory transport answering from a route table.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every answer waits `delay` first.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn route(&self, path: &str, route: Route) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{BASE}{path}"), route);
    }

    pub fn json(&self, path: &str, value: Value) {
        self.route(path, Route::Json(value));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn answer(&self, url: &str) -> Result<Route> {
        self.calls.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url).cloned();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let route = match route {
            Some(Route::Hang) => std::future::pending().await,
            Some(Route::Slow(delay, value)) => {
                tokio::time::sleep(delay).await;
                Some(Route::Json(value))
            }
            other => other,
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        match route {
            None => Err(status(url, 404)),
            Some(Route::Status(code)) => Err(status(url, code)),
            Some(route) => Ok(route),
        }
    }
}

fn status(url: &str, code: u16) -> Error {
    Error::Transport {
        url: url.to_string(),
        status: Some(code),
        message: format!("HTTP {code}"),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        match self.answer(url).await? {
            Route::Json(v) => Ok(v),
            Route::Bytes(b) => serde_json::from_slice(&b).map_err(|e| Error::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }),
            _ => unreachable!("answer resolves status, slow and hanging routes"),
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        match self.answer(url).await? {
            Route::Json(v) => Ok(serde_json::to_vec(&v).unwrap()),
            Route::Bytes(b) => Ok(b),
            _ => unreachable!("answer resolves status, slow and hanging routes"),
        }
    }
}

pub fn client(transport: &Arc<FakeTransport>) -> Client {
    let config = ClientConfig {
        url: BASE.to_string(),
        ..ClientConfig::default()
    };
    Client::with_transport(config, Arc::clone(transport) as Arc<dyn Transport>)
}

pub fn feature_collection(unit: &str) -> Value {
    json!({
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}},
        "features": [{
            "type": "Feature",
            "id": unit,
            "geometry": {"type": "Point", "coordinates": [25.0, 45.0]},
            "properties": {"FID": unit}
        }]
    })
}

/// Registers theme registry, dataset catalog and unit catalog for `theme`
/// with dataset `year`, listing `units` in order.
pub fn register_theme(transport: &FakeTransport, theme: &str, year: &str, units: &[&str]) {
    transport.json(
        "themes.json",
        json!({
            "countries": {"title": "Countries", "datasets": "countries/datasets.json"},
            "nuts": {"title": "NUTS", "datasets": "nuts/datasets.json"},
            "urau": {"title": "Urban Audit", "datasets": "urau/datasets.json"},
            "coas": {"title": "Coastal lines", "datasets": "coas/datasets.json"}
        }),
    );
    transport.json(
        &format!("{theme}/datasets.json"),
        json!({
            format!("{theme}-2001"): {
                "title": format!("{theme} 2001"),
                "units": format!("{theme}-2001-units.json"),
                "files": format!("{theme}-2001-files.json")
            },
            format!("{theme}-{year}"): {
                "title": format!("{theme} {year}"),
                "date": "01/01/2021",
                "units": format!("{theme}-{year}-units.json"),
                "files": format!("{theme}-{year}-files.json")
            }
        }),
    );
    let catalog: serde_json::Map<String, Value> = units
        .iter()
        .map(|u| (u.to_string(), json!([format!("{u}.geojson")])))
        .collect();
    transport.json(
        &format!("{theme}/{theme}-{year}-units.json"),
        Value::Object(catalog),
    );
}

/// Registers region geometry (20M, EPSG:4326) for each unit.
pub fn register_regions(transport: &FakeTransport, theme: &str, year: &str, units: &[&str]) {
    for unit in units {
        transport.json(
            &format!("{theme}/distribution/{unit}-region-20M-4326-{year}.geojson"),
            feature_collection(unit),
        );
    }
}

/// Number of per-unit geometry requests made for `theme`.
pub fn unit_calls(transport: &FakeTransport, theme: &str) -> usize {
    transport.calls_to(&format!("{BASE}{theme}/distribution/"))
}

pub fn fids(payloads: &[gisco_geodata::GeometryPayload]) -> Vec<String> {
    let mut ids: Vec<String> = payloads
        .iter()
        .flat_map(|p| p.features().iter())
        .filter_map(|f| f["properties"]["FID"].as_str().map(str::to_string))
        .collect();
    ids.sort();
    ids
}
