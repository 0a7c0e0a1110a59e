mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use gisco_geodata::{
    CountryBoundary, Error, FileFormat, FileRequest, NutsLevel, PassthroughAssembler, Projection,
    Scale, SpatialType, Theme,
};
use serde_json::json;

use common::{FakeTransport, Route, client, feature_collection, register_theme};

const SHP: &[&str] = &[
    "NUTS_BN_60M_2021_4326_LEVL_3.shp.zip",
    "NUTS_RG_01M_2021_4326.shp.zip",
    "NUTS_RG_01M_2021_4326_LEVL_1.shp.zip",
];

fn nuts_files() -> Arc<FakeTransport> {
    let transport = Arc::new(FakeTransport::new());
    register_theme(&transport, "nuts", "2021", &["RO"]);
    transport.json(
        "nuts/nuts-2021-files.json",
        json!({
            "shp": SHP,
            "geojson": ["NUTS_RG_20M_2021_4326_LEVL_2.geojson"],
            "csv": ["NUTS_AT_2021.csv"]
        }),
    );
    transport
}

fn three_regions() -> serde_json::Value {
    let mut value = feature_collection("RO21");
    let features = value["features"].as_array_mut().unwrap();
    let template = features[0].clone();
    for unit in ["RO22", "RO31"] {
        let mut f = template.clone();
        f["id"] = json!(unit);
        f["properties"]["FID"] = json!(unit);
        features.push(f);
    }
    value
}

#[tokio::test]
async fn resolves_by_stem_prefix() {
    let transport = nuts_files();
    let client = client(&transport);
    let nuts = client.theme(Theme::Nuts);

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Region)
        .scale(Scale::M01)
        .projection(Projection::Epsg4326)
        .year("2021");
    assert_eq!(
        nuts.resolve_file_name(&request).await.unwrap(),
        "NUTS_RG_01M_2021_4326.shp.zip"
    );

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Boundary)
        .scale(Scale::M60)
        .projection(Projection::Epsg4326)
        .nuts_level(NutsLevel::Level3);
    assert_eq!(
        nuts.resolve_file_name(&request).await.unwrap(),
        "NUTS_BN_60M_2021_4326_LEVL_3.shp.zip"
    );
}

#[tokio::test]
async fn attribute_table_without_scale() {
    let transport = nuts_files();
    let client = client(&transport);

    let request = FileRequest::new(FileFormat::Csv, SpatialType::Attributes);
    assert_eq!(
        client.theme(Theme::Nuts).resolve_file_name(&request).await.unwrap(),
        "NUTS_AT_2021.csv"
    );
}

#[tokio::test]
async fn unmatched_request_lists_candidates() {
    let transport = nuts_files();
    let client = client(&transport);

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Region)
        .scale(Scale::M03)
        .projection(Projection::Epsg3035)
        .country_boundary(CountryBoundary::Inland);
    let err = client
        .theme(Theme::Nuts)
        .resolve_file_name(&request)
        .await
        .unwrap_err();

    assert_matches!(&err, Error::FileNotFound { stem, available, .. } => {
        assert_eq!(stem, "RG_03M_2021_3035_INLAND");
        assert_eq!(available, SHP);
    });
    let text = err.to_string();
    for name in SHP {
        assert!(text.contains(name), "{text}");
    }
}

#[tokio::test]
async fn unknown_format_lists_nothing() {
    let transport = nuts_files();
    let client = client(&transport);

    let request = FileRequest::new(FileFormat::Svg, SpatialType::Region).scale(Scale::M20);
    let err = client
        .theme(Theme::Nuts)
        .resolve_file_name(&request)
        .await
        .unwrap_err();
    assert_matches!(err, Error::FileNotFound { available, .. } if available.is_empty());
}

#[tokio::test]
async fn download_keeps_file_name() {
    let transport = nuts_files();
    transport.route(
        "nuts/shp/NUTS_RG_01M_2021_4326.shp.zip",
        Route::Bytes(b"PK\x03\x04zipped".to_vec()),
    );
    let client = client(&transport);
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("nuts");

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Region)
        .scale(Scale::M01)
        .projection(Projection::Epsg4326);
    let path = client
        .theme(Theme::Nuts)
        .download(&request, &out_dir)
        .await
        .unwrap();

    assert_eq!(path, out_dir.join("NUTS_RG_01M_2021_4326.shp.zip"));
    assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04zipped");
}

#[tokio::test]
async fn failed_download_is_transport_error() {
    let transport = nuts_files();
    transport.route("nuts/shp/NUTS_RG_01M_2021_4326.shp.zip", Route::Status(503));
    let client = client(&transport);
    let dir = tempfile::tempdir().unwrap();

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Region)
        .scale(Scale::M01)
        .projection(Projection::Epsg4326);
    let err = client
        .theme(Theme::Nuts)
        .download(&request, dir.path())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[cfg(feature = "geo")]
#[tokio::test]
async fn get_file_assembles_every_feature() {
    let transport = nuts_files();
    transport.json(
        "nuts/geojson/NUTS_RG_20M_2021_4326_LEVL_2.geojson",
        three_regions(),
    );
    let client = client(&transport);

    let request = FileRequest::new(FileFormat::GeoJson, SpatialType::Region)
        .scale(Scale::M20)
        .projection(Projection::Epsg4326)
        .nuts_level(NutsLevel::Level2);
    let rows = client
        .theme(Theme::Nuts)
        .get_file(&request)
        .await
        .unwrap()
        .into_rows()
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows.crs.as_deref(), Some("urn:ogc:def:crs:EPSG::4326"));
    assert_eq!(rows.rows[2].id.as_deref(), Some("RO31"));
}

#[tokio::test]
async fn get_file_passthrough_keeps_payload() {
    let transport = nuts_files();
    transport.json(
        "nuts/geojson/NUTS_RG_20M_2021_4326_LEVL_2.geojson",
        three_regions(),
    );
    let client = client(&transport).with_assembler(Arc::new(PassthroughAssembler));

    let request = FileRequest::new(FileFormat::GeoJson, SpatialType::Region)
        .scale(Scale::M20)
        .projection(Projection::Epsg4326)
        .nuts_level(NutsLevel::Level2);
    let result = client.theme(Theme::Nuts).get_file(&request).await.unwrap();
    assert_eq!(result.feature_count(), 3);
    assert_eq!(result.into_raw().unwrap()[0].as_value(), &three_regions());
}

#[tokio::test]
async fn get_file_reads_geojson_only() {
    let transport = nuts_files();
    let client = client(&transport);

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Region).scale(Scale::M01);
    let err = client.theme(Theme::Nuts).get_file(&request).await.unwrap_err();
    assert_matches!(err, Error::InvalidParameter(_));
    assert_eq!(transport.calls_to("files.json"), 0);
}
