use std::path::Path;

use anyhow::Result;
use gisco_geodata::{
    Client, FileFormat, FileRequest, NutsLevel, Projection, Scale, SpatialType, Theme,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configure the endpoint via env vars or a `.giscorc` file.
    let client = Client::from_env()?.with_progress(true);

    let request = FileRequest::new(FileFormat::Shp, SpatialType::Region)
        .scale(Scale::M01)
        .projection(Projection::Epsg4326)
        .nuts_level(NutsLevel::Level3)
        .year("2021");
    let path = client
        .theme(Theme::Nuts)
        .download(&request, Path::new("downloads"))
        .await?;
    println!("saved {}", path.display());

    if let Some(doc) = client.theme(Theme::Nuts).dataset("2021").await?.documentation() {
        let text = client.document_text(doc).await?;
        println!("{}", text.lines().next().unwrap_or(""));
    }
    Ok(())
}
