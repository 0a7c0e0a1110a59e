use anyhow::Result;
use gisco_geodata::{
    Client, NutsLevel, Projection, Scale, Theme, UnitFilter, UnitRequest, interrupt_pair,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=gisco_geodata=debug shows every unit fetch.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = Client::from_env()?;
    let nuts = client.theme(Theme::Nuts);

    // Ctrl-C stops collecting and keeps what arrived.
    let (handle, mut interrupt) = interrupt_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.trigger();
        }
    });

    let outcome = nuts
        .fetch_units(
            &UnitFilter::nuts(NutsLevel::Level2),
            UnitRequest::region(Scale::M20, Projection::Epsg4326),
            Some("2021"),
            &mut interrupt,
        )
        .await?;

    println!(
        "fetched {} of {} regions{}",
        outcome.payloads.len(),
        outcome.requested,
        if outcome.interrupted { " (interrupted)" } else { "" }
    );
    for payload in &outcome.payloads {
        for feature in payload.features() {
            println!(
                "{}\t{}",
                feature["properties"]["NUTS_ID"].as_str().unwrap_or("?"),
                feature["properties"]["NAME_LATN"].as_str().unwrap_or("?")
            );
        }
    }
    Ok(())
}
