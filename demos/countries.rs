use anyhow::Result;
use gisco_geodata::{Client, Language, Projection, Theme, UnitFilter, UnitRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = Client::from_env()?;
    let countries = client.theme(Theme::Countries);

    for dataset in countries.datasets().await? {
        println!(
            "{}\t{}",
            dataset.key(),
            dataset
                .title_in(Language::English)
                .or(dataset.title())
                .unwrap_or("")
        );
    }

    let labels = countries
        .get_units(
            &UnitFilter::countries(["RO", "IT", "FR"]),
            UnitRequest::label(Projection::Epsg4326),
            None,
        )
        .await?;
    println!("{} label points", labels.feature_count());
    Ok(())
}
