use mxtcatalog::CatalogServerExt;
use mxtconfig::Config;
use mxtserver::{LoggingOptions, ServerBuilder};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_config(None)?;

    let mut server = ServerBuilder::new_configured(&config).build();
    server
        .init_logging(LoggingOptions::from_config(&config))
        .await;
    info!("🎵 Starting Mixtape v{}", env!("CARGO_PKG_VERSION"));

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "Mixtape",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    // Identifiants absents : erreur fatale avant l'ouverture du port
    let store = server.init_catalog(&config).await?;

    info!("🎵 Loading initial catalog...");
    match store.refresh().await {
        Ok(count) => info!("✅ Initial catalog loaded with {} tracks", count),
        Err(e) => warn!("⚠️ Initial catalog load failed, serving an empty catalog: {}", e),
    }

    server.start().await?;
    info!("🚀 Mixtape ready, waiting for Ctrl+C");
    server.wait().await;

    Ok(())
}
