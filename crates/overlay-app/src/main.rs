//! Overlay process - keeps a 3D model anchored on the map in step with a
//! live position feed.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use overlay_app::config::Config;
use overlay_app::overlay::Overlay;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env if present; the process environment still wins.
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("overlay_app=debug".parse()?);
    if config.log_json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }

    tracing::info!("Starting overlay...");
    tracing::info!(
        "Origin ({}, {}), tracking entity {} in room '{}'",
        config.origin.lat(),
        config.origin.lon(),
        config.target_entity_id,
        config.feed_room
    );
    if config.feed_token.is_none() {
        tracing::warn!("SOCKET_IO_API_KEY is not set; connecting without credentials");
    }

    let asset_dir = std::env::current_dir()?;
    let overlay = Overlay::attach(config, asset_dir);
    overlay.run().await
}
