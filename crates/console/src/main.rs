use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use client::{
    GeozoneApi, HttpGeozoneClient, HttpUserClient, InMemoryGeozoneApi, StaticUserApi, UserApi,
};
use console::config::Config;
use console::controller::GeozoneController;
use console::logging;
use console::map::headless::HeadlessSurface;
use console::map::surface::MapSurface;
use console::notify::{Notifier, TracingNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!("Starting Geozone console v{}", env!("CARGO_PKG_VERSION"));

    let surface: Arc<dyn MapSurface> = Arc::new(HeadlessSurface::new());
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    let (api, user_api): (Arc<dyn GeozoneApi>, Arc<dyn UserApi>) = if config.backend.mock {
        info!("Using in-memory backend");
        (
            Arc::new(InMemoryGeozoneApi::new()),
            Arc::new(StaticUserApi::new(Vec::new())),
        )
    } else {
        (
            Arc::new(HttpGeozoneClient::new(config.backend.clone())?),
            Arc::new(HttpUserClient::new(config.backend.clone())?),
        )
    };

    let controller = GeozoneController::new(api, user_api, surface, notifier, config.map.style);
    controller.start().await;

    info!(
        records = controller.records().len(),
        total = controller.total(),
        overlays = controller.overlay_count(),
        users = controller.users().len(),
        "Initial synchronization complete"
    );

    controller.shutdown().await;
    Ok(())
}
