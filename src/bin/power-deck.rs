use ecoflow_rs::deck::{LogSurface, Poller, StatusClient};
use ecoflow_rs::settings;
use std::sync::Arc;
use std::time::Duration;

const SURFACE: &str = "stdout";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = settings::read_deck_settings()?;
    let client = StatusClient::new(settings.api_url)?;

    if !client.check_health().await {
        log::warn!("API server at {} is not healthy", client.base_url());
    }

    let poller = Poller::new(client, Duration::from_millis(settings.poll_interval_ms));
    poller.appear(SURFACE, Arc::new(LogSurface::new(SURFACE))).await;

    tokio::signal::ctrl_c().await?;
    log::debug!("received ctrl-c, closing");
    poller.disappear(SURFACE);

    Ok(())
}
