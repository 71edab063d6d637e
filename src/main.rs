use ecoflow_rs::{api, server, settings};

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = settings::read_settings()?;
    let api = api::api(settings.api_url, settings.access_key, settings.secret_key)?;

    let figment = rocket::Config::figment()
        .merge(("port", settings.port))
        .merge(("address", settings.address));

    log::info!("EcoFlow API server starting on port {}", settings.port);

    server::rocket(figment, api)
        .launch()
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}
