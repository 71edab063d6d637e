use crate::Error;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

const API_URL: &str = "https://api-a.ecoflow.com/iot-open";
const PORT: u16 = 3000;
const ADDRESS: &str = "0.0.0.0";

const DECK_API_URL: &str = "http://localhost:3000";
const DECK_POLL_INTERVAL_MS: i64 = 30_000;

#[derive(Clone, Deserialize)]
struct EcoflowConfig {
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    address: String,
}

/// Validated settings of the HTTP service.
#[derive(Clone)]
pub struct Settings {
    pub access_key: String,
    pub secret_key: String,
    pub api_url: String,
    pub port: u16,
    pub address: String,
}

/// Settings of the display poller.
#[derive(Debug, Clone, Deserialize)]
pub struct DeckSettings {
    pub api_url: String,
    pub poll_interval_ms: u64,
}

fn config_err(error: ConfigError) -> Error {
    Error::Configuration(error.to_string())
}

/// Read service settings from `ECOFLOW_*` environment variables, with plain `PORT` as the
/// fallback listen port.
pub fn read_settings() -> Result<Settings, Error> {
    let mut settings = Config::default();
    settings
        .merge(Environment::with_prefix("ECOFLOW"))
        .map_err(config_err)?;

    settings_from(with_fallback_port(settings, std::env::var("PORT").ok())?)
}

/// Use `port` unless the configuration sets one itself.
fn with_fallback_port(mut settings: Config, port: Option<String>) -> Result<Config, Error> {
    if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
        settings
            .set_default("port", port.trim())
            .map_err(config_err)?;
    }
    Ok(settings)
}

/// Apply defaults to `settings` and validate credentials.
///
/// `base_url` and `api_url` both name the vendor endpoint; `base_url` wins when both are set.
pub fn settings_from(mut settings: Config) -> Result<Settings, Error> {
    settings
        .set_default("address", ADDRESS)
        .map_err(config_err)?;

    let config: EcoflowConfig = settings.try_into().map_err(config_err)?;
    let api_url = config
        .base_url
        .or(config.api_url)
        .unwrap_or_else(|| API_URL.to_string());

    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    match (present(config.access_key), present(config.secret_key)) {
        (Some(access_key), Some(secret_key)) => Ok(Settings {
            access_key,
            secret_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            port: config.port.unwrap_or(PORT),
            address: config.address,
        }),
        _ => Err(Error::MissingCredentials),
    }
}

/// Read poller settings from `DECK_*` environment variables.
pub fn read_deck_settings() -> Result<DeckSettings, Error> {
    let mut settings = Config::default();
    settings
        .merge(Environment::with_prefix("DECK"))
        .and_then(|s| s.set_default("api_url", DECK_API_URL))
        .and_then(|s| s.set_default("poll_interval_ms", DECK_POLL_INTERVAL_MS))
        .map_err(config_err)?;

    settings.try_into().map_err(config_err)
}
