use crate::model::PowerStatus;
use serde::Deserialize;
use std::time::Duration;

const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, thiserror::Error)]
pub enum DeckError {
    #[error("Cannot connect to EcoFlow API server: {0}")]
    Offline(String),
    #[error("Timed out waiting for EcoFlow API server")]
    Timeout,
    #[error("No response from EcoFlow API server: {0}")]
    NoResponse(String),
    #[error("API Error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
}

fn map_request_err(error: reqwest::Error) -> DeckError {
    if error.is_timeout() {
        DeckError::Timeout
    } else if error.is_connect() {
        DeckError::Offline(error.to_string())
    } else if error.is_request() {
        DeckError::NoResponse(error.to_string())
    } else {
        DeckError::Network(error.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    success: bool,
    data: Option<PowerStatus>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Health {
    status: String,
}

/// Client of the local `/power-status` service.
#[derive(Debug, Clone)]
pub struct StatusClient {
    base_url: String,
    client: reqwest::Client,
}

impl StatusClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DeckError> {
        let client = reqwest::ClientBuilder::new()
            .build()
            .map_err(|e| DeckError::Network(e.to_string()))?;

        Ok(StatusClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn power_status(&self) -> Result<PowerStatus, DeckError> {
        let response = self
            .client
            .get(format!("{}/power-status", self.base_url))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .map_err(map_request_err)?;

        let status = response.status();
        let envelope = response
            .json::<StatusEnvelope>()
            .await
            .map_err(|e| DeckError::Network(e.to_string()))?;

        let message = || {
            envelope
                .error
                .as_ref()
                .map(|e| e.message.to_owned())
                .unwrap_or_else(|| "Failed to get power status".to_string())
        };

        if !status.is_success() || !envelope.success {
            return Err(DeckError::Api {
                status: status.as_u16(),
                message: message(),
            });
        }

        envelope.data.ok_or_else(|| DeckError::Api {
            status: status.as_u16(),
            message: "Response carried no power status".to_string(),
        })
    }

    /// `true` iff `/health` answers in time with `status: healthy`.
    pub async fn check_health(&self) -> bool {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) => response
                .json::<Health>()
                .await
                .map(|health| health.status == "healthy")
                .unwrap_or(false),
            Err(e) => {
                log::debug!("health check failed: {}", e);
                false
            }
        }
    }
}
