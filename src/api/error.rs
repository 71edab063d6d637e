use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use serde_json::json;
use std::io::Cursor;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Missing required environment variables: ECOFLOW_ACCESS_KEY and ECOFLOW_SECRET_KEY")]
    MissingCredentials,
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("EcoFlow API unreachable: {0}")]
    VendorUnreachable(String),
    #[error("EcoFlow API error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    VendorError { status: Option<u16>, message: String },
    #[error("Invalid response from EcoFlow API ({1}): {0}")]
    InvalidResponse(String, String),
    #[error("No devices found for the account.")]
    NoDevicesFound,
    #[error("No PowerStream inverter found for the account.")]
    InverterNotFound,
    #[error("Failed to get consumption for plug {serial_number}: {reason}")]
    PlugQuotaFailed {
        serial_number: String,
        reason: String,
    },
    #[error("Internal error")]
    InternalError,
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = json!({
            "success": false,
            "error": {
                "message": self.to_string(),
                "timestamp": chrono::Utc::now(),
            }
        })
        .to_string();

        Response::build()
            .status(Status::InternalServerError)
            .sized_body(body.len(), Cursor::new(body))
            .header(ContentType::JSON)
            .ok()
    }
}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn vendor_error_message() {
        let with_status = Error::VendorError {
            status: Some(401),
            message: "unauthorized".to_string(),
        };
        assert_eq!(
            "EcoFlow API error (HTTP 401): unauthorized",
            with_status.to_string()
        );

        let envelope = Error::VendorError {
            status: None,
            message: "code 8521: signature is wrong".to_string(),
        };
        assert_eq!(
            "EcoFlow API error: code 8521: signature is wrong",
            envelope.to_string()
        );
    }

    #[test]
    fn plug_failure_names_the_plug() {
        let error = Error::PlugQuotaFailed {
            serial_number: "HW52ZDH4SF123456".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(error.to_string().contains("HW52ZDH4SF123456"));
    }
}
