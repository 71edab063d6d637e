pub mod endpoint;
pub mod error;
pub mod response;
pub mod sign;

use crate::model;
pub use error::Error;
use reqwest::{RequestBuilder, Response};
use response::ErrorResponse;
use serde_json::{json, Value};
use std::time::Duration;

/// Upper bound for every vendor round trip.
const TIMEOUT: Duration = Duration::from_secs(10);

pub fn api(api_url: String, access_key: String, secret_key: String) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .timeout(TIMEOUT)
        .build()
        .or(Err(Error::InternalError))?;

    Ok(model::Api {
        api_url,
        signer: sign::Signer::new(access_key, secret_key),
        client,
    })
}

/// Map transport-level and non-2xx failures to Error
fn map_api_err(error: reqwest::Error) -> Error {
    if error.is_connect() || error.is_timeout() {
        return Error::VendorUnreachable(error.to_string());
    }

    match error.status() {
        Some(status @ http::StatusCode::UNAUTHORIZED) | Some(status @ http::StatusCode::FORBIDDEN) => {
            Error::VendorError {
                status: Some(status.as_u16()),
                message: format!("credentials rejected: {}", error),
            }
        }
        Some(status) => Error::VendorError {
            status: Some(status.as_u16()),
            message: error.to_string(),
        },
        None => Error::VendorUnreachable(error.to_string()),
    }
}

/// Process value of valid HTTP response (2xx) to identify an API-level error indicated with a
/// non-zero `code`. Responses without a `code` are carried forward as they are.
fn map_response_status(value: Value) -> Result<Value, Error> {
    let envelope = serde_json::from_value::<ErrorResponse>(value.clone()).ok();

    match envelope.as_ref().and_then(ErrorResponse::code) {
        None => Ok(value),
        Some(code) if code == response::SUCCESS_CODE => Ok(value),
        Some(code) => Err(Error::VendorError {
            status: None,
            message: format!(
                "code {}: {}",
                code,
                envelope
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "(no error message received)".to_string())
            ),
        }),
    }
}

async fn send(request: RequestBuilder, endpoint: &endpoint::Endpoint) -> Result<Value, Error> {
    let text = request
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(map_api_err)?
        .text()
        .await
        .map_err(|e| Error::VendorUnreachable(format!("Error reading API response: {}", e)))?;

    log::trace!("endpoint: {}, response_text: {}", endpoint, text);

    serde_json::from_str::<Value>(&text)
        .map_err(|e| Error::InvalidResponse(text, e.to_string()))
        .and_then(map_response_status)
}

/// Signed GET; the flattened params travel as the query string.
async fn get(
    api: &model::Api,
    endpoint: &endpoint::Endpoint,
    params: Value,
) -> Result<Value, Error> {
    let url = format!("{}{}", api.api_url, endpoint);
    let signed = api.signer.signed_request(params)?;
    let query = signed.query();

    let request = signed.apply(api.client.get(url));
    let request = if query.is_empty() {
        request
    } else {
        request.query(&query)
    };

    send(request, endpoint).await
}

/// Signed POST; the params travel unflattened as the JSON body.
async fn post(
    api: &model::Api,
    endpoint: &endpoint::Endpoint,
    params: Value,
) -> Result<Value, Error> {
    let url = format!("{}{}", api.api_url, endpoint);
    let signed = api.signer.signed_request(params)?;

    log::trace!("endpoint: {}, data: {}", endpoint, signed.body);

    let request = signed.apply(api.client.post(url)).json(&signed.body);
    send(request, endpoint).await
}

/// Raw device list envelope.
pub async fn device_list(api: &model::Api) -> Result<Value, Error> {
    get(api, endpoint::DEVICES, json!({})).await
}

/// Read selected `quotas` of device `sn`.
pub async fn device_quotas(api: &model::Api, sn: &str, quotas: &[&str]) -> Result<Value, Error> {
    let params = json!({
        "sn": sn,
        "params": {
            "quotas": quotas,
        }
    });

    post(api, endpoint::DEVICE_QUOTA, params).await
}

/// Read every quota device `sn` reports.
pub async fn device_all_quotas(api: &model::Api, sn: &str) -> Result<Value, Error> {
    get(api, endpoint::DEVICE_QUOTA_ALL, json!({ "sn": sn })).await
}
