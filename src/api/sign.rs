//! Request signing for the EcoFlow open API.
//!
//! Every call carries `accessKey`, `nonce`, `timestamp` and `sign` headers. The signature is a
//! lowercase hex HMAC-SHA256 over the flattened, sorted request parameters followed by the three
//! auth pairs. Keys and values are joined verbatim, without any URL encoding.

use crate::api::Error;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde_json::Value;
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

pub const CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Nonces are drawn from `0..NONCE_BOUND`.
const NONCE_BOUND: u32 = 1_000_000;

/// Flatten `params` into `(key, value)` pairs.
///
/// Objects expand as `prefix.child`, arrays as `prefix[index]`, recursively. `null` values are
/// dropped, and so are empty objects and arrays, since they have no scalar leaves. Scalars keep
/// their plain string form: numbers in decimal, booleans as `true`/`false`, strings unquoted.
pub fn flatten(params: &Value, prefix: &str) -> Vec<(String, String)> {
    let mut flat = Vec::new();
    flatten_into(params, prefix, &mut flat);
    flat
}

fn flatten_into(value: &Value, key: &str, flat: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, child_value) in map {
                let child_key = if key.is_empty() {
                    child.to_owned()
                } else {
                    format!("{}.{}", key, child)
                };
                flatten_into(child_value, &child_key, flat);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &format!("{}[{}]", key, index), flat);
            }
        }
        Value::String(s) => flat.push((key.to_owned(), s.to_owned())),
        Value::Number(n) => flat.push((key.to_owned(), n.to_string())),
        Value::Bool(b) => flat.push((key.to_owned(), b.to_string())),
    }
}

/// Credential pair bound to the signing routine. The secret key never leaves this type.
#[derive(Clone)]
pub struct Signer {
    access_key: String,
    secret_key: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Signer {
    pub fn new(access_key: String, secret_key: String) -> Self {
        Signer {
            access_key,
            secret_key,
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Build the canonical string that gets signed: sorted request pairs, then the auth pairs in
    /// fixed `accessKey`, `nonce`, `timestamp` order.
    pub fn string_to_sign(&self, params: &Value, timestamp: &str, nonce: &str) -> String {
        let mut request_pairs = flatten(params, "");
        request_pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let auth_pairs = vec![
            format!("accessKey={}", self.access_key),
            format!("nonce={}", nonce),
            format!("timestamp={}", timestamp),
        ];

        request_pairs
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .chain(auth_pairs)
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn sign(&self, params: &Value, timestamp: &str, nonce: &str) -> Result<String, Error> {
        let string_to_sign = self.string_to_sign(params, timestamp, nonce);
        log::debug!("string to sign: {}", string_to_sign);

        let mut mac =
            HmacSha256::new_from_slice(self.secret_key.as_bytes()).or(Err(Error::InternalError))?;
        mac.update(string_to_sign.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Sign `params` with the current time and a fresh random nonce.
    pub fn signed_request(&self, params: Value) -> Result<SignedRequest, Error> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let nonce = rand::thread_rng().gen_range(0..NONCE_BOUND).to_string();
        self.signed_request_at(params, timestamp, nonce)
    }

    pub fn signed_request_at(
        &self,
        params: Value,
        timestamp: String,
        nonce: String,
    ) -> Result<SignedRequest, Error> {
        let sign = self.sign(&params, &timestamp, &nonce)?;

        Ok(SignedRequest {
            headers: AuthHeaders {
                access_key: self.access_key.to_owned(),
                nonce,
                timestamp,
                sign,
            },
            body: params,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthHeaders {
    pub access_key: String,
    pub nonce: String,
    pub timestamp: String,
    pub sign: String,
}

/// Auth headers plus the original, unflattened body they were computed over.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub headers: AuthHeaders,
    pub body: Value,
}

impl SignedRequest {
    /// Attach auth headers and the content type to `request`.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("accessKey", self.headers.access_key.as_str())
            .header("nonce", self.headers.nonce.as_str())
            .header("timestamp", self.headers.timestamp.as_str())
            .header("sign", self.headers.sign.as_str())
            .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
    }

    /// Flattened body as query pairs, for signed GET calls.
    pub fn query(&self) -> Vec<(String, String)> {
        flatten(&self.body, "")
    }
}
