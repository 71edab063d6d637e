use serde::Deserialize;
use serde_json::{Map, Value};

/// Envelope `code` of a successful vendor response.
pub const SUCCESS_CODE: &str = "0";

/* Generic error */
#[derive(Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Value,
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Vendor codes arrive as strings, occasionally as numbers.
    pub fn code(&self) -> Option<String> {
        match &self.code {
            Value::String(s) => Some(s.to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

pub mod device_list {
    use serde::Deserialize;

    /// One bound device. Either field may be null or missing on stale bindings.
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Data {
        #[serde(default)]
        pub sn: Option<String>,
        #[serde(default)]
        pub product_name: Option<String>,
    }

    #[derive(Deserialize)]
    pub struct DeviceList {
        pub data: Option<Vec<Data>>,
    }
}

/// Flat `quota key -> value` map returned by the quota endpoints.
#[derive(Deserialize)]
pub struct Quotas {
    pub data: Option<Map<String, Value>>,
}

impl Quotas {
    /// Numeric quota value, `0.0` when the vendor left it out.
    pub fn watts(&self, quota: &str) -> f64 {
        self.data
            .as_ref()
            .and_then(|data| data.get(quota))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::device_list::DeviceList;
    use super::{ErrorResponse, Quotas};
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    #[test]
    fn device_list() {
        let input = read_resource("deviceList.json");
        let output: DeviceList = serde_json::from_str(&input).unwrap();
        let data = output.data.unwrap();
        assert_eq!(4, data.len());
        assert_eq!(Some("HW51ZOH4SF4E0001"), data[0].sn.as_deref());
        assert_eq!(Some("PowerStream"), data[0].product_name.as_deref());
        assert_eq!(Some("Smart Plug"), data[1].product_name.as_deref());
    }

    #[test]
    fn device_list_with_unnamed_entry() {
        let input = read_resource("deviceList_unnamed.json");
        let output: DeviceList = serde_json::from_str(&input).unwrap();
        let data = output.data.unwrap();
        assert_eq!(4, data.len());
        assert_eq!(Some("X9"), data[2].sn.as_deref());
        assert!(data[2].product_name.is_none());
        assert!(data[3].sn.is_none());
    }

    #[test]
    fn device_list_without_data() {
        let output: DeviceList = serde_json::from_str(r#"{"code":"0"}"#).unwrap();
        assert!(output.data.is_none());
    }

    #[test]
    fn inverter_quota() {
        let input = read_resource("inverterQuota.json");
        let output: Quotas = serde_json::from_str(&input).unwrap();
        assert_eq!(5000.0, output.watts("20_1.geneWatt"));
        assert_eq!(1200.0, output.watts("20_1.permanentWatts"));
        assert_eq!(8000.0, output.watts("20_1.floadLimitOut"));
        assert_eq!(1150.0, output.watts("20_1.consWatt"));
    }

    #[test]
    fn missing_quota_defaults_to_zero() {
        let input = read_resource("inverterQuota_partial.json");
        let output: Quotas = serde_json::from_str(&input).unwrap();
        assert_eq!(480.5, output.watts("20_1.geneWatt"));
        assert_eq!(0.0, output.watts("20_1.permanentWatts"));

        let empty: Quotas = serde_json::from_str(r#"{"code":"0"}"#).unwrap();
        assert_eq!(0.0, empty.watts("2_1.watts"));
    }

    #[test]
    fn error_envelope() {
        let input = read_resource("errorEnvelope.json");
        let output: ErrorResponse = serde_json::from_str(&input).unwrap();
        assert_eq!(Some("8521".to_string()), output.code());
        assert_eq!(Some("signature is wrong".to_string()), output.message);

        let numeric: ErrorResponse = serde_json::from_str(r#"{"code":1006}"#).unwrap();
        assert_eq!(Some("1006".to_string()), numeric.code());
    }

    #[test]
    #[should_panic]
    fn device_list_invalid_json() {
        let input = read_resource("invalid_json.json");
        let _output: DeviceList = serde_json::from_str(&input).unwrap();
    }
}
