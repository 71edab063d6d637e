use crate::api::sign::Signer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Watts = f64;

const UNIT: &str = "W";

pub const INVERTER_PRODUCT: &str = "PowerStream";
pub const PLUG_PRODUCT: &str = "Smart Plug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductType {
    Inverter,
    SmartPlug,
    Unsupported,
}

impl From<&str> for ProductType {
    fn from(product_name: &str) -> Self {
        match product_name {
            INVERTER_PRODUCT => ProductType::Inverter,
            PLUG_PRODUCT => ProductType::SmartPlug,
            _ => ProductType::Unsupported,
        }
    }
}

/// Vendor API handle: base URL, credential and a shared HTTP client.
#[derive(Debug, Clone)]
pub struct Api {
    pub api_url: String,
    pub signer: Signer,
    pub client: reqwest::Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    pub serial_number: String,
    pub product_name: String,
}

impl Device {
    pub fn product_type(&self) -> ProductType {
        ProductType::from(self.product_name.as_str())
    }
}

/// Inverter telemetry in vendor units (deciwatts).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverterQuota {
    pub generation: Watts,
    pub permanent_watt: Watts,
    pub output_limit: Watts,
    pub consumption_reported: Watts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub current: Watts,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub reported_by_inverter: Watts,
    pub permanent_watt: Watts,
    pub smart_plugs: Watts,
    pub total: Watts,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inverter {
    pub output_limit: Watts,
    pub serial_number: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlugConsumption {
    pub serial_number: String,
    pub consumption: Watts,
    pub unit: String,
}

impl PlugConsumption {
    pub fn new(serial_number: String, consumption: Watts) -> Self {
        PlugConsumption {
            serial_number,
            consumption,
            unit: UNIT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub net_load: Watts,
    pub is_generating: bool,
    pub is_consuming: bool,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerStatus {
    pub timestamp: DateTime<Utc>,
    pub generation: Generation,
    pub consumption: Consumption,
    pub inverter: Inverter,
    pub smart_plugs: Vec<PlugConsumption>,
    pub summary: Summary,
}

impl PowerStatus {
    /// Derive the balance from inverter telemetry and per-plug readings.
    ///
    /// Total consumption is the inverter's permanent load plus every plug; net load is total
    /// consumption minus generation, so a surplus is negative.
    pub fn new(
        inverter_serial_number: String,
        quota: InverterQuota,
        smart_plugs: Vec<PlugConsumption>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let plug_total: Watts = smart_plugs.iter().map(|plug| plug.consumption).sum();
        let total = quota.permanent_watt + plug_total;
        let net_load = total - quota.generation;

        PowerStatus {
            timestamp,
            generation: Generation {
                current: quota.generation,
                unit: UNIT.to_string(),
            },
            consumption: Consumption {
                reported_by_inverter: quota.consumption_reported,
                permanent_watt: quota.permanent_watt,
                smart_plugs: plug_total,
                total,
                unit: UNIT.to_string(),
            },
            inverter: Inverter {
                output_limit: quota.output_limit,
                serial_number: inverter_serial_number,
                unit: UNIT.to_string(),
            },
            smart_plugs,
            summary: Summary {
                net_load,
                is_generating: quota.generation > 0.0,
                is_consuming: total > 0.0,
                unit: UNIT.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::{InverterQuota, PlugConsumption, PowerStatus, ProductType};
    use chrono::{TimeZone, Utc};

    fn quota(generation: f64, permanent_watt: f64) -> InverterQuota {
        InverterQuota {
            generation,
            permanent_watt,
            output_limit: 8000.0,
            consumption_reported: 1100.0,
        }
    }

    fn plug(sn: &str, watts: f64) -> PlugConsumption {
        PlugConsumption::new(sn.to_string(), watts)
    }

    #[test]
    fn product_types() {
        assert_eq!(ProductType::Inverter, ProductType::from("PowerStream"));
        assert_eq!(ProductType::SmartPlug, ProductType::from("Smart Plug"));
        assert_eq!(ProductType::Unsupported, ProductType::from("RIVER 2"));
        assert_eq!(ProductType::Unsupported, ProductType::from("powerstream"));
    }

    #[test]
    fn no_plugs() {
        let status = PowerStatus::new("INV".to_string(), quota(0.0, 1200.0), vec![], Utc::now());

        assert_eq!(0.0, status.consumption.smart_plugs);
        assert_eq!(1200.0, status.consumption.total);
        assert_eq!(1200.0, status.summary.net_load);
        assert!(!status.summary.is_generating);
        assert!(status.summary.is_consuming);
    }

    #[test]
    fn surplus_is_negative() {
        let status = PowerStatus::new(
            "INV".to_string(),
            quota(500.0, 100.0),
            vec![plug("A", 150.0), plug("B", 50.0)],
            Utc::now(),
        );

        assert_eq!(200.0, status.consumption.smart_plugs);
        assert_eq!(300.0, status.consumption.total);
        assert_eq!(-200.0, status.summary.net_load);
        assert!(status.summary.is_generating);
    }

    #[test]
    fn deficit_is_positive() {
        let status = PowerStatus::new(
            "INV".to_string(),
            quota(100.0, 250.0),
            vec![plug("A", 50.0)],
            Utc::now(),
        );

        assert_eq!(200.0, status.summary.net_load);
        assert!(status.summary.is_generating);
    }

    #[test]
    fn nothing_running() {
        let status = PowerStatus::new("INV".to_string(), quota(0.0, 0.0), vec![], Utc::now());
        assert!(!status.summary.is_consuming);
        assert!(!status.summary.is_generating);
        assert_eq!(0.0, status.summary.net_load);
    }

    #[test]
    fn serializes_camel_case() {
        let status = PowerStatus::new(
            "HW51".to_string(),
            quota(500.0, 100.0),
            vec![plug("HW52", 200.0)],
            Utc.timestamp_millis_opt(1_671_171_709_428).unwrap(),
        );
        let value = serde_json::to_value(&status).unwrap();

        assert_eq!("2022-12-16T06:21:49.428Z", value["timestamp"]);
        assert_eq!(500.0, value["generation"]["current"]);
        assert_eq!(1100.0, value["consumption"]["reportedByInverter"]);
        assert_eq!(100.0, value["consumption"]["permanentWatt"]);
        assert_eq!(200.0, value["consumption"]["smartPlugs"]);
        assert_eq!(8000.0, value["inverter"]["outputLimit"]);
        assert_eq!("HW51", value["inverter"]["serialNumber"]);
        assert_eq!("HW52", value["smartPlugs"][0]["serialNumber"]);
        assert_eq!("W", value["smartPlugs"][0]["unit"]);
        assert_eq!(-200.0, value["summary"]["netLoad"]);
        assert_eq!(true, value["summary"]["isGenerating"]);
        assert_eq!(true, value["summary"]["isConsuming"]);

        let back: PowerStatus = serde_json::from_value(value).unwrap();
        assert_eq!(status, back);
    }
}
