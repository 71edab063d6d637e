#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

pub mod api;
pub mod deck;
pub mod metrics;
pub mod model;
pub mod server;
pub mod settings;

pub use api::api;
pub use api::Error;
use api::response::device_list::DeviceList;
use api::response::Quotas;
use model::{Device, InverterQuota, PlugConsumption, PowerStatus, ProductType, Watts};

const GENERATION: &str = "20_1.geneWatt";
const PERMANENT_WATTS: &str = "20_1.permanentWatts";
const OUTPUT_LIMIT: &str = "20_1.floadLimitOut";
const CONSUMPTION: &str = "20_1.consWatt";
const INVERTER_QUOTAS: [&str; 4] = [GENERATION, PERMANENT_WATTS, OUTPUT_LIMIT, CONSUMPTION];

const PLUG_WATTS: &str = "2_1.watts";

/// List all devices bound to the account. An empty or absent list is an error.
///
/// Entries without a serial number or product name are skipped.
pub async fn devices(api: &model::Api) -> Result<Vec<Device>, Error> {
    let value = api::device_list(api).await?;
    let response = serde_json::from_value::<DeviceList>(value.clone())
        .map_err(|e| Error::InvalidResponse(value.to_string(), e.to_string()))?;

    let devices: Vec<Device> = response
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|resp| match (resp.sn, resp.product_name) {
            (Some(serial_number), Some(product_name)) => Some(Device {
                serial_number,
                product_name,
            }),
            (sn, _) => {
                log::debug!("Skipping incomplete device entry {:?}", sn);
                None
            }
        })
        .collect();

    if devices.is_empty() {
        Err(Error::NoDevicesFound)
    } else {
        Ok(devices)
    }
}

/// Read generation, load and output limit of the inverter. Missing quotas read as zero.
pub async fn inverter_quota(
    api: &model::Api,
    serial_number: &str,
) -> Result<InverterQuota, Error> {
    let value = api::device_quotas(api, serial_number, &INVERTER_QUOTAS).await?;
    let quotas = serde_json::from_value::<Quotas>(value.clone())
        .map_err(|e| Error::InvalidResponse(value.to_string(), e.to_string()))?;

    Ok(InverterQuota {
        generation: quotas.watts(GENERATION),
        permanent_watt: quotas.watts(PERMANENT_WATTS),
        output_limit: quotas.watts(OUTPUT_LIMIT),
        consumption_reported: quotas.watts(CONSUMPTION),
    })
}

/// Read current draw of one smart plug.
pub async fn plug_watts(api: &model::Api, serial_number: &str) -> Result<Watts, Error> {
    let plug_error = |e: Error| Error::PlugQuotaFailed {
        serial_number: serial_number.to_owned(),
        reason: e.to_string(),
    };

    let value = api::device_quotas(api, serial_number, &[PLUG_WATTS])
        .await
        .map_err(plug_error)?;

    serde_json::from_value::<Quotas>(value)
        .map(|quotas| quotas.watts(PLUG_WATTS))
        .map_err(|e| plug_error(Error::InvalidResponse(String::new(), e.to_string())))
}

/// Plug reading that degrades to zero on failure, so one bad plug never loses the others.
async fn plug_consumption(api: &model::Api, serial_number: String) -> PlugConsumption {
    let consumption = plug_watts(api, &serial_number).await.unwrap_or_else(|e| {
        log::warn!("{}", e);
        0.0
    });

    PlugConsumption::new(serial_number, consumption)
}

/// Aggregate inverter and smart plug telemetry into one PowerStatus snapshot.
///
/// Device listing and the inverter call are fatal; plug calls run concurrently and fall back to
/// zero individually. If several inverters are bound, the first one listed is used.
pub async fn power_status(api: &model::Api) -> Result<PowerStatus, Error> {
    let devices = devices(api).await?;

    let inverter = devices
        .iter()
        .find(|device| device.product_type() == ProductType::Inverter)
        .ok_or(Error::InverterNotFound)?;

    let plugs: Vec<String> = devices
        .iter()
        .filter(|device| device.product_type() == ProductType::SmartPlug)
        .map(|device| device.serial_number.to_owned())
        .collect();

    let quota = inverter_quota(api, &inverter.serial_number).await?;

    let smart_plugs = futures::future::join_all(
        plugs
            .into_iter()
            .map(|serial_number| plug_consumption(api, serial_number)),
    )
    .await;

    Ok(PowerStatus::new(
        inverter.serial_number.to_owned(),
        quota,
        smart_plugs,
        chrono::Utc::now(),
    ))
}
