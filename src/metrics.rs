use crate::model::{Api, PowerStatus};
use crate::Error;
use prometheus::{Encoder, Gauge, GaugeVec, TextEncoder};

lazy_static! {
    static ref GENERATION_GAUGE: Gauge = register_gauge!(opts!(
        "generation_watts",
        "current generation reported by inverter (in deciwatts)",
    ))
    .unwrap();
    static ref CONSUMPTION_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "consumption_watts",
            "current consumption by source (in deciwatts)",
        ),
        &["source"],
    )
    .unwrap();
    static ref NET_LOAD_GAUGE: Gauge = register_gauge!(opts!(
        "net_load_watts",
        "total consumption minus generation, negative on surplus (in deciwatts)",
    ))
    .unwrap();
    static ref OUTPUT_LIMIT_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("inverter_output_limit_watts", "inverter output limit"),
        &["serial_number"],
    )
    .unwrap();
    static ref PLUG_CONSUMPTION_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "smart_plug_consumption_watts",
            "current draw reported by smart plug",
        ),
        &["serial_number"],
    )
    .unwrap();
}

/// Feed PowerStatus `status` to Prometheus metrics.
///
/// Per-device series are rebuilt from scratch, so devices gone from the account disappear.
pub fn record(status: &PowerStatus) {
    GENERATION_GAUGE.set(status.generation.current);
    NET_LOAD_GAUGE.set(status.summary.net_load);

    let consumption = &status.consumption;
    for (source, watts) in &[
        ("inverter", consumption.reported_by_inverter),
        ("permanent", consumption.permanent_watt),
        ("smart_plugs", consumption.smart_plugs),
        ("total", consumption.total),
    ] {
        CONSUMPTION_GAUGE.with_label_values(&[*source]).set(*watts);
    }

    OUTPUT_LIMIT_GAUGE.reset();
    OUTPUT_LIMIT_GAUGE
        .with_label_values(&[&status.inverter.serial_number])
        .set(status.inverter.output_limit);

    PLUG_CONSUMPTION_GAUGE.reset();
    for plug in &status.smart_plugs {
        PLUG_CONSUMPTION_GAUGE
            .with_label_values(&[&plug.serial_number])
            .set(plug.consumption);
    }
}

/// Take a fresh snapshot from `api` and update the Prometheus exporter registry.
pub async fn collect(api: &Api) -> Result<PowerStatus, Error> {
    let status = crate::power_status(api).await?;
    record(&status);
    Ok(status)
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(Error::InternalError))?;
    String::from_utf8(buffer).or(Err(Error::InternalError))
}
