use crate::model::Api;
use crate::{api, metrics, Error};
use chrono::Utc;
use rocket::figment::Figment;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket, State};
use serde_json::{json, Value};

const NAME: &str = "EcoFlow Home Automation API";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// State for API handlers. Only the immutable vendor handle; every request aggregates afresh.
pub struct StateData {
    api: Api,
}

fn success(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// Log a failed handler before it is turned into a 500 response.
fn logged(context: &str) -> impl Fn(Error) -> Error + '_ {
    move |e| {
        log::error!("Error getting {}: {}", context, e);
        e
    }
}

#[get("/")]
fn index_route() -> Json<Value> {
    Json(json!({
        "name": NAME,
        "version": VERSION,
        "description": "Internal API for EcoFlow PowerStream and Smart Plug monitoring",
        "endpoints": {
            "/": "API information",
            "/health": "Health check",
            "/power-status": "Get current power generation and consumption data",
            "/devices": "List all devices",
            "/devices/<sn>/quotas": "Get device quota information",
            "/metrics": "Prometheus metrics",
        },
        "timestamp": Utc::now(),
    }))
}

#[get("/health")]
fn health_route() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "version": VERSION,
    }))
}

#[get("/power-status")]
async fn power_status_route(state: &State<StateData>) -> Result<Json<Value>, Error> {
    crate::power_status(&state.api)
        .await
        .map(success)
        .map_err(logged("power status"))
}

#[get("/devices")]
async fn devices_route(state: &State<StateData>) -> Result<Json<Value>, Error> {
    api::device_list(&state.api)
        .await
        .map(success)
        .map_err(logged("devices"))
}

/// Selected quotas when `values` lists any (comma separated), all quotas otherwise.
#[get("/devices/<sn>/quotas?<values>")]
async fn device_quotas_route(
    sn: &str,
    values: Option<&str>,
    state: &State<StateData>,
) -> Result<Json<Value>, Error> {
    let quotas: Vec<&str> = values
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|quota| !quota.is_empty())
        .collect();

    let response = if quotas.is_empty() {
        api::device_all_quotas(&state.api, sn).await
    } else {
        api::device_quotas(&state.api, sn, &quotas).await
    };

    let context = format!("device quota for {}", sn);
    response.map(success).map_err(logged(&context))
}

/// Aggregate once and expose the snapshot in Prometheus text format.
#[get("/metrics")]
async fn metrics_route(state: &State<StateData>) -> Result<String, Error> {
    metrics::collect(&state.api)
        .await
        .map_err(logged("metrics"))?;
    metrics::read()
}

#[catch(404)]
fn not_found(request: &Request<'_>) -> Json<Value> {
    Json(json!({
        "success": false,
        "error": {
            "message": "Endpoint not found",
            "path": request.uri().path().to_string(),
            "timestamp": Utc::now(),
        }
    }))
}

pub fn rocket(figment: Figment, api: Api) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(StateData { api })
        .mount(
            "/",
            routes![
                index_route,
                health_route,
                power_status_route,
                devices_route,
                device_quotas_route,
                metrics_route
            ],
        )
        .register("/", catchers![not_found])
}
