//! Loopback stand-in for the prediction service.
//!
//! Speaks the same wire contract so the console can be exercised offline.
//! The estimate is a fixed per-subsystem placeholder, not a model output.

use anyhow::Context;
use log::info;
use rulcore::Subsystem;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::reply::{self, Json, WithStatus};
use warp::Filter;

const STUB_VERSION: &str = "stub";

fn placeholder_rul(subsystem: Subsystem) -> f64 {
    match subsystem {
        Subsystem::Engine => 120.0,
        Subsystem::Hydraulics => 80.0,
        Subsystem::LandingGear => 60.0,
    }
}

/// Only the service's own path segments; CLI aliases are not endpoints.
fn from_slug(slug: &str) -> Option<Subsystem> {
    Subsystem::ALL.into_iter().find(|subsystem| subsystem.slug() == slug)
}

fn detail(status: StatusCode, message: String) -> WithStatus<Json> {
    reply::with_status(reply::json(&json!({ "detail": message })), status)
}

/// Checks that `item` carries every required field as a number.
fn check_item(subsystem: Subsystem, item: &Value) -> Result<(), String> {
    let fields = item
        .as_object()
        .ok_or_else(|| "each item must be a JSON object".to_string())?;
    let missing: Vec<&str> = subsystem
        .required_columns()
        .filter(|name| !fields.get(*name).is_some_and(Value::is_number))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing or non-numeric fields: {}", missing.join(", ")))
    }
}

fn prediction(subsystem: Subsystem) -> Value {
    json!({
        "predicted_rul": placeholder_rul(subsystem),
        "units": "cycles",
        "model_version": STUB_VERSION,
    })
}

fn single(slug: String, body: Value) -> WithStatus<Json> {
    let Some(subsystem) = from_slug(&slug) else {
        return detail(StatusCode::NOT_FOUND, format!("unknown subsystem '{slug}'"));
    };
    match check_item(subsystem, &body) {
        Ok(()) => reply::with_status(reply::json(&prediction(subsystem)), StatusCode::OK),
        Err(message) => detail(StatusCode::UNPROCESSABLE_ENTITY, message),
    }
}

fn batch(slug: String, body: Map<String, Value>) -> WithStatus<Json> {
    let Some(subsystem) = from_slug(&slug) else {
        return detail(StatusCode::NOT_FOUND, format!("unknown subsystem '{slug}'"));
    };
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "body must contain 'items'".into());
    };
    if items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "items must not be empty".into());
    }
    for (idx, item) in items.iter().enumerate() {
        if let Err(message) = check_item(subsystem, item) {
            return detail(StatusCode::UNPROCESSABLE_ENTITY, format!("item {idx}: {message}"));
        }
    }
    let predictions: Vec<Value> = items.iter().map(|_| prediction(subsystem)).collect();
    info!("stub answered {} {} items", items.len(), subsystem);
    reply::with_status(reply::json(&json!({ "predictions": predictions })), StatusCode::OK)
}

/// `GET /health`, `POST /predict/{slug}`, and `POST /predict/{slug}/batch`.
pub fn routes() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| reply::json(&json!({ "status": "ok", "version": STUB_VERSION })));

    let single_route = warp::path!("predict" / String)
        .and(warp::post())
        .and(warp::body::json())
        .map(single);

    let batch_route = warp::path!("predict" / String / "batch")
        .and(warp::post())
        .and(warp::body::json())
        .map(batch);

    health.or(single_route).or(batch_route)
}

/// Serves the stub on `addr` until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(routes())
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .with_context(|| format!("binding stub service on {addr}"))?;
    info!("stub prediction service listening on http://{bound}");
    server.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_answers_one_prediction_per_item() {
        let body = json!({"items": [
            {"load_during_landing": 75.0, "tire_pressure": 32.5, "speed_during_landing": 160.0},
            {"load_during_landing": 70.0, "tire_pressure": 31.0, "speed_during_landing": 150.0}
        ]});
        let resp = warp::test::request()
            .method("POST")
            .path("/predict/landing-gear/batch")
            .json(&body)
            .reply(&routes())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let value: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(value["predictions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_field_is_reported_as_detail() {
        let resp = warp::test::request()
            .method("POST")
            .path("/predict/engine")
            .json(&json!({"op_setting_1": 0.0}))
            .reply(&routes())
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let value: Value = serde_json::from_slice(resp.body()).unwrap();
        assert!(value["detail"].as_str().unwrap().contains("op_setting_2"));
    }

    #[tokio::test]
    async fn unknown_subsystem_is_not_found() {
        let resp = warp::test::request()
            .method("POST")
            .path("/predict/rotor")
            .json(&json!({}))
            .reply(&routes())
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cli_aliases_are_not_endpoints() {
        for path in ["/predict/lg", "/predict/hyd", "/predict/landing_gear/batch"] {
            let resp = warp::test::request()
                .method("POST")
                .path(path)
                .json(&json!({"items": [{}]}))
                .reply(&routes())
                .await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}
