use axum::Json;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::provider::target::Endpoint;
use crate::state::AppState;

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn describe(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::SetActivity => "Activate or deactivate subscription",
        Endpoint::SetSubscriptionDiscount => "Set discount for future subscription payments",
        Endpoint::SetSubscriptionPaymentDate => "Set next subscription payment date",
    }
}

/// `GET /`
pub async fn info() -> Json<Value> {
    let endpoints: Map<String, Value> = Endpoint::ALL
        .into_iter()
        .map(|endpoint| {
            (
                endpoint.as_str().to_owned(),
                json!({
                    "method": "POST",
                    "path": format!("/{endpoint}"),
                    "description": describe(endpoint),
                }),
            )
        })
        .collect();

    Json(json!({
        "name": "Prodamus API Wrapper",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Simple API wrapper for Prodamus subscription management",
        "status": "running",
        "timestamp": timestamp(),
        "endpoints": endpoints,
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    let available: Map<String, Value> = Endpoint::ALL
        .into_iter()
        .map(|endpoint| {
            (
                endpoint.as_str().to_owned(),
                Value::String(format!("POST /{endpoint}")),
            )
        })
        .collect();

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Route not found",
            "message": format!("Cannot {method} {uri}"),
            "availableEndpoints": available,
        })),
    )
}
