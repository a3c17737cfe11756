//! API route definitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::state::AppState;
use crate::assurance::EdgeField;
use crate::error::Fetched;
use crate::report;

type Reply = (StatusCode, Json<Value>);

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/servers", get(servers))
        .route("/assets/{asset}", get(asset_metadata))
        .route("/impact/{asset}", get(impact))
        .route("/assurance/{asset}", get(assurance))
        .route("/report/{asset}", get(incident_report))
        .route("/narrative/parse", post(parse_narrative))
}

fn meta() -> Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })
}

fn ok<T: Serialize>(data: T) -> Reply {
    (StatusCode::OK, Json(json!({ "data": data, "meta": meta() })))
}

fn error(status: StatusCode, message: String) -> Reply {
    (
        status,
        Json(json!({ "data": null, "meta": { "error": message, "timestamp": chrono::Utc::now().to_rfc3339() } })),
    )
}

/// Failed upstream -> 502, empty -> explicit "no data".
fn fetched<T: Serialize>(result: Fetched<T>) -> Reply {
    match result {
        Fetched::Data(data) => ok(data),
        Fetched::Empty => (
            StatusCode::OK,
            Json(json!({ "data": null, "meta": { "message": "no data" } })),
        ),
        Fetched::Failed(msg) => error(StatusCode::BAD_GATEWAY, msg),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": meta()
    }))
}

async fn servers(State(state): State<AppState>) -> Reply {
    fetched(Fetched::from_result(state.source.servers().await, |s| s.is_empty()))
}

async fn asset_metadata(State(state): State<AppState>, Path(asset): Path<String>) -> Reply {
    match state.catalog.get(&asset) {
        Some(meta) => ok(meta),
        None => error(StatusCode::NOT_FOUND, format!("unknown asset '{}'", asset)),
    }
}

async fn impact(State(state): State<AppState>, Path(asset): Path<String>) -> Reply {
    fetched(report::assess(state.source.as_ref(), &asset).await)
}

/// Optional what-if adjustment applied before the score is returned.
#[derive(Debug, Deserialize)]
struct WhatIf {
    edge: Option<String>,
    field: Option<String>,
    value: Option<f64>,
}

async fn assurance(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Query(what_if): Query<WhatIf>,
) -> Reply {
    let mut model = match report::load_assurance(state.source.as_ref(), &asset).await {
        Fetched::Data(model) => model,
        other => return fetched(other.map(|m| m.state().clone())),
    };

    match (what_if.edge, what_if.field, what_if.value) {
        (None, None, None) => {}
        (Some(edge), Some(field), Some(value)) => {
            let applied = field
                .parse::<EdgeField>()
                .and_then(|field| model.update_by_name(&edge, field, value).map(|_| ()));
            if let Err(e) = applied {
                return error(StatusCode::BAD_REQUEST, e.to_string());
            }
        }
        _ => {
            return error(
                StatusCode::BAD_REQUEST,
                "what-if adjustment needs edge, field and value".to_string(),
            )
        }
    }

    ok(model.state())
}

async fn incident_report(State(state): State<AppState>, Path(asset): Path<String>) -> Reply {
    fetched(
        report::incident_report(
            state.source.as_ref(),
            state.parser.as_ref(),
            &state.catalog,
            &asset,
        )
        .await,
    )
}

async fn parse_narrative(State(state): State<AppState>, body: String) -> Reply {
    ok(state.parser.parse(&body))
}
