pub mod couriers;
pub mod orders;
pub mod ws;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::Store;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(couriers::router())
        .merge(orders::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// `{"id": n}` element of import and assign responses.
#[derive(Debug, Serialize)]
pub struct IdRef {
    pub id: i64,
}

impl From<i64> for IdRef {
    fn from(id: i64) -> Self {
        Self { id }
    }
}

/// Import envelope. Records stay raw so each one can be validated and reported on its own.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportRequest {
    pub data: Vec<serde_json::Value>,
}

/// Every malformed body is a 400, whatever stage of decoding failed.
pub fn decode<T: DeserializeOwned>(
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = payload.map_err(|err| AppError::BadRequest(err.body_text()))?;
    serde_json::from_value(value).map_err(|err| AppError::BadRequest(err.to_string()))
}

/// Runs `f` against the store on the blocking pool. SQLite calls hold the connection lock and
/// must stay off the async workers.
pub async fn with_store<T, F>(state: &Arc<AppState>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Store) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.store))
        .await
        .map_err(|err| AppError::Internal(format!("store task failed: {err}")))?
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    couriers: i64,
    orders: i64,
    active_assignments: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let stats = with_store(&state, |store| Ok(store.stats()?)).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        couriers: stats.couriers,
        orders: stats.orders,
        active_assignments: stats.active_assignments,
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
