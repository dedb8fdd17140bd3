use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Serialize;

use super::{IdRef, ImportRequest, decode, with_store};
use crate::engine::import::import_couriers;
use crate::engine::rating::courier_profile;
use crate::engine::reconciliation::update_courier;
use crate::error::AppError;
use crate::models::assignment::DispatchEvent;
use crate::models::courier::{Courier, CourierId, CourierPatch, CourierProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", post(create_couriers))
        .route("/couriers/:id", get(get_courier).patch(patch_courier))
}

#[derive(Serialize)]
pub struct ImportCouriersResponse {
    pub couriers: Vec<IdRef>,
}

async fn create_couriers(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportCouriersResponse>), AppError> {
    let request: ImportRequest = decode(payload)?;

    let result = with_store(&state, move |store| import_couriers(store, &request.data)).await;
    let outcome = if result.is_ok() { "success" } else { "rejected" };
    state
        .metrics
        .imports_total
        .with_label_values(&["couriers", outcome])
        .inc();

    let ids = result?;
    Ok((
        StatusCode::CREATED,
        Json(ImportCouriersResponse {
            couriers: ids.into_iter().map(IdRef::from).collect(),
        }),
    ))
}

async fn patch_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CourierId>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<Courier>, AppError> {
    let patch: CourierPatch = decode(payload)?;

    let start = Instant::now();
    let result = with_store(&state, move |store| update_courier(store, id, patch)).await;
    state
        .metrics
        .observe("reconcile", start.elapsed().as_secs_f64(), &result);

    let (courier, released) = result?;
    if !released.is_empty() {
        state
            .metrics
            .orders_unassigned_total
            .inc_by(released.len() as u64);
        state.publish(DispatchEvent::Unassigned {
            courier_id: id,
            order_ids: released,
        });
    }

    Ok(Json(courier))
}

async fn get_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CourierId>,
) -> Result<Json<CourierProfile>, AppError> {
    let start = Instant::now();
    let result = with_store(&state, move |store| courier_profile(store, id)).await;
    state
        .metrics
        .observe("rating", start.elapsed().as_secs_f64(), &result);

    Ok(Json(result?))
}
