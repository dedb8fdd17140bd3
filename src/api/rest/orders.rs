use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{IdRef, ImportRequest, decode, with_store};
use crate::engine::assignment::assign_orders;
use crate::engine::completion::complete_order;
use crate::engine::import::import_orders;
use crate::error::AppError;
use crate::models::assignment::DispatchEvent;
use crate::models::courier::CourierId;
use crate::models::order::{Order, OrderId};
use crate::state::AppState;
use crate::store::OrderFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/assign", post(assign))
        .route("/orders/complete", post(complete))
}

#[derive(Serialize)]
pub struct ImportOrdersResponse {
    pub orders: Vec<IdRef>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignRequest {
    pub courier_id: CourierId,
}

#[derive(Serialize)]
pub struct AssignResponse {
    pub orders: Vec<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteRequest {
    pub courier_id: CourierId,
    pub order_id: OrderId,
    #[serde(deserialize_with = "utc_or_naive")]
    pub complete_time: DateTime<Utc>,
}

/// Timestamps without an offset are read as UTC.
fn utc_or_naive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(at) = raw.parse::<DateTime<FixedOffset>>() {
        return Ok(at.with_timezone(&Utc));
    }

    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|err| serde::de::Error::custom(format!("invalid complete_time {raw:?}: {err}")))
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub order_id: OrderId,
}

async fn create_orders(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportOrdersResponse>), AppError> {
    let request: ImportRequest = decode(payload)?;

    let result = with_store(&state, move |store| import_orders(store, &request.data)).await;
    let outcome = if result.is_ok() { "success" } else { "rejected" };
    state
        .metrics
        .imports_total
        .with_label_values(&["orders", outcome])
        .inc();

    let ids = result?;
    Ok((
        StatusCode::CREATED,
        Json(ImportOrdersResponse {
            orders: ids.into_iter().map(IdRef::from).collect(),
        }),
    ))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = with_store(&state, move |store| {
        Ok(store.transaction(|tx| tx.load_orders(OrderFilter::ById(id)))?)
    })
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order))
}

async fn assign(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<AssignResponse>, AppError> {
    let request: AssignRequest = decode(payload)?;

    let start = Instant::now();
    let courier_id = request.courier_id;
    let result = with_store(&state, move |store| assign_orders(store, courier_id, Utc::now())).await;
    state
        .metrics
        .observe("assign", start.elapsed().as_secs_f64(), &result);

    let batch = result.map_err(AppError::not_found_as_bad_request)?;
    if let Some(assign_time) = batch.assign_time {
        state
            .metrics
            .orders_assigned_total
            .inc_by(batch.order_ids.len() as u64);
        state.publish(DispatchEvent::Assigned {
            courier_id: request.courier_id,
            order_ids: batch.order_ids.clone(),
            assign_time,
        });
    }

    Ok(Json(AssignResponse {
        orders: batch.order_ids.into_iter().map(IdRef::from).collect(),
        assign_time: batch.assign_time,
    }))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<CompleteResponse>, AppError> {
    let request: CompleteRequest = decode(payload)?;

    let start = Instant::now();
    let (courier_id, order_id, complete_time) =
        (request.courier_id, request.order_id, request.complete_time);
    let result = with_store(&state, move |store| {
        complete_order(store, courier_id, order_id, complete_time)
    })
    .await;
    state
        .metrics
        .observe("complete", start.elapsed().as_secs_f64(), &result);

    let order_id = result.map_err(AppError::not_found_as_bad_request)?;
    state.metrics.orders_completed_total.inc();
    state.publish(DispatchEvent::Completed {
        courier_id,
        order_id,
        complete_time,
    });

    Ok(Json(CompleteResponse { order_id }))
}
