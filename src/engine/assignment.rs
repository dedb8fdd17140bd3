use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::eligibility::eligible;
use crate::engine::time_window::{TimeWindowError, time_compatible};
use crate::error::AppError;
use crate::models::assignment::AssignmentBatch;
use crate::models::courier::{Courier, CourierId};
use crate::models::order::{Order, OrderId};
use crate::store::{OrderFilter, OrderUpdate, Store};

/// Orders from `orders` this courier may take right now.
///
/// Completed orders and orders outside the courier's regions are skipped, as are orders too
/// heavy for the courier type or with no delivery window the courier can make. An order held
/// by another courier is still a candidate: assigning it again moves it.
pub fn select_assignable(courier: &Courier, orders: &[Order]) -> Result<Vec<OrderId>, TimeWindowError> {
    let mut selected = Vec::new();

    for order in orders {
        if order.complete
            || !courier.regions.contains(&order.region)
            || !eligible(courier.courier_type, order.weight)
        {
            continue;
        }

        if time_compatible(&courier.working_hours, &order.delivery_hours)? {
            selected.push(order.order_id);
        }
    }

    Ok(selected)
}

/// Assigns every matching open order to the courier, stamping the whole batch with `now`.
pub fn assign_orders(
    store: &Store,
    courier_id: CourierId,
    now: DateTime<Utc>,
) -> Result<AssignmentBatch, AppError> {
    let batch = store.transaction(|tx| -> Result<AssignmentBatch, AppError> {
        let courier = tx
            .load_courier(courier_id)?
            .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;

        let candidates = tx.load_orders(OrderFilter::OpenInRegions(&courier.regions))?;
        let order_ids = select_assignable(&courier, &candidates)?;

        if order_ids.is_empty() {
            return Ok(AssignmentBatch::empty());
        }

        tx.update_orders(
            &order_ids,
            OrderUpdate::Assign {
                courier_id,
                courier_type: courier.courier_type,
                assign_time: now,
            },
        )?;

        Ok(AssignmentBatch {
            order_ids,
            assign_time: Some(now),
        })
    })?;

    info!(
        courier_id,
        assigned = batch.order_ids.len(),
        "assignment run finished"
    );

    Ok(batch)
}
