use tracing::info;

use crate::engine::eligibility::eligible;
use crate::engine::time_window::{TimeWindowError, time_compatible};
use crate::error::AppError;
use crate::models::courier::{Courier, CourierId, CourierPatch};
use crate::models::order::{Order, OrderId};
use crate::store::{OrderFilter, OrderUpdate, Store};

/// Active orders the courier can no longer carry under its current profile.
///
/// Every order is checked from scratch: region, weight cap and delivery windows.
pub fn orders_to_unassign(courier: &Courier, active: &[Order]) -> Result<Vec<OrderId>, TimeWindowError> {
    let mut dropped = Vec::new();

    for order in active.iter().filter(|order| order.is_active()) {
        let still_fits = courier.regions.contains(&order.region)
            && eligible(courier.courier_type, order.weight)
            && time_compatible(&courier.working_hours, &order.delivery_hours)?;

        if !still_fits {
            dropped.push(order.order_id);
        }
    }

    Ok(dropped)
}

/// Applies `patch` to the courier, then releases every active order the new profile rules out.
///
/// Returns the saved courier and the ids that were released.
pub fn update_courier(
    store: &Store,
    courier_id: CourierId,
    patch: CourierPatch,
) -> Result<(Courier, Vec<OrderId>), AppError> {
    patch.validate()?;

    let (courier, released) = store.transaction(|tx| -> Result<_, AppError> {
        let mut courier = tx
            .load_courier(courier_id)?
            .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;

        patch.apply(&mut courier);
        tx.save_courier(&courier)?;

        let active = tx.load_orders(OrderFilter::ActiveFor(courier_id))?;
        let released = orders_to_unassign(&courier, &active)?;
        if !released.is_empty() {
            tx.update_orders(&released, OrderUpdate::Unassign)?;
        }

        Ok((courier, released))
    })?;

    info!(
        courier_id,
        released = released.len(),
        "courier profile updated"
    );

    Ok((courier, released))
}
