use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::AppError;
use crate::models::courier::CourierId;
use crate::models::order::OrderId;
use crate::store::{OrderFilter, OrderUpdate, Store};

/// Marks an active assignment as delivered at `complete_time`.
///
/// Fails with `NotFound` unless the order is currently assigned to this courier and not yet
/// complete.
pub fn complete_order(
    store: &Store,
    courier_id: CourierId,
    order_id: OrderId,
    complete_time: DateTime<Utc>,
) -> Result<OrderId, AppError> {
    store.transaction(|tx| -> Result<(), AppError> {
        let matching = tx.load_orders(OrderFilter::ActiveMatch {
            order_id,
            courier_id,
        })?;
        if matching.is_empty() {
            return Err(AppError::NotFound(format!(
                "order {order_id} is not an active assignment of courier {courier_id}"
            )));
        }

        tx.update_orders(&[order_id], OrderUpdate::Complete { complete_time })?;
        Ok(())
    })?;

    info!(courier_id, order_id, "order completed");
    Ok(order_id)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::complete_order;
    use crate::engine::assignment::assign_orders;
    use crate::error::AppError;
    use crate::models::courier::{Courier, CourierType};
    use crate::models::order::Order;
    use crate::store::{OrderFilter, Store};

    fn assigned_store() -> Store {
        let store = Store::connect(":memory:").unwrap();
        store
            .transaction(|tx| {
                tx.insert_couriers(&[
                    Courier {
                        courier_id: 1,
                        courier_type: CourierType::Bike,
                        regions: vec![1],
                        working_hours: vec!["09:00-18:00".to_string()],
                    },
                    Courier {
                        courier_id: 2,
                        courier_type: CourierType::Bike,
                        regions: vec![2],
                        working_hours: vec!["09:00-18:00".to_string()],
                    },
                ])?;
                tx.insert_orders(&[Order::new(1, 2.0, 1, vec!["10:00-11:00".to_string()])])
            })
            .unwrap();
        assign_orders(&store, 1, Utc.with_ymd_and_hms(2021, 1, 10, 9, 0, 0).unwrap()).unwrap();
        store
    }

    #[test]
    fn completes_active_assignment() {
        let store = assigned_store();
        let done_at = Utc.with_ymd_and_hms(2021, 1, 10, 10, 33, 1).unwrap();

        assert_eq!(complete_order(&store, 1, 1, done_at).unwrap(), 1);

        let done = store
            .transaction(|tx| tx.load_orders(OrderFilter::CompletedBy(1)))
            .unwrap();
        assert_eq!(done.len(), 1);
        assert!(done[0].complete);
        assert_eq!(done[0].complete_time, Some(done_at));
    }

    #[test]
    fn rejects_wrong_courier_and_repeat_completion() {
        let store = assigned_store();
        let done_at = Utc.with_ymd_and_hms(2021, 1, 10, 10, 33, 1).unwrap();

        let wrong_owner = complete_order(&store, 2, 1, done_at).unwrap_err();
        assert!(matches!(wrong_owner, AppError::NotFound(_)));

        complete_order(&store, 1, 1, done_at).unwrap();
        let again = complete_order(&store, 1, 1, done_at).unwrap_err();
        assert!(matches!(again, AppError::NotFound(_)));

        let missing = complete_order(&store, 1, 99, done_at).unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
