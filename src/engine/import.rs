use std::collections::HashSet;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::engine::time_window::parse_all;
use crate::error::AppError;
use crate::models::courier::{Courier, CourierId, CourierType, RegionId};
use crate::models::order::{MAX_WEIGHT, MIN_WEIGHT, Order, OrderId};
use crate::store::Store;

/// One record of an import batch, checked in isolation before anything is written.
trait ImportRecord: DeserializeOwned {
    const ENTITY: &'static str;
    const ID_FIELD: &'static str;

    fn id(&self) -> i64;
    fn is_valid(&self) -> bool;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CourierRecord {
    courier_id: CourierId,
    courier_type: CourierType,
    regions: Vec<RegionId>,
    working_hours: Vec<String>,
}

impl ImportRecord for CourierRecord {
    const ENTITY: &'static str = "couriers";
    const ID_FIELD: &'static str = "courier_id";

    fn id(&self) -> i64 {
        self.courier_id
    }

    fn is_valid(&self) -> bool {
        self.courier_id >= 0
            && self.regions.iter().all(|region| *region >= 0)
            && parse_all(&self.working_hours).is_ok()
    }
}

impl From<CourierRecord> for Courier {
    fn from(record: CourierRecord) -> Self {
        Courier {
            courier_id: record.courier_id,
            courier_type: record.courier_type,
            regions: record.regions,
            working_hours: record.working_hours,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrderRecord {
    order_id: OrderId,
    weight: f64,
    region: RegionId,
    delivery_hours: Vec<String>,
}

impl ImportRecord for OrderRecord {
    const ENTITY: &'static str = "orders";
    const ID_FIELD: &'static str = "order_id";

    fn id(&self) -> i64 {
        self.order_id
    }

    fn is_valid(&self) -> bool {
        self.order_id >= 0
            && self.region >= 0
            && (MIN_WEIGHT..=MAX_WEIGHT).contains(&self.weight)
            && parse_all(&self.delivery_hours).is_ok()
    }
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order::new(
            record.order_id,
            record.weight,
            record.region,
            record.delivery_hours,
        )
    }
}

/// Parses every record; any bad one fails the whole batch with the ids of all offenders.
fn parse_batch<R: ImportRecord>(raw: &[Value]) -> Result<Vec<R>, AppError> {
    let mut records = Vec::with_capacity(raw.len());
    let mut offenders = Vec::new();
    let mut seen = HashSet::new();

    for value in raw {
        match serde_json::from_value::<R>(value.clone()) {
            Ok(record) if record.is_valid() && seen.insert(record.id()) => records.push(record),
            _ => offenders.push(value.get(R::ID_FIELD).and_then(Value::as_i64)),
        }
    }

    if offenders.is_empty() {
        Ok(records)
    } else {
        warn!(entity = R::ENTITY, rejected = offenders.len(), "import batch rejected");
        Err(AppError::Validation {
            entity: R::ENTITY,
            ids: offenders,
        })
    }
}

fn already_stored(entity: &'static str, existing: Vec<i64>) -> Result<(), AppError> {
    if existing.is_empty() {
        return Ok(());
    }

    warn!(entity, rejected = existing.len(), "import batch reuses stored ids");
    Err(AppError::Validation {
        entity,
        ids: existing.into_iter().map(Some).collect(),
    })
}

pub fn import_couriers(store: &Store, raw: &[Value]) -> Result<Vec<CourierId>, AppError> {
    let couriers: Vec<Courier> = parse_batch::<CourierRecord>(raw)?
        .into_iter()
        .map(Courier::from)
        .collect();
    let ids: Vec<CourierId> = couriers.iter().map(|c| c.courier_id).collect();

    store.transaction(|tx| -> Result<(), AppError> {
        already_stored(CourierRecord::ENTITY, tx.existing_courier_ids(&ids)?)?;
        tx.insert_couriers(&couriers)?;
        Ok(())
    })?;

    info!(imported = ids.len(), "couriers imported");
    Ok(ids)
}

pub fn import_orders(store: &Store, raw: &[Value]) -> Result<Vec<OrderId>, AppError> {
    let orders: Vec<Order> = parse_batch::<OrderRecord>(raw)?
        .into_iter()
        .map(Order::from)
        .collect();
    let ids: Vec<OrderId> = orders.iter().map(|o| o.order_id).collect();

    store.transaction(|tx| -> Result<(), AppError> {
        already_stored(OrderRecord::ENTITY, tx.existing_order_ids(&ids)?)?;
        tx.insert_orders(&orders)?;
        Ok(())
    })?;

    info!(imported = ids.len(), "orders imported");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{import_couriers, import_orders};
    use crate::error::AppError;
    use crate::store::Store;

    fn batch(value: Value) -> Vec<Value> {
        value.as_array().unwrap().clone()
    }

    fn offenders(err: AppError) -> (&'static str, Vec<Option<i64>>) {
        match err {
            AppError::Validation { entity, ids } => (entity, ids),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn imports_valid_couriers() {
        let store = Store::connect(":memory:").unwrap();
        let ids = import_couriers(
            &store,
            &batch(json!([
                {"courier_id": 1, "courier_type": "foot", "regions": [1, 12], "working_hours": ["11:35-14:05"]},
                {"courier_id": 2, "courier_type": "car", "regions": [22], "working_hours": []}
            ])),
        )
        .unwrap();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.stats().unwrap().couriers, 2);
    }

    #[test]
    fn one_bad_courier_rejects_the_batch() {
        let store = Store::connect(":memory:").unwrap();
        let err = import_couriers(
            &store,
            &batch(json!([
                {"courier_id": 1, "courier_type": "foot", "regions": [1], "working_hours": ["09:00-18:00"]},
                {"courier_id": 2, "courier_type": "plane", "regions": [1], "working_hours": []},
                {"courier_id": 3, "courier_type": "bike", "regions": [-1], "working_hours": []},
                {"courier_id": 4, "courier_type": "bike", "regions": [1], "working_hours": ["9-18"]},
                {"courier_id": 5, "courier_type": "bike", "regions": [1], "working_hours": [], "extra": 1},
                {"courier_type": "bike", "regions": [1], "working_hours": []}
            ])),
        )
        .unwrap_err();

        let (entity, ids) = offenders(err);
        assert_eq!(entity, "couriers");
        assert_eq!(ids, vec![Some(2), Some(3), Some(4), Some(5), None]);
        assert_eq!(store.stats().unwrap().couriers, 0);
    }

    #[test]
    fn duplicate_and_existing_ids_are_rejected() {
        let store = Store::connect(":memory:").unwrap();
        import_orders(
            &store,
            &batch(json!([{"order_id": 1, "weight": 1.0, "region": 1, "delivery_hours": ["10:00-11:00"]}])),
        )
        .unwrap();

        let dup = import_orders(
            &store,
            &batch(json!([
                {"order_id": 2, "weight": 1.0, "region": 1, "delivery_hours": []},
                {"order_id": 2, "weight": 2.0, "region": 1, "delivery_hours": []}
            ])),
        )
        .unwrap_err();
        assert_eq!(offenders(dup), ("orders", vec![Some(2)]));

        let existing = import_orders(
            &store,
            &batch(json!([
                {"order_id": 1, "weight": 1.0, "region": 1, "delivery_hours": []},
                {"order_id": 3, "weight": 1.0, "region": 1, "delivery_hours": []}
            ])),
        )
        .unwrap_err();
        assert_eq!(offenders(existing), ("orders", vec![Some(1)]));
        assert_eq!(store.stats().unwrap().orders, 1);
    }

    #[test]
    fn order_weight_bounds_are_inclusive() {
        let store = Store::connect(":memory:").unwrap();
        let err = import_orders(
            &store,
            &batch(json!([
                {"order_id": 1, "weight": 0.01, "region": 1, "delivery_hours": []},
                {"order_id": 2, "weight": 50, "region": 1, "delivery_hours": []},
                {"order_id": 3, "weight": 0.0, "region": 1, "delivery_hours": []},
                {"order_id": 4, "weight": 50.01, "region": 1, "delivery_hours": []}
            ])),
        )
        .unwrap_err();
        assert_eq!(offenders(err), ("orders", vec![Some(3), Some(4)]));
    }
}
