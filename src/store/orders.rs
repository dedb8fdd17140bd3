use chrono::{DateTime, Utc};
use rusqlite::{Params, Row, params};

use super::{StoreError, StoreTx, json_column};
use crate::models::courier::{CourierId, CourierType, RegionId};
use crate::models::order::{Order, OrderId};

const ORDER_COLUMNS: &str = "order_id, weight, region, delivery_hours, assign, courier_type, \
                             assign_time, complete, complete_time";

/// Which orders [`StoreTx::load_orders`] returns.
#[derive(Debug, Clone, Copy)]
pub enum OrderFilter<'a> {
    ById(OrderId),
    /// Not completed, region in the given set. The current assignee is ignored.
    OpenInRegions(&'a [RegionId]),
    /// Active assignments of one courier.
    ActiveFor(CourierId),
    /// Deliveries of one courier, oldest assignment first.
    CompletedBy(CourierId),
    /// The order only if it is an active assignment of that courier.
    ActiveMatch {
        order_id: OrderId,
        courier_id: CourierId,
    },
}

/// Bulk field-set applied by [`StoreTx::update_orders`]. Completed orders are never touched.
#[derive(Debug, Clone, Copy)]
pub enum OrderUpdate {
    Assign {
        courier_id: CourierId,
        courier_type: CourierType,
        assign_time: DateTime<Utc>,
    },
    Unassign,
    Complete {
        complete_time: DateTime<Utc>,
    },
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        order_id: row.get(0)?,
        weight: row.get(1)?,
        region: row.get(2)?,
        delivery_hours: json_column(row, 3)?,
        assign: row.get(4)?,
        courier_type: row.get(5)?,
        assign_time: row.get(6)?,
        complete: row.get::<_, Option<bool>>(7)?.unwrap_or(false),
        complete_time: row.get(8)?,
    })
}

impl StoreTx<'_> {
    pub fn load_orders(&self, filter: OrderFilter<'_>) -> Result<Vec<Order>, StoreError> {
        match filter {
            OrderFilter::ById(order_id) => {
                self.query_orders("order_id = ?1", params![order_id])
            }
            OrderFilter::OpenInRegions(regions) => self.query_orders(
                "complete IS NULL AND region IN (SELECT value FROM json_each(?1))
                 ORDER BY order_id",
                params![serde_json::to_string(regions)?],
            ),
            OrderFilter::ActiveFor(courier_id) => self.query_orders(
                "assign = ?1 AND complete IS NULL ORDER BY order_id",
                params![courier_id],
            ),
            OrderFilter::CompletedBy(courier_id) => self.query_orders(
                "assign = ?1 AND complete = 1 ORDER BY assign_time, order_id",
                params![courier_id],
            ),
            OrderFilter::ActiveMatch {
                order_id,
                courier_id,
            } => self.query_orders(
                "order_id = ?1 AND assign = ?2 AND complete IS NULL",
                params![order_id, courier_id],
            ),
        }
    }

    /// Returns the number of rows changed.
    pub fn update_orders(&self, ids: &[OrderId], update: OrderUpdate) -> Result<usize, StoreError> {
        let mut changed = 0;

        match update {
            OrderUpdate::Assign {
                courier_id,
                courier_type,
                assign_time,
            } => {
                let mut stmt = self.tx.prepare_cached(
                    "UPDATE orders SET assign = ?2, courier_type = ?3, assign_time = ?4
                     WHERE order_id = ?1 AND complete IS NULL",
                )?;
                for id in ids {
                    changed += stmt.execute(params![id, courier_id, courier_type, assign_time])?;
                }
            }
            OrderUpdate::Unassign => {
                let mut stmt = self.tx.prepare_cached(
                    "UPDATE orders SET assign = NULL, courier_type = NULL
                     WHERE order_id = ?1 AND complete IS NULL",
                )?;
                for id in ids {
                    changed += stmt.execute(params![id])?;
                }
            }
            OrderUpdate::Complete { complete_time } => {
                let mut stmt = self.tx.prepare_cached(
                    "UPDATE orders SET complete = 1, complete_time = ?2
                     WHERE order_id = ?1 AND complete IS NULL",
                )?;
                for id in ids {
                    changed += stmt.execute(params![id, complete_time])?;
                }
            }
        }

        Ok(changed)
    }

    pub fn insert_orders(&self, orders: &[Order]) -> Result<(), StoreError> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO orders (order_id, weight, region, delivery_hours)
             VALUES (?1, ?2, ?3, ?4)",
        )?;

        for order in orders {
            stmt.execute(params![
                order.order_id,
                order.weight,
                order.region,
                serde_json::to_string(&order.delivery_hours)?,
            ])?;
        }
        Ok(())
    }

    /// Subset of `ids` already stored.
    pub fn existing_order_ids(&self, ids: &[OrderId]) -> Result<Vec<OrderId>, StoreError> {
        let mut stmt = self.tx.prepare_cached(
            "SELECT order_id FROM orders
             WHERE order_id IN (SELECT value FROM json_each(?1))
             ORDER BY order_id",
        )?;
        let existing = stmt
            .query_map(params![serde_json::to_string(ids)?], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(existing)
    }

    fn query_orders<P: Params>(&self, clause: &str, params: P) -> Result<Vec<Order>, StoreError> {
        let mut stmt = self
            .tx
            .prepare_cached(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {clause}"))?;
        let orders = stmt
            .query_map(params, order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }
}
