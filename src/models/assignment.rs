use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::courier::CourierId;
use crate::models::order::OrderId;

/// Result of one assignment run. `assign_time` is shared by every order in the batch
/// and is absent when nothing was assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentBatch {
    pub order_ids: Vec<OrderId>,
    pub assign_time: Option<DateTime<Utc>>,
}

impl AssignmentBatch {
    pub fn empty() -> Self {
        Self {
            order_ids: Vec::new(),
            assign_time: None,
        }
    }
}

/// Pushed to live feed subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    Assigned {
        courier_id: CourierId,
        order_ids: Vec<OrderId>,
        assign_time: DateTime<Utc>,
    },
    Unassigned {
        courier_id: CourierId,
        order_ids: Vec<OrderId>,
    },
    Completed {
        courier_id: CourierId,
        order_id: OrderId,
        complete_time: DateTime<Utc>,
    },
}
