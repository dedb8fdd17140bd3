use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::courier::{CourierId, CourierType, RegionId};

pub type OrderId = i64;

pub const MIN_WEIGHT: f64 = 0.01;
pub const MAX_WEIGHT: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: OrderId,
    pub weight: f64,
    pub region: RegionId,
    pub delivery_hours: Vec<String>,
    pub assign: Option<CourierId>,
    pub courier_type: Option<CourierType>,
    pub assign_time: Option<DateTime<Utc>>,
    pub complete: bool,
    pub complete_time: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(order_id: OrderId, weight: f64, region: RegionId, delivery_hours: Vec<String>) -> Self {
        Self {
            order_id,
            weight,
            region,
            delivery_hours,
            assign: None,
            courier_type: None,
            assign_time: None,
            complete: false,
            complete_time: None,
        }
    }

    /// Assigned to someone and not yet delivered.
    pub fn is_active(&self) -> bool {
        self.assign.is_some() && !self.complete
    }
}
