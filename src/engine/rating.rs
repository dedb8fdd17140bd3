use std::collections::HashMap;

use crate::engine::eligibility::{BASE_PAY, pay_rate};
use crate::error::AppError;
use crate::models::courier::{CourierId, CourierProfile, RegionId};
use crate::models::order::Order;
use crate::store::{OrderFilter, Store};

const HOUR_SECS: f64 = 3600.0;
const MAX_RATING: f64 = 5.0;

/// Rating and earnings from a courier's completed orders, which must be sorted by
/// `assign_time` ascending.
///
/// Each order's duration is measured from the previous delivery in the whole sequence (from
/// its own assignment for the first one), then averaged per region. The fastest region's
/// average, capped at an hour, drives the rating. Rating is `None` without deliveries.
pub fn rating_and_earnings(completed: &[Order]) -> (Option<f64>, i64) {
    let earnings: i64 = completed
        .iter()
        .filter_map(|order| order.courier_type)
        .map(|courier_type| BASE_PAY * pay_rate(courier_type))
        .sum();

    let mut durations: HashMap<RegionId, Vec<i64>> = HashMap::new();
    let mut previous_complete = None;

    for order in completed {
        let (Some(assign_time), Some(complete_time)) = (order.assign_time, order.complete_time)
        else {
            continue;
        };

        let started = previous_complete.unwrap_or(assign_time);
        durations
            .entry(order.region)
            .or_default()
            .push((complete_time - started).num_seconds());
        previous_complete = Some(complete_time);
    }

    let fastest = durations
        .values()
        .map(|secs| secs.iter().sum::<i64>() as f64 / secs.len() as f64)
        .min_by(|a, b| a.total_cmp(b));

    let rating = fastest.map(|avg| {
        let t = avg.min(HOUR_SECS);
        round_cents((HOUR_SECS - t) / HOUR_SECS * MAX_RATING)
    });

    (rating, earnings)
}

/// Rounds through the 2-decimal text form so ties resolve on the exact binary value, the way
/// the rating is rendered.
fn round_cents(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Courier profile with rating and earnings, as served by the detail endpoint.
pub fn courier_profile(store: &Store, courier_id: CourierId) -> Result<CourierProfile, AppError> {
    let (courier, completed) = store.transaction(|tx| -> Result<_, AppError> {
        let courier = tx
            .load_courier(courier_id)?
            .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;
        let completed = tx.load_orders(OrderFilter::CompletedBy(courier_id))?;
        Ok((courier, completed))
    })?;

    let (rating, earnings) = rating_and_earnings(&completed);

    Ok(CourierProfile {
        courier,
        rating,
        earnings,
    })
}
