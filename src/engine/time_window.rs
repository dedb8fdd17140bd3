use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use thiserror::Error;

const CLOCK_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed time window {raw:?}: expected HH:MM-HH:MM")]
pub struct TimeWindowError {
    pub raw: String,
}

/// A wall-clock interval within one day, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

impl FromStr for TimeWindow {
    type Err = TimeWindowError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || TimeWindowError {
            raw: raw.to_string(),
        };

        let (start, end) = raw.split_once('-').ok_or_else(malformed)?;
        let start = NaiveTime::parse_from_str(start, CLOCK_FORMAT).map_err(|_| malformed())?;
        let end = NaiveTime::parse_from_str(end, CLOCK_FORMAT).map_err(|_| malformed())?;

        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(CLOCK_FORMAT),
            self.end.format(CLOCK_FORMAT)
        )
    }
}

pub fn parse_all(raw: &[String]) -> Result<Vec<TimeWindow>, TimeWindowError> {
    raw.iter().map(|window| window.parse()).collect()
}

/// Endpoint containment: true when either window starts inside the other.
///
/// `a` is the courier's window, `b` the order's.
pub fn overlaps(a: &TimeWindow, b: &TimeWindow) -> bool {
    (a.start <= b.start && b.start <= a.end) || (b.start <= a.start && a.start <= b.end)
}

/// True if any courier window overlaps any order window.
pub fn time_compatible(
    working_hours: &[String],
    delivery_hours: &[String],
) -> Result<bool, TimeWindowError> {
    let courier_windows = parse_all(working_hours)?;
    let order_windows = parse_all(delivery_hours)?;

    Ok(courier_windows
        .iter()
        .any(|a| order_windows.iter().any(|b| overlaps(a, b))))
}
