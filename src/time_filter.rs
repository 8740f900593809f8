use anyhow::{bail, Result};
use chrono::{NaiveDateTime, Timelike};

use crate::model::Trip;

pub const MINUTES_PER_DAY: u16 = 24 * 60;
pub const DEFAULT_WINDOW_MINUTES: u16 = 60;
/// Slider value meaning "show the whole day".
pub const ANY_TIME: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Any,
    Minute(u16),
}

impl TimeFilter {
    pub fn from_slider(value: i32) -> Result<TimeFilter> {
        match value {
            ANY_TIME => Ok(TimeFilter::Any),
            _ if (0..MINUTES_PER_DAY as i32).contains(&value) => {
                Ok(TimeFilter::Minute(value as u16))
            }
            _ => bail!(
                "Time filter must be between {} and {}, got {}",
                ANY_TIME,
                MINUTES_PER_DAY - 1,
                value
            ),
        }
    }

    pub fn slider_value(&self) -> i32 {
        match self {
            TimeFilter::Any => ANY_TIME,
            TimeFilter::Minute(minute) => *minute as i32,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TimeFilter::Any => "(any time)".to_string(),
            TimeFilter::Minute(minute) => format_time(*minute),
        }
    }
}

pub fn minutes_since_midnight(time: &NaiveDateTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

/// Keeps trips that start or end within `window_minutes` of the filter minute.
///
/// The distance is a plain difference of minutes since midnight, so 23:30 and
/// 00:15 are 1395 minutes apart rather than 45.
pub fn filter_trips_by_time(trips: &[Trip], filter: TimeFilter, window_minutes: u16) -> Vec<Trip> {
    let target = match filter {
        TimeFilter::Any => return trips.to_vec(),
        TimeFilter::Minute(minute) => minute,
    };
    let is_near =
        |time: &NaiveDateTime| minutes_since_midnight(time).abs_diff(target) <= window_minutes;
    trips
        .iter()
        .filter(|trip| is_near(&trip.started_at) || is_near(&trip.ended_at))
        .cloned()
        .collect()
}

/// Formats a minute of the day as a short 12-hour clock label like "2:30 PM".
pub fn format_time(minute: u16) -> String {
    let minute = minute % MINUTES_PER_DAY;
    let hour = minute / 60;
    let period = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute % 60, period)
}
