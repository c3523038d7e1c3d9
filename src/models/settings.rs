//! Settings request/response models and time-of-day windows

use chrono::{NaiveTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entities::settings;

lazy_static! {
    static ref TIME_OF_DAY: Regex = Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap();
}

/// Parse a strict `HH:MM` time of day
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, String> {
    let caps = TIME_OF_DAY
        .captures(value.trim())
        .ok_or_else(|| format!("Invalid time of day '{}', expected HH:MM", value))?;
    let hour: u32 = caps[1].parse().map_err(|_| format!("Invalid hour in '{}'", value))?;
    let minute: u32 = caps[2].parse().map_err(|_| format!("Invalid minute in '{}'", value))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| format!("Invalid time of day '{}'", value))
}

/// Inclusive time-of-day range, compared at minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self, String> {
        let window = Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        };
        if window.start > window.end {
            return Err(format!("Window start {} is after end {}", start, end));
        }
        Ok(window)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let minute = truncate_to_minute(time);
        self.start <= minute && minute <= self.end
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Full settings, staff only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub order_start_time: String,
    pub order_end_time: String,
    pub pickup_start_time: String,
    pub pickup_end_time: String,
    pub ordering_enabled: bool,
    pub pickup_time_required: bool,
    pub lifetime_revenue_cents: i64,
    pub period_revenue_cents: i64,
}

impl From<settings::Model> for SettingsResponse {
    fn from(model: settings::Model) -> Self {
        Self {
            order_start_time: model.order_start_time,
            order_end_time: model.order_end_time,
            pickup_start_time: model.pickup_start_time,
            pickup_end_time: model.pickup_end_time,
            ordering_enabled: model.ordering_enabled,
            pickup_time_required: model.pickup_time_required,
            lifetime_revenue_cents: model.lifetime_revenue_cents,
            period_revenue_cents: model.period_revenue_cents,
        }
    }
}

/// Settings visible to customers (no revenue)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicSettingsResponse {
    pub order_start_time: String,
    pub order_end_time: String,
    pub pickup_start_time: String,
    pub pickup_end_time: String,
    pub ordering_enabled: bool,
    pub pickup_time_required: bool,
}

impl From<settings::Model> for PublicSettingsResponse {
    fn from(model: settings::Model) -> Self {
        Self {
            order_start_time: model.order_start_time,
            order_end_time: model.order_end_time,
            pickup_start_time: model.pickup_start_time,
            pickup_end_time: model.pickup_end_time,
            ordering_enabled: model.ordering_enabled,
            pickup_time_required: model.pickup_time_required,
        }
    }
}

/// Request body for PUT /api/staff/settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub order_start_time: String,
    pub order_end_time: String,
    pub pickup_start_time: String,
    pub pickup_end_time: String,
    pub ordering_enabled: bool,
    #[serde(default)]
    pub pickup_time_required: bool,
}

impl UpdateSettingsRequest {
    pub fn validate(&self) -> Result<(), String> {
        TimeWindow::parse(&self.order_start_time, &self.order_end_time)
            .map_err(|e| format!("order window: {}", e))?;
        TimeWindow::parse(&self.pickup_start_time, &self.pickup_end_time)
            .map_err(|e| format!("pickup window: {}", e))?;
        Ok(())
    }
}
