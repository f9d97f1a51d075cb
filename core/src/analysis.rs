//! Trend analysis over the messages table.
//!
//! Produces the series behind six chart panels: daily volume and fraud
//! rate, hourly volume, hourly fraud volume, volume per hour over time,
//! weekday vs weekend hourly volume, and hourly volume per weekday.
//! Rendering is left to whatever consumes `trends.json`.

use crate::{
    dataset::MessageEvent,
    types::MessageId,
    window::{is_weekend, weekday_name, WEEKDAYS},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Month/day pairs marked on the daily chart.
pub const HOLIDAY_MARKERS: [(u32, u32); 4] = [(12, 24), (12, 25), (12, 31), (1, 1)];

const ROLLING_DAYS: usize = 3;

/// The three message columns trend analysis reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub message_id: MessageId,
    pub timestamp: NaiveDateTime,
    pub fraud_flag: bool,
}

impl From<&MessageEvent> for Observation {
    fn from(m: &MessageEvent) -> Self {
        Self {
            message_id: m.message_id.clone(),
            timestamp: m.timestamp,
            fraud_flag: m.fraud_flag,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_messages: u64,
    pub fraud_messages: u64,
    pub fraud_rate: f64,
    /// Trailing mean of total_messages over the last 3 listed days.
    pub volume_trend: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlyPoint {
    pub hour_start: NaiveDateTime,
    pub messages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekdayProfile {
    pub weekday: String,
    pub hourly: [u64; 24],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trends {
    pub daily: Vec<DailyStat>,
    pub holiday_markers: Vec<NaiveDate>,
    pub hourly_volume: [u64; 24],
    pub hourly_fraud: [u64; 24],
    pub hourly_over_time: Vec<HourlyPoint>,
    pub weekday_hourly: [u64; 24],
    pub weekend_hourly: [u64; 24],
    pub by_weekday: Vec<WeekdayProfile>,
}

pub fn analyze(observations: &[Observation]) -> Trends {
    let mut per_day: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    let mut per_hour: BTreeMap<NaiveDateTime, u64> = BTreeMap::new();
    let mut hourly_volume = [0u64; 24];
    let mut hourly_fraud = [0u64; 24];
    let mut weekday_hourly = [0u64; 24];
    let mut weekend_hourly = [0u64; 24];
    let mut by_weekday = [[0u64; 24]; 7];

    for obs in observations.iter().filter(|o| !o.message_id.is_empty()) {
        let date = obs.timestamp.date();
        let hour = obs.timestamp.hour() as usize;

        let day = per_day.entry(date).or_default();
        day.0 += 1;
        if obs.fraud_flag {
            day.1 += 1;
            hourly_fraud[hour] += 1;
        }
        hourly_volume[hour] += 1;

        if let Some(floor) = date.and_hms_opt(hour as u32, 0, 0) {
            *per_hour.entry(floor).or_default() += 1;
        }

        if is_weekend(date) {
            weekend_hourly[hour] += 1;
        } else {
            weekday_hourly[hour] += 1;
        }
        by_weekday[date.weekday().num_days_from_monday() as usize][hour] += 1;
    }

    let totals: Vec<u64> = per_day.values().map(|(t, _)| *t).collect();
    let daily = per_day
        .iter()
        .enumerate()
        .map(|(i, (date, (total, fraud)))| DailyStat {
            date: *date,
            total_messages: *total,
            fraud_messages: *fraud,
            fraud_rate: *fraud as f64 / *total as f64,
            volume_trend: trailing_mean(&totals, i, ROLLING_DAYS),
        })
        .collect();

    let holiday_markers = match (per_day.keys().next(), per_day.keys().next_back()) {
        (Some(first), Some(last)) => markers_between(*first, *last),
        _ => Vec::new(),
    };

    Trends {
        daily,
        holiday_markers,
        hourly_volume,
        hourly_fraud,
        hourly_over_time: per_hour
            .into_iter()
            .map(|(hour_start, messages)| HourlyPoint { hour_start, messages })
            .collect(),
        weekday_hourly,
        weekend_hourly,
        by_weekday: WEEKDAYS
            .iter()
            .zip(by_weekday)
            .map(|(day, hourly)| WeekdayProfile {
                weekday: weekday_name(*day).to_string(),
                hourly,
            })
            .collect(),
    }
}

/// Mean of the `n` values ending at `i`; None until `n` values exist.
fn trailing_mean(values: &[u64], i: usize, n: usize) -> Option<f64> {
    if i + 1 < n {
        return None;
    }
    let window = &values[i + 1 - n..=i];
    Some(window.iter().sum::<u64>() as f64 / n as f64)
}

fn markers_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut markers: Vec<NaiveDate> = (first.year()..=last.year())
        .flat_map(|y| {
            HOLIDAY_MARKERS
                .into_iter()
                .filter_map(move |(m, d)| NaiveDate::from_ymd_opt(y, m, d))
        })
        .filter(|d| *d >= first && *d <= last)
        .collect();
    markers.sort();
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ts: &str, fraud: bool) -> Observation {
        Observation {
            message_id: format!("m-{ts}"),
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            fraud_flag: fraud,
        }
    }

    #[test]
    fn trailing_mean_waits_for_full_window() {
        let v = [3, 6, 9, 12];
        assert_eq!(trailing_mean(&v, 0, 3), None);
        assert_eq!(trailing_mean(&v, 1, 3), None);
        assert_eq!(trailing_mean(&v, 2, 3), Some(6.0));
        assert_eq!(trailing_mean(&v, 3, 3), Some(9.0));
    }

    #[test]
    fn markers_cover_year_boundary() {
        let first = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let last = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        let markers = markers_between(first, last);
        let shown: Vec<String> = markers.iter().map(|d| d.to_string()).collect();
        assert_eq!(shown, vec!["2024-12-24", "2024-12-25", "2024-12-31", "2025-01-01"]);
    }

    #[test]
    fn daily_fraud_rate() {
        let t = analyze(&[
            obs("2024-12-24 09:15:00", true),
            obs("2024-12-24 09:45:00", false),
            obs("2024-12-24 10:00:00", false),
            obs("2024-12-24 22:10:00", false),
        ]);
        assert_eq!(t.daily.len(), 1);
        assert_eq!(t.daily[0].total_messages, 4);
        assert_eq!(t.daily[0].fraud_rate, 0.25);
        assert_eq!(t.hourly_volume[9], 2);
        assert_eq!(t.hourly_fraud[9], 1);
        assert_eq!(t.hourly_over_time.len(), 3);
    }
}
