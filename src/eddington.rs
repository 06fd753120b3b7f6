//! # Eddington Number
//!
//! The Eddington number E of a history is the largest E such that on at
//! least E distinct days at least E kilometers were covered.
//!
//! Distances are summed per calendar day (the activity's local start date),
//! then truncated to whole kilometers. Days below one kilometer do not count.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Activity;

/// Eddington number of a history and its supporting histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EddingtonResult {
    pub number: u32,
    /// `histogram[k - 1]` is the number of days with at least `k` km,
    /// for `k` from 1 to the longest day
    pub histogram: Vec<u32>,
}

/// Parse the calendar day of a local start timestamp.
///
/// Accepts RFC 3339 (`2024-03-17T09:12:44Z`, offsets kept as written),
/// `2024-03-17 09:12:44`, `2024-03-17T09:12:44` and bare `2024-03-17`.
pub(crate) fn parse_local_day(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    let day = value.split(|c: char| c == 'T' || c == ' ').next().unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Largest `e` with `daily_km[e - 1] >= e` for totals sorted descending.
fn eddington_number(sorted_desc: &[u32]) -> u32 {
    sorted_desc
        .iter()
        .enumerate()
        .take_while(|&(i, &km)| km as usize > i)
        .count() as u32
}

/// Days with at least `k` km for every `k` up to the longest day.
fn days_at_least(daily_km: &[u32]) -> Vec<u32> {
    let longest = daily_km.iter().copied().max().unwrap_or(0) as usize;
    let mut counts = vec![0u32; longest + 1];
    for &km in daily_km {
        counts[km as usize] += 1;
    }

    let mut histogram = vec![0u32; longest];
    let mut running = 0;
    for k in (1..=longest).rev() {
        running += counts[k];
        histogram[k - 1] = running;
    }
    histogram
}

/// Compute the Eddington number of an activity history.
///
/// Activities with a non-positive distance or an unparsable start date are
/// skipped. An empty history yields `E = 0` and an empty histogram.
///
/// # Example
/// ```
/// use effort_analytics::{compute_eddington, Activity, ActivityType};
///
/// let activities: Vec<Activity> = [(10.0, "01"), (5.0, "02"), (7.0, "03")]
///     .iter()
///     .map(|&(km, day)| Activity {
///         distance: km * 1000.0,
///         start_date_local: format!("2024-05-{}T08:00:00Z", day),
///         ..Activity::new(1, "Ride", ActivityType::Ride)
///     })
///     .collect();
///
/// let result = compute_eddington(&activities);
/// assert_eq!(result.number, 3);
/// ```
pub fn compute_eddington(activities: &[Activity]) -> EddingtonResult {
    let mut meters_by_day: HashMap<NaiveDate, f64> = HashMap::new();
    let mut skipped = 0usize;

    for activity in activities {
        if !(activity.distance > 0.0) {
            skipped += 1;
            continue;
        }
        match parse_local_day(&activity.start_date_local) {
            Some(day) => *meters_by_day.entry(day).or_insert(0.0) += activity.distance,
            None => {
                debug!(
                    "[Eddington] Skipping activity {}: unparsable start date {:?}",
                    activity.id, activity.start_date_local
                );
                skipped += 1;
            }
        }
    }

    let mut daily_km: Vec<u32> = meters_by_day
        .values()
        .map(|meters| (meters / 1000.0).floor() as u32)
        .filter(|&km| km > 0)
        .collect();
    daily_km.sort_unstable_by(|a, b| b.cmp(a));

    let number = eddington_number(&daily_km);
    let histogram = days_at_least(&daily_km);

    debug!(
        "[Eddington] {} activities ({} skipped) over {} days: E = {}",
        activities.len(),
        skipped,
        daily_km.len(),
        number
    );

    EddingtonResult { number, histogram }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActivityType;

    fn ride(km: f64, date: &str) -> Activity {
        Activity {
            distance: km * 1000.0,
            start_date_local: date.to_string(),
            ..Activity::new(1, "Ride", ActivityType::Ride)
        }
    }

    fn on_days(kms: &[f64]) -> Vec<Activity> {
        kms.iter()
            .enumerate()
            .map(|(i, &km)| ride(km, &format!("2024-01-{:02}T10:00:00Z", i + 1)))
            .collect()
    }

    #[test]
    fn test_basic_history() {
        let result = compute_eddington(&on_days(&[10.0, 5.0, 7.0, 6.0, 8.0, 3.0]));
        assert_eq!(result.number, 5);
        assert_eq!(result.histogram, vec![6, 6, 6, 5, 5, 4, 3, 2, 1, 1]);
    }

    #[test]
    fn test_same_day_activities_are_summed() {
        let activities = vec![
            ride(10.0, "2024-01-01T08:00:00Z"),
            ride(5.0, "2024-01-01T18:30:00Z"),
        ];
        let result = compute_eddington(&activities);
        assert_eq!(result.number, 1);
        assert_eq!(result.histogram, vec![1; 15]);
    }

    #[test]
    fn test_descending_history() {
        let result = compute_eddington(&on_days(&[20.0, 15.0, 10.0, 5.0, 2.0]));
        assert_eq!(result.number, 4);
        assert_eq!(result.histogram.len(), 20);
        assert_eq!(result.histogram[0], 5);
        assert_eq!(result.histogram[19], 1);
    }

    #[test]
    fn test_partial_kilometers_summed_before_truncation() {
        // 0.6 + 0.6 km on one day is a 1 km day
        let activities = vec![
            ride(0.6, "2024-02-01 07:00:00"),
            ride(0.6, "2024-02-01 19:00:00"),
            ride(0.9, "2024-02-02"),
        ];
        let result = compute_eddington(&activities);
        assert_eq!(result.number, 1);
        assert_eq!(result.histogram, vec![1]);
    }

    #[test]
    fn test_empty_and_invalid_inputs() {
        assert_eq!(compute_eddington(&[]), EddingtonResult::default());

        let activities = vec![
            ride(0.0, "2024-01-01T10:00:00Z"),
            ride(-3.0, "2024-01-02T10:00:00Z"),
            ride(12.0, "yesterday"),
            ride(12.0, ""),
        ];
        let result = compute_eddington(&activities);
        assert_eq!(result.number, 0);
        assert!(result.histogram.is_empty());
    }

    #[test]
    fn test_parse_local_day_formats() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 17);
        assert_eq!(parse_local_day("2024-03-17T09:12:44Z"), day);
        assert_eq!(parse_local_day("2024-03-17T23:30:00+02:00"), day);
        assert_eq!(parse_local_day("2024-03-17 09:12:44"), day);
        assert_eq!(parse_local_day("2024-03-17T09:12:44"), day);
        assert_eq!(parse_local_day("2024-03-17"), day);
        assert_eq!(parse_local_day("2024-03-17T09:12"), day);
        assert_eq!(parse_local_day("17/03/2024"), None);
    }

    #[test]
    fn test_eddington_number_bounds() {
        assert_eq!(eddington_number(&[]), 0);
        assert_eq!(eddington_number(&[1]), 1);
        assert_eq!(eddington_number(&[100, 100, 100]), 3);
        assert_eq!(eddington_number(&[3, 3, 3, 3]), 3);
    }
}
