//! # Statistics
//!
//! Named statistics over an activity history, rendered as display strings.
//!
//! A [`Statistic`] is a closed set of variants evaluated with `match`:
//! global totals, single-activity records, per-day totals, best efforts
//! (any [`EffortScan`]), the Cooper and VO2max running tests and the
//! Eddington number. [`statistics_for`] returns the table shown for each
//! sport.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "parallel"))]
use crate::aggregate::find_best;
#[cfg(feature = "parallel")]
use crate::aggregate::find_best_parallel;
use crate::eddington::{compute_eddington, parse_local_day};
use crate::efforts::{Effort, EffortScan};
use crate::error::Result;
use crate::format::format_seconds;
use crate::{Activity, ActivityShort, ActivityType};

const NOT_AVAILABLE: &str = "Not available";

/// Cooper test duration in seconds
pub const COOPER_SECONDS: u32 = 12 * 60;

/// Duration of the velocity-at-VO2max test in seconds
pub const VO2MAX_SECONDS: u32 = 6 * 60;

/// Day format used in statistic values, e.g. `Sun 17 March 2024`
const DAY_FORMAT: &str = "%a %d %B %Y";

/// Whole-history totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalMetric {
    ActivityCount,
    ActiveDays,
    /// Longest run of consecutive active days
    MaxStreak,
    TotalDistance,
    TotalElevation,
    DistancePerActivity,
    /// Month with the largest total distance
    MostActiveMonth,
}

/// Largest single-activity value, reported with the activity holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordMetric {
    Distance,
    Elevation,
    HighestPoint,
    MovingTime,
    Speed,
}

impl RecordMetric {
    pub fn label(&self) -> &'static str {
        match self {
            RecordMetric::Distance => "Max distance",
            RecordMetric::Elevation => "Max elevation",
            RecordMetric::HighestPoint => "Highest point",
            RecordMetric::MovingTime => "Max moving time",
            RecordMetric::Speed => "Max speed",
        }
    }

    fn of(&self, activity: &Activity) -> f64 {
        match self {
            RecordMetric::Distance => activity.distance,
            RecordMetric::Elevation => activity.total_elevation_gain,
            RecordMetric::HighestPoint => activity.elev_high,
            RecordMetric::MovingTime => activity.moving_time as f64,
            RecordMetric::Speed => activity.max_speed,
        }
    }

    fn format(&self, activity: &Activity) -> String {
        match self {
            RecordMetric::Distance => format!("{:.2} km", activity.distance / 1000.0),
            RecordMetric::Elevation => format!("{:.2} m", activity.total_elevation_gain),
            RecordMetric::HighestPoint => format!("{:.2} m", activity.elev_high),
            RecordMetric::MovingTime => format_seconds(activity.moving_time),
            RecordMetric::Speed => format!("{:.2} km/h", activity.max_speed * 3.6),
        }
    }
}

/// Quantity summed per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayMetric {
    Distance,
    Elevation,
}

impl DayMetric {
    fn of(&self, activity: &Activity) -> f64 {
        match self {
            DayMetric::Distance => activity.distance,
            DayMetric::Elevation => activity.total_elevation_gain,
        }
    }

    fn format(&self, total: f64) -> String {
        match self {
            DayMetric::Distance => format!("{:.2} km", total / 1000.0),
            DayMetric::Elevation => format!("{:.2} m", total),
        }
    }
}

/// A named statistic over an activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statistic {
    Global { label: String, metric: GlobalMetric },
    Record(RecordMetric),
    /// Best day rendered as `value - day`
    DayTotal(DayMetric),
    /// Best day rendered as `day => value`
    BestDay { label: String, metric: DayMetric },
    BestEffort { label: String, scan: EffortScan },
    /// Best distance in 12 min with the Cooper VO2max estimate
    Cooper,
    /// Best distance in 6 min with its speed as velocity at VO2max
    Vo2max,
    Eddington,
}

/// An evaluated statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticResult {
    pub label: String,
    pub value: String,
    /// Activity the value was found in, for records and best efforts
    pub activity: Option<ActivityShort>,
}

impl Statistic {
    pub fn global(label: &str, metric: GlobalMetric) -> Self {
        Statistic::Global {
            label: label.to_string(),
            metric,
        }
    }

    pub fn best_day(label: &str, metric: DayMetric) -> Self {
        Statistic::BestDay {
            label: label.to_string(),
            metric,
        }
    }

    pub fn best_effort(label: &str, scan: EffortScan) -> Self {
        Statistic::BestEffort {
            label: label.to_string(),
            scan,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Statistic::Global { label, .. }
            | Statistic::BestDay { label, .. }
            | Statistic::BestEffort { label, .. } => label.as_str(),
            Statistic::Record(metric) => metric.label(),
            Statistic::DayTotal(DayMetric::Distance) => "Max distance in a day",
            Statistic::DayTotal(DayMetric::Elevation) => "Max elevation gain in a day",
            Statistic::Cooper => "Best Cooper (12 min)",
            Statistic::Vo2max => "Best VO2max (6 min)",
            Statistic::Eddington => "Eddington number",
        }
    }

    /// Evaluate over `activities`.
    ///
    /// Fails only when a best-effort target is invalid.
    pub fn evaluate(&self, activities: &[Activity]) -> Result<StatisticResult> {
        let (value, activity) = match self {
            Statistic::Global { metric, .. } => (global_value(*metric, activities), None),
            Statistic::Record(metric) => match record_holder(*metric, activities) {
                Some(holder) => (metric.format(holder), Some(holder.short())),
                None => (NOT_AVAILABLE.to_string(), None),
            },
            Statistic::DayTotal(metric) => {
                let value = best_day(*metric, activities)
                    .map(|(day, total)| {
                        format!("{} - {}", metric.format(total), day.format(DAY_FORMAT))
                    })
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                (value, None)
            }
            Statistic::BestDay { metric, .. } => {
                let value = best_day(*metric, activities)
                    .map(|(day, total)| {
                        format!("{} => {}", day.format(DAY_FORMAT), metric.format(total))
                    })
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                (value, None)
            }
            Statistic::BestEffort { scan, .. } => match best_effort(activities, *scan)? {
                Some(effort) => (effort_value(scan, &effort), effort.activity),
                None => (NOT_AVAILABLE.to_string(), None),
            },
            Statistic::Cooper => {
                let scan = EffortScan::BestDistanceForTime(COOPER_SECONDS);
                match best_effort(activities, scan)? {
                    Some(effort) => (
                        format!(
                            "{} -- VO2 max = {:.2} ml/kg/min",
                            effort_value(&scan, &effort),
                            cooper_vo2max(effort.distance)
                        ),
                        effort.activity,
                    ),
                    None => (NOT_AVAILABLE.to_string(), None),
                }
            }
            Statistic::Vo2max => {
                let scan = EffortScan::BestDistanceForTime(VO2MAX_SECONDS);
                match best_effort(activities, scan)? {
                    Some(effort) => (
                        format!(
                            "{} -- VO2max = {:.2} km/h",
                            effort_value(&scan, &effort),
                            effort.speed_kmh()
                        ),
                        effort.activity,
                    ),
                    None => (NOT_AVAILABLE.to_string(), None),
                }
            }
            Statistic::Eddington => (format!("{} km", compute_eddington(activities).number), None),
        };

        Ok(StatisticResult {
            label: self.label().to_string(),
            value,
            activity,
        })
    }
}

fn best_effort(activities: &[Activity], scan: EffortScan) -> Result<Option<Effort>> {
    #[cfg(feature = "parallel")]
    let best = find_best_parallel(activities, scan);
    #[cfg(not(feature = "parallel"))]
    let best = find_best(activities, scan);
    best
}

/// VO2max in ml/kg/min estimated from the distance run in 12 minutes.
fn cooper_vo2max(distance: f64) -> f64 {
    (distance - 504.9) / 44.73
}

/// First activity holding the largest value of `metric`.
fn record_holder(metric: RecordMetric, activities: &[Activity]) -> Option<&Activity> {
    activities.iter().fold(None, |best: Option<&Activity>, activity| match best {
        Some(current) if metric.of(activity) <= metric.of(current) => Some(current),
        _ => Some(activity),
    })
}

/// Day with the largest total of `metric`; the earliest wins ties.
fn best_day(metric: DayMetric, activities: &[Activity]) -> Option<(NaiveDate, f64)> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for activity in activities {
        if let Some(day) = parse_local_day(&activity.start_date_local) {
            *totals.entry(day).or_insert(0.0) += metric.of(activity);
        }
    }
    totals.into_iter().fold(None, |best, (day, total)| match best {
        Some((_, current)) if total <= current => best,
        _ => Some((day, total)),
    })
}

/// Longest run of consecutive calendar days with at least one activity.
fn max_streak(activities: &[Activity]) -> usize {
    let days: BTreeSet<NaiveDate> = activities
        .iter()
        .filter_map(|a| parse_local_day(&a.start_date_local))
        .collect();

    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

fn most_active_month(activities: &[Activity]) -> Option<String> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for activity in activities {
        if let Some(day) = parse_local_day(&activity.start_date_local) {
            *totals.entry((day.year(), day.month())).or_insert(0.0) += activity.distance;
        }
    }

    let ((year, month), meters) = totals
        .into_iter()
        .filter(|&(_, meters)| meters > 0.0)
        .fold(None, |best, (month, meters)| match best {
            Some((_, current)) if meters <= current => best,
            _ => Some((month, meters)),
        })?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(format!("{} with {:.2} km", first.format("%B %Y"), meters / 1000.0))
}

fn global_value(metric: GlobalMetric, activities: &[Activity]) -> String {
    match metric {
        GlobalMetric::ActivityCount => activities.len().to_string(),
        GlobalMetric::ActiveDays => {
            let days: BTreeSet<_> = activities
                .iter()
                .filter_map(|a| parse_local_day(&a.start_date_local))
                .collect();
            days.len().to_string()
        }
        GlobalMetric::MaxStreak => max_streak(activities).to_string(),
        GlobalMetric::TotalDistance => {
            let meters: f64 = activities.iter().map(|a| a.distance).sum();
            format!("{:.2} km", meters / 1000.0)
        }
        GlobalMetric::TotalElevation => {
            let meters: f64 = activities.iter().map(|a| a.total_elevation_gain).sum();
            format!("{:.2} m", meters)
        }
        GlobalMetric::DistancePerActivity => {
            if activities.is_empty() {
                return format!("{:.2} km", 0.0);
            }
            let meters: f64 = activities.iter().map(|a| a.distance).sum();
            format!("{:.2} km", meters / 1000.0 / activities.len() as f64)
        }
        GlobalMetric::MostActiveMonth => {
            most_active_month(activities).unwrap_or_else(|| NOT_AVAILABLE.to_string())
        }
    }
}

fn effort_value(scan: &EffortScan, effort: &Effort) -> String {
    match scan {
        EffortScan::BestTimeForDistance(_) => format!(
            "{} => {}",
            format_seconds(effort.seconds),
            effort.formatted_speed()
        ),
        EffortScan::BestDistanceForTime(_) => {
            if effort.distance > 1000.0 {
                format!(
                    "{:.2} km => {}",
                    effort.distance / 1000.0,
                    effort.formatted_speed()
                )
            } else {
                format!("{:.0} m => {}", effort.distance, effort.formatted_speed())
            }
        }
        EffortScan::BestPowerForTime(_) => effort.formatted_power(),
        EffortScan::BestElevationForDistance(_) => format!(
            "{} => {}",
            format_seconds(effort.seconds),
            effort.formatted_gradient()
        ),
    }
}

// ============================================================================
// Tables
// ============================================================================

const RIDE_DISTANCES: &[(&str, f64)] = &[
    ("Best 250 m", 250.0),
    ("Best 500 m", 500.0),
    ("Best 1000 m", 1000.0),
    ("Best 5 km", 5000.0),
    ("Best 10 km", 10000.0),
    ("Best 20 km", 20000.0),
    ("Best 50 km", 50000.0),
    ("Best 100 km", 100000.0),
];

const RIDE_DURATIONS: &[(&str, u32)] = &[
    ("Best 30 min", 30 * 60),
    ("Best 1 h", 60 * 60),
    ("Best 2 h", 2 * 60 * 60),
    ("Best 3 h", 3 * 60 * 60),
    ("Best 4 h", 4 * 60 * 60),
    ("Best 5 h", 5 * 60 * 60),
];

const RIDE_GRADIENTS: &[(&str, f64)] = &[
    ("Max gradient for 250 m", 250.0),
    ("Max gradient for 500 m", 500.0),
    ("Max gradient for 1000 m", 1000.0),
    ("Max gradient for 5 km", 5000.0),
    ("Max gradient for 10 km", 10000.0),
    ("Max gradient for 20 km", 20000.0),
];

const VIRTUAL_RIDE_POWER: &[(&str, u32)] = &[
    ("Best average power for 20 min", 20 * 60),
    ("Best average power for 1 h", 60 * 60),
];

const RUN_DISTANCES: &[(&str, f64)] = &[
    ("Best 200 m", 200.0),
    ("Best 400 m", 400.0),
    ("Best 1000 m", 1000.0),
    ("Best 5000 m", 5000.0),
    ("Best 10000 m", 10000.0),
    ("Best half Marathon", 21097.0),
    ("Best Marathon", 42195.0),
];

const RUN_DURATIONS: &[(&str, u32)] = &[
    ("Best 1 h", 60 * 60),
    ("Best 2 h", 2 * 60 * 60),
    ("Best 3 h", 3 * 60 * 60),
    ("Best 4 h", 4 * 60 * 60),
    ("Best 5 h", 5 * 60 * 60),
    ("Best 6 h", 6 * 60 * 60),
];

const INLINE_SKATE_DISTANCES: &[(&str, f64)] = &[
    ("Best 200 m", 200.0),
    ("Best 400 m", 400.0),
    ("Best 1000 m", 1000.0),
    ("Best 10000 m", 10000.0),
    ("Best half Marathon", 21097.0),
    ("Best Marathon", 42195.0),
];

fn common_statistics() -> Vec<Statistic> {
    vec![
        Statistic::global("Nb activities", GlobalMetric::ActivityCount),
        Statistic::global("Nb actives days", GlobalMetric::ActiveDays),
        Statistic::global("Max streak", GlobalMetric::MaxStreak),
        Statistic::global("Total distance", GlobalMetric::TotalDistance),
        Statistic::global("Total elevation", GlobalMetric::TotalElevation),
        Statistic::global("Km by activity", GlobalMetric::DistancePerActivity),
        Statistic::Record(RecordMetric::Distance),
        Statistic::DayTotal(DayMetric::Distance),
        Statistic::Record(RecordMetric::Elevation),
        Statistic::DayTotal(DayMetric::Elevation),
        Statistic::Record(RecordMetric::HighestPoint),
        Statistic::Record(RecordMetric::MovingTime),
        Statistic::global("Most active month", GlobalMetric::MostActiveMonth),
        Statistic::Eddington,
    ]
}

fn with_scans(
    table: &mut Vec<Statistic>,
    targets: &[(&str, f64)],
    scan: fn(f64) -> EffortScan,
) {
    table.extend(
        targets
            .iter()
            .map(|&(label, target)| Statistic::best_effort(label, scan(target))),
    );
}

fn with_timed_scans(
    table: &mut Vec<Statistic>,
    targets: &[(&str, u32)],
    scan: fn(u32) -> EffortScan,
) {
    table.extend(
        targets
            .iter()
            .map(|&(label, target)| Statistic::best_effort(label, scan(target))),
    );
}

/// Statistic table shown for a sport.
///
/// Every table starts with the global totals, the single-activity and
/// per-day records and the Eddington number; sports without best-effort
/// tables get just those.
pub fn statistics_for(activity_type: ActivityType) -> Vec<Statistic> {
    let mut table = common_statistics();

    match activity_type {
        ActivityType::Ride
        | ActivityType::GravelRide
        | ActivityType::MountainBikeRide
        | ActivityType::AlpineSki => {
            table.push(Statistic::Record(RecordMetric::Speed));
            with_scans(&mut table, RIDE_DISTANCES, EffortScan::BestTimeForDistance);
            with_timed_scans(&mut table, RIDE_DURATIONS, EffortScan::BestDistanceForTime);
            if activity_type != ActivityType::AlpineSki {
                with_scans(&mut table, RIDE_GRADIENTS, EffortScan::BestElevationForDistance);
            }
        }
        ActivityType::VirtualRide => {
            with_scans(&mut table, RIDE_DISTANCES, EffortScan::BestTimeForDistance);
            with_timed_scans(
                &mut table,
                &RIDE_DURATIONS[..5],
                EffortScan::BestDistanceForTime,
            );
            with_timed_scans(&mut table, VIRTUAL_RIDE_POWER, EffortScan::BestPowerForTime);
        }
        ActivityType::Commute => {
            with_scans(&mut table, &RIDE_DISTANCES[..5], EffortScan::BestTimeForDistance);
            with_timed_scans(
                &mut table,
                &RIDE_DURATIONS[..2],
                EffortScan::BestDistanceForTime,
            );
            with_scans(
                &mut table,
                &RIDE_GRADIENTS[..3],
                EffortScan::BestElevationForDistance,
            );
        }
        ActivityType::Run | ActivityType::TrailRun => {
            table.push(Statistic::Cooper);
            table.push(Statistic::Vo2max);
            with_scans(&mut table, RUN_DISTANCES, EffortScan::BestTimeForDistance);
            with_timed_scans(&mut table, RUN_DURATIONS, EffortScan::BestDistanceForTime);
        }
        ActivityType::InlineSkate => {
            with_scans(&mut table, INLINE_SKATE_DISTANCES, EffortScan::BestTimeForDistance);
            with_timed_scans(
                &mut table,
                &RUN_DURATIONS[..4],
                EffortScan::BestDistanceForTime,
            );
        }
        ActivityType::Hike => {
            table.push(Statistic::best_day("Max distance in a day", DayMetric::Distance));
            table.push(Statistic::best_day("Max elevation in a day", DayMetric::Elevation));
        }
        ActivityType::Other => {}
    }

    table
}

/// Sport whose activities are pooled with `activity_type`.
///
/// Gravel and mountain bike rides count as rides, trail runs as runs.
fn sport_group(activity_type: ActivityType) -> ActivityType {
    match activity_type {
        ActivityType::GravelRide | ActivityType::MountainBikeRide => ActivityType::Ride,
        ActivityType::TrailRun => ActivityType::Run,
        other => other,
    }
}

/// Evaluate the table of `activity_type` over the activities of its sport.
///
/// Activities are pooled by sport: `Ride`, `GravelRide` and
/// `MountainBikeRide` share one history, as do `Run` and `TrailRun`. Every
/// other type is matched exactly.
pub fn compute_statistics(
    activity_type: ActivityType,
    activities: &[Activity],
) -> Result<Vec<StatisticResult>> {
    let group = sport_group(activity_type);
    let matching: Vec<Activity> = activities
        .iter()
        .filter(|a| sport_group(a.activity_type) == group)
        .cloned()
        .collect();

    let results = statistics_for(activity_type)
        .iter()
        .map(|statistic| statistic.evaluate(&matching))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "[Statistics] {} statistics for {} ({} of {} activities)",
        results.len(),
        activity_type,
        matching.len(),
        activities.len()
    );

    Ok(results)
}
