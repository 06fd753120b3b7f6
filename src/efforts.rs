//! # Best Efforts
//!
//! Sliding-window searches for the best effort of a single stream:
//! - Fastest time over a distance
//! - Longest distance within a duration
//! - Highest average power over a duration
//! - Largest elevation gain over a distance
//!
//! Each scan is a two-pointer sweep; both pointers only move forward so a
//! scan is O(n) in the number of samples.
//!
//! A scan returns `Ok(None)` when the stream lacks the series it needs or
//! no window satisfies the target, and `Err` only for a target at or below
//! the scan's minimum.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_target_above, Result};
use crate::format::{format_pace, format_seconds, grade_percent, speed_kmh};
use crate::{Activity, ActivityShort, Stream};

/// Distance targets must be strictly above this many meters.
pub const MIN_TARGET_DISTANCE: f64 = 100.0;

/// Duration targets must be strictly above this many seconds.
pub const MIN_TARGET_SECONDS: u32 = 10;

/// A window counts as covering a distance target within this many meters.
const DISTANCE_TOLERANCE: f64 = 0.5;

/// A best effort found in one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effort {
    /// Distance covered in meters
    pub distance: f64,
    /// Duration in seconds
    pub seconds: u32,
    /// Altitude at the end of the window minus altitude at its start
    pub delta_altitude: f64,
    pub idx_start: usize,
    pub idx_end: usize,
    /// Mean power over the window, when a power series exists
    pub average_power: Option<f64>,
    pub label: String,
    /// Owning activity; `None` when a bare stream was scanned
    pub activity: Option<ActivityShort>,
}

impl Effort {
    /// Average speed in m/s.
    pub fn speed_ms(&self) -> f64 {
        if self.seconds == 0 {
            0.0
        } else {
            self.distance / self.seconds as f64
        }
    }

    /// Average speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        speed_kmh(self.distance, self.seconds)
    }

    /// Speed as a pace per kilometre for running sports, km/h otherwise.
    pub fn formatted_speed(&self) -> String {
        let running = self
            .activity
            .as_ref()
            .map(|a| a.activity_type.is_running())
            .unwrap_or(false);

        if running {
            if self.distance > 0.0 {
                format!("{}/km", format_pace(self.seconds as f64 * 1000.0 / self.distance))
            } else {
                format!("{}/km", format_pace(0.0))
            }
        } else {
            format!("{:.2} km/h", self.speed_kmh())
        }
    }

    /// Average grade over the window in percent.
    pub fn gradient(&self) -> f64 {
        grade_percent(self.delta_altitude, self.distance)
    }

    pub fn formatted_gradient(&self) -> String {
        format!("{:.2}%", self.gradient())
    }

    pub fn formatted_power(&self) -> String {
        match self.average_power {
            Some(power) => format!("{} W", power as i64),
            None => "Not available".to_string(),
        }
    }

    fn with_activity(mut self, activity: &Activity) -> Self {
        self.activity = Some(activity.short());
        self
    }
}

/// One best-effort search together with its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffortScan {
    /// Fastest time over a distance in meters
    BestTimeForDistance(f64),
    /// Longest distance within a duration in seconds
    BestDistanceForTime(u32),
    /// Highest average power over a duration in seconds
    BestPowerForTime(u32),
    /// Largest elevation gain over a distance in meters
    BestElevationForDistance(f64),
}

impl EffortScan {
    pub fn name(&self) -> &'static str {
        match self {
            EffortScan::BestTimeForDistance(_) => "best time for distance",
            EffortScan::BestDistanceForTime(_) => "best distance for time",
            EffortScan::BestPowerForTime(_) => "best power for time",
            EffortScan::BestElevationForDistance(_) => "best elevation for distance",
        }
    }

    /// Check the target against the scan's minimum.
    pub fn validate(&self) -> Result<()> {
        match *self {
            EffortScan::BestTimeForDistance(distance)
            | EffortScan::BestElevationForDistance(distance) => {
                ensure_target_above(self.name(), distance, MIN_TARGET_DISTANCE)
            }
            EffortScan::BestDistanceForTime(seconds) | EffortScan::BestPowerForTime(seconds) => {
                ensure_target_above(self.name(), seconds as f64, MIN_TARGET_SECONDS as f64)
            }
        }
    }

    /// Run the scan over a bare stream.
    pub fn scan(&self, stream: &Stream) -> Result<Option<Effort>> {
        match *self {
            EffortScan::BestTimeForDistance(distance) => best_time_for_distance(stream, distance),
            EffortScan::BestDistanceForTime(seconds) => best_distance_for_time(stream, seconds),
            EffortScan::BestPowerForTime(seconds) => best_power_for_time(stream, seconds),
            EffortScan::BestElevationForDistance(distance) => {
                best_elevation_for_distance(stream, distance)
            }
        }
    }

    /// Run the scan over an activity's stream and tag the result with it.
    ///
    /// An activity without a stream has no effort.
    pub fn evaluate(&self, activity: &Activity) -> Result<Option<Effort>> {
        self.validate()?;
        let Some(stream) = activity.stream.as_ref() else {
            return Ok(None);
        };
        Ok(self.scan(stream)?.map(|e| e.with_activity(activity)))
    }

    /// Whether `candidate` strictly beats `current` under this scan's ordering.
    pub fn is_better(&self, candidate: &Effort, current: &Effort) -> bool {
        match self {
            EffortScan::BestTimeForDistance(_) => candidate.seconds < current.seconds,
            EffortScan::BestDistanceForTime(_) => candidate.distance > current.distance,
            EffortScan::BestPowerForTime(_) => {
                candidate.average_power.unwrap_or(0.0) > current.average_power.unwrap_or(0.0)
            }
            EffortScan::BestElevationForDistance(_) => {
                candidate.delta_altitude > current.delta_altitude
            }
        }
    }
}

fn altitude_delta(altitudes: Option<&[f64]>, start: usize, end: usize) -> f64 {
    altitudes.map(|alt| alt[end] - alt[start]).unwrap_or(0.0)
}

/// Mean of `watts[start..=end]`, zeros included.
///
/// A watts series shorter than the window is averaged over the samples it
/// has; `None` only when it ends before `start`.
fn mean_power(watts: Option<&[f64]>, start: usize, end: usize) -> Option<f64> {
    let watts = watts?;
    if start >= watts.len() || end < start {
        return None;
    }
    let window = &watts[start..=end.min(watts.len() - 1)];
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Fastest time to cover `distance` meters.
///
/// The window is extended until it covers the target (within half a meter)
/// and its time is scaled linearly to the exact target distance. Estimates
/// of one second or less are ignored.
pub fn best_time_for_distance(stream: &Stream, distance: f64) -> Result<Option<Effort>> {
    ensure_target_above("best time for distance", distance, MIN_TARGET_DISTANCE)?;

    let Some(altitudes) = stream.altitudes() else {
        return Ok(None);
    };
    let distances = stream.distances();
    let times = stream.times();
    let n = stream.len().min(altitudes.len());

    let mut best_time = f64::MAX;
    let mut best_window: Option<(usize, usize)> = None;
    let (mut start, mut end) = (0, 0);

    while end < n {
        let covered = distances[end] - distances[start];
        if covered < distance - DISTANCE_TOLERANCE {
            end += 1;
        } else {
            let elapsed = (times[end] - times[start]) as f64;
            let estimate = distance / covered * elapsed;
            if estimate < best_time && estimate > 1.0 {
                best_time = estimate;
                best_window = Some((start, end));
            }
            start += 1;
        }
    }

    let Some((start, end)) = best_window else {
        debug!("[Efforts] No window covers {:.0}m ({} samples)", distance, n);
        return Ok(None);
    };

    debug!(
        "[Efforts] Best time for {:.0}m: {:.1}s at [{}, {}]",
        distance, best_time, start, end
    );

    Ok(Some(Effort {
        distance,
        seconds: best_time as u32,
        delta_altitude: altitudes[end] - altitudes[start],
        idx_start: start,
        idx_end: end,
        average_power: mean_power(stream.watts(), start, end),
        label: format!("Best speed for {:.0}m", distance),
        activity: None,
    }))
}

/// Longest distance covered in `seconds`.
///
/// The window is extended until it lasts at least the target duration and
/// its distance is scaled linearly to the exact target duration.
pub fn best_distance_for_time(stream: &Stream, seconds: u32) -> Result<Option<Effort>> {
    ensure_target_above(
        "best distance for time",
        seconds as f64,
        MIN_TARGET_SECONDS as f64,
    )?;

    let Some(altitudes) = stream.altitudes() else {
        return Ok(None);
    };
    let distances = stream.distances();
    let times = stream.times();
    let n = stream.len().min(altitudes.len());
    let target = seconds as f64;

    let mut best_distance = 0.0;
    let mut best_window: Option<(usize, usize)> = None;
    let (mut start, mut end) = (0, 0);

    while end < n {
        let elapsed = (times[end] - times[start]) as f64;
        if elapsed < target {
            end += 1;
        } else {
            let covered = distances[end] - distances[start];
            let estimate = covered / elapsed * target;
            if estimate > best_distance {
                best_distance = estimate;
                best_window = Some((start, end));
            }
            start += 1;
        }
    }

    let Some((start, end)) = best_window else {
        debug!("[Efforts] No window lasts {}s ({} samples)", seconds, n);
        return Ok(None);
    };

    debug!(
        "[Efforts] Best distance for {}s: {:.1}m at [{}, {}]",
        seconds, best_distance, start, end
    );

    Ok(Some(Effort {
        distance: best_distance,
        seconds,
        delta_altitude: altitudes[end] - altitudes[start],
        idx_start: start,
        idx_end: end,
        average_power: mean_power(stream.watts(), start, end),
        label: format!("Best distance for {}", format_seconds(seconds)),
        activity: None,
    }))
}

/// Highest average power sustained over `seconds`.
///
/// Each sample covers one second, so the inclusive window `[start, end]`
/// lasts `time[end] - time[start] + 1` seconds. The window grows until it
/// lasts the target, is scored by its mean power, then slides forward.
/// Zero-power samples count toward the mean.
pub fn best_power_for_time(stream: &Stream, seconds: u32) -> Result<Option<Effort>> {
    ensure_target_above(
        "best power for time",
        seconds as f64,
        MIN_TARGET_SECONDS as f64,
    )?;

    let Some(watts) = stream.watts() else {
        return Ok(None);
    };
    let altitudes = stream.altitudes();
    let distances = stream.distances();
    let times = stream.times();
    let mut n = stream.len().min(watts.len());
    if let Some(alt) = altitudes {
        n = n.min(alt.len());
    }
    if n == 0 {
        return Ok(None);
    }
    let best_window = best_power_window(&watts[..n], &times[..n], seconds as i64);

    let Some((best_power, start, end)) = best_window else {
        debug!("[Efforts] No power window lasts {}s ({} samples)", seconds, n);
        return Ok(None);
    };

    debug!(
        "[Efforts] Best power for {}s: {:.0}W at [{}, {}]",
        seconds, best_power, start, end
    );

    Ok(Some(Effort {
        distance: distances[end] - distances[start],
        seconds,
        delta_altitude: altitude_delta(altitudes, start, end),
        idx_start: start,
        idx_end: end,
        average_power: Some(best_power),
        label: format!("Best power for {}", format_seconds(seconds)),
        activity: None,
    }))
}

/// Best mean power over windows lasting `target` seconds, as
/// `(average, start, end)`. `watts` and `times` must be non-empty and of
/// equal length.
fn best_power_window(watts: &[f64], times: &[i64], target: i64) -> Option<(f64, usize, usize)> {
    let n = watts.len();
    let mut best: Option<(f64, usize, usize)> = None;
    let (mut start, mut end) = (0, 0);
    let mut window_sum = watts[0];

    loop {
        let covered = times[end] - times[start] + 1;
        if covered < target {
            end += 1;
            if end >= n {
                break;
            }
            window_sum += watts[end];
        } else {
            let average = window_sum / (end - start + 1) as f64;
            if best.map_or(true, |(power, _, _)| average > power) {
                best = Some((average, start, end));
            }
            window_sum -= watts[start];
            start += 1;
            end += 1;
            if end >= n {
                break;
            }
            window_sum += watts[end];
        }
    }

    best
}

/// Largest elevation gain over `distance` meters.
///
/// The gain is signed: on a descending profile the result is the least
/// negative window.
pub fn best_elevation_for_distance(stream: &Stream, distance: f64) -> Result<Option<Effort>> {
    ensure_target_above(
        "best elevation for distance",
        distance,
        MIN_TARGET_DISTANCE,
    )?;

    let Some(altitudes) = stream.altitudes() else {
        return Ok(None);
    };
    let distances = stream.distances();
    let times = stream.times();
    let n = stream.len().min(altitudes.len());

    let mut best_gain = f64::NEG_INFINITY;
    let mut best_window: Option<(usize, usize)> = None;
    let (mut start, mut end) = (0, 0);

    while end < n {
        let covered = distances[end] - distances[start];
        if covered < distance - DISTANCE_TOLERANCE {
            end += 1;
        } else {
            let gain = altitudes[end] - altitudes[start];
            if gain > best_gain {
                best_gain = gain;
                best_window = Some((start, end));
            }
            start += 1;
        }
    }

    let Some((start, end)) = best_window else {
        debug!("[Efforts] No window covers {:.0}m ({} samples)", distance, n);
        return Ok(None);
    };

    debug!(
        "[Efforts] Best elevation for {:.0}m: {:.1}m at [{}, {}]",
        distance, best_gain, start, end
    );

    Ok(Some(Effort {
        distance: distances[end] - distances[start],
        seconds: (times[end] - times[start]).max(0) as u32,
        delta_altitude: best_gain,
        idx_start: start,
        idx_end: end,
        average_power: mean_power(stream.watts(), start, end),
        label: format!("Best gradient for {}m", distance as i64),
        activity: None,
    }))
}
