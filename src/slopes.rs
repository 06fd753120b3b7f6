//! # Slope Segmentation
//!
//! Splits an activity's elevation profile into a contiguous sequence of
//! ascents, descents and plateaus.
//!
//! ## Algorithm
//! 1. Smooth altitude and distance with a centered moving average
//! 2. Classify each consecutive sample pair by its grade
//! 3. Group equally classified pairs into runs
//! 4. Drop runs too short (or, for ascents, too easy) to matter
//! 5. Re-fill the dropped spans with plateaus so the profile stays covered
//! 6. Coalesce adjacent segments of the same type
//! 7. Fold a short segment bracketed by two segments of the same type into
//!    them (a 200 m flat between two climbs is still one climb)
//!
//! Consecutive slopes share their boundary sample: `end_index` of one slope
//! is `start_index` of the next, and the sequence spans `[0, n - 1]`.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::smoothing::smooth;
use crate::Stream;

/// Direction of a slope segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlopeType {
    Ascent,
    Descent,
    Plateau,
}

/// A contiguous segment of an elevation profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slope {
    pub slope_type: SlopeType,
    pub start_index: usize,
    pub end_index: usize,
    /// Smoothed altitude at `start_index`
    pub start_altitude: f64,
    /// Smoothed altitude at `end_index`
    pub end_altitude: f64,
    /// Average grade in percent
    pub grade: f64,
    /// Steepest pair grade in percent (absolute)
    pub max_grade: f64,
    /// Distance in meters
    pub distance: f64,
    /// Duration in seconds
    pub duration: u32,
    /// Average speed in m/s
    pub average_speed: f64,
}

/// Configuration for slope segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    /// Pairs steeper than this grade (percent) are ascents or descents
    pub grade_threshold: f64,
    /// Segments shorter than this (meters) are dropped
    pub min_segment_distance: f64,
    /// Ascents need distance (m) × grade (%) of at least this
    pub min_climb_index: f64,
    /// Half-width of the smoothing window in samples (0 or 1 disables)
    pub smoothing_window: usize,
    /// A segment shorter than this (meters) between two segments of the
    /// same type is folded into them
    pub max_bridge_distance: f64,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self {
            grade_threshold: 3.0,
            min_segment_distance: 500.0,
            min_climb_index: 3500.0,
            smoothing_window: 20,
            max_bridge_distance: 500.0,
        }
    }
}

impl SlopeConfig {
    /// Reject thresholds that would make classification meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.grade_threshold.is_finite() && self.grade_threshold > 0.0) {
            return Err(AnalyticsError::InvalidConfig {
                message: format!("grade_threshold must be > 0, got {}", self.grade_threshold),
            });
        }
        for (name, value) in [
            ("min_segment_distance", self.min_segment_distance),
            ("min_climb_index", self.min_climb_index),
            ("max_bridge_distance", self.max_bridge_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AnalyticsError::InvalidConfig {
                    message: format!("{} must be >= 0, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

fn classify(grade: f64, threshold: f64) -> SlopeType {
    if grade >= threshold {
        SlopeType::Ascent
    } else if grade <= -threshold {
        SlopeType::Descent
    } else {
        SlopeType::Plateau
    }
}

/// Raw and smoothed samples of one stream, clamped to a common length.
struct Profile<'a> {
    distances: &'a [f64],
    times: &'a [i64],
    smoothed_altitudes: Vec<f64>,
    smoothed_distances: Vec<f64>,
}

impl<'a> Profile<'a> {
    fn len(&self) -> usize {
        self.distances.len()
    }

    /// Grade of the pair `(i, i + 1)` from smoothed samples, `None` when the
    /// pair covers no distance.
    fn pair_grade(&self, i: usize) -> Option<f64> {
        let run = self.smoothed_distances[i + 1] - self.smoothed_distances[i];
        if run <= 0.0 {
            return None;
        }
        Some((self.smoothed_altitudes[i + 1] - self.smoothed_altitudes[i]) / run * 100.0)
    }

    fn slope(&self, slope_type: SlopeType, start: usize, end: usize) -> Slope {
        let distance = (self.distances[end] - self.distances[start]).max(0.0);
        let duration = (self.times[end] - self.times[start]).max(0) as u32;
        let start_altitude = self.smoothed_altitudes[start];
        let end_altitude = self.smoothed_altitudes[end];
        let grade = if distance > 0.0 {
            (end_altitude - start_altitude) / distance * 100.0
        } else {
            0.0
        };
        let max_grade = (start..end)
            .filter_map(|i| self.pair_grade(i))
            .map(f64::abs)
            .fold(0.0, f64::max);
        let average_speed = if duration > 0 {
            distance / duration as f64
        } else {
            0.0
        };

        Slope {
            slope_type,
            start_index: start,
            end_index: end,
            start_altitude,
            end_altitude,
            grade,
            max_grade,
            distance,
            duration,
            average_speed,
        }
    }
}

/// Maximal runs of equally classified pairs as `(type, start, end)`.
///
/// Runs share boundaries and cover `[0, n - 1]`. Pairs covering no distance
/// take the classification of the run they fall in.
fn classify_runs(profile: &Profile, threshold: f64) -> Vec<(SlopeType, usize, usize)> {
    let n = profile.len();
    let mut runs = Vec::new();
    let mut current: Option<(SlopeType, usize)> = None;

    for i in 0..n - 1 {
        let Some(grade) = profile.pair_grade(i) else {
            continue;
        };
        let kind = classify(grade, threshold);
        match current {
            None => current = Some((kind, 0)),
            Some((run_kind, start)) if run_kind != kind => {
                runs.push((run_kind, start, i));
                current = Some((kind, i));
            }
            _ => {}
        }
    }

    if let Some((kind, start)) = current {
        runs.push((kind, start, n - 1));
    }
    runs
}

fn is_significant(slope: &Slope, config: &SlopeConfig) -> bool {
    if slope.distance < config.min_segment_distance {
        return false;
    }
    match slope.slope_type {
        SlopeType::Ascent => {
            slope.grade.abs() >= config.grade_threshold
                && slope.distance * slope.grade.abs() >= config.min_climb_index
        }
        SlopeType::Descent => slope.grade.abs() >= config.grade_threshold,
        SlopeType::Plateau => true,
    }
}

/// Cover every span between retained segments (and before the first and
/// after the last) with a plateau.
fn fill_gaps(profile: &Profile, retained: Vec<Slope>) -> Vec<Slope> {
    let last = profile.len() - 1;
    let mut filled = Vec::with_capacity(retained.len() * 2 + 1);
    let mut cursor = 0;

    for slope in retained {
        if slope.start_index > cursor {
            filled.push(profile.slope(SlopeType::Plateau, cursor, slope.start_index));
        }
        cursor = slope.end_index;
        filled.push(slope);
    }
    if cursor < last {
        filled.push(profile.slope(SlopeType::Plateau, cursor, last));
    }
    filled
}

/// Join two contiguous segments, keeping the type of the first.
///
/// Grade and speed are distance-weighted averages.
fn combine(first: &Slope, second: &Slope) -> Slope {
    let distance = first.distance + second.distance;
    let weighted = |a: f64, b: f64| {
        if distance > 0.0 {
            (a * first.distance + b * second.distance) / distance
        } else {
            (a + b) / 2.0
        }
    };

    Slope {
        slope_type: first.slope_type,
        start_index: first.start_index,
        end_index: second.end_index,
        start_altitude: first.start_altitude,
        end_altitude: second.end_altitude,
        grade: weighted(first.grade, second.grade),
        max_grade: first.max_grade.max(second.max_grade),
        distance,
        duration: first.duration + second.duration,
        average_speed: weighted(first.average_speed, second.average_speed),
    }
}

fn merge_same_type(slopes: Vec<Slope>) -> Vec<Slope> {
    let mut merged: Vec<Slope> = Vec::with_capacity(slopes.len());
    for slope in slopes {
        match merged.last_mut() {
            Some(last) if last.slope_type == slope.slope_type => {
                *last = combine(last, &slope);
            }
            _ => merged.push(slope),
        }
    }
    merged
}

/// Fold `X, short Y, X` into a single `X`.
///
/// Expects adjacent segments to differ in type, which folding preserves, so
/// checking the top three entries after each push is enough.
fn merge_bridged(slopes: Vec<Slope>, max_bridge_distance: f64) -> Vec<Slope> {
    let mut stack: Vec<Slope> = Vec::with_capacity(slopes.len());
    for slope in slopes {
        stack.push(slope);
        let len = stack.len();
        if len < 3 {
            continue;
        }
        let (outer, bridge, closing) = (&stack[len - 3], &stack[len - 2], &stack[len - 1]);
        if outer.slope_type == closing.slope_type
            && bridge.slope_type != outer.slope_type
            && bridge.distance < max_bridge_distance
        {
            let folded = combine(&combine(outer, bridge), closing);
            stack.truncate(len - 3);
            stack.push(folded);
        }
    }
    stack
}

/// Segment a stream's elevation profile into slopes.
///
/// Returns an empty list when the stream has no altitude or fewer than two
/// samples, and `Err` only for an invalid `config`.
pub fn list_slopes(stream: &Stream, config: &SlopeConfig) -> Result<Vec<Slope>> {
    config.validate()?;

    let Some(altitudes) = stream.altitudes() else {
        return Ok(Vec::new());
    };
    let n = stream.len().min(altitudes.len());
    if n < 2 {
        return Ok(Vec::new());
    }

    let distances = &stream.distances()[..n];
    let profile = Profile {
        distances,
        times: &stream.times()[..n],
        smoothed_altitudes: smooth(&altitudes[..n], config.smoothing_window),
        smoothed_distances: smooth(distances, config.smoothing_window),
    };

    let runs = classify_runs(&profile, config.grade_threshold);
    let run_count = runs.len();
    let retained: Vec<Slope> = runs
        .into_iter()
        .map(|(kind, start, end)| profile.slope(kind, start, end))
        .filter(|slope| is_significant(slope, config))
        .collect();
    let retained_count = retained.len();

    let slopes = merge_bridged(
        merge_same_type(fill_gaps(&profile, retained)),
        config.max_bridge_distance,
    );

    debug!(
        "[Slopes] {} samples: {} runs, {} significant, {} slopes after merging",
        n,
        run_count,
        retained_count,
        slopes.len()
    );

    Ok(slopes)
}

/// Segment with [`SlopeConfig::default`].
pub fn list_slopes_default(stream: &Stream) -> Vec<Slope> {
    // The default configuration always validates.
    list_slopes(stream, &SlopeConfig::default()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsmoothed() -> SlopeConfig {
        SlopeConfig {
            smoothing_window: 0,
            ..SlopeConfig::default()
        }
    }

    /// 10 m spacing at 1 Hz with the given altitude per sample.
    fn profile_stream(altitude: Vec<f64>) -> Stream {
        let n = altitude.len();
        let distance: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
        Stream::new(distance, (0..n as i64).collect()).with_altitude(altitude)
    }

    /// Altitude built from `(samples, rise per sample)` legs.
    fn legs(parts: &[(usize, f64)]) -> Vec<f64> {
        let mut altitude = vec![0.0];
        for &(samples, rise) in parts {
            for _ in 0..samples {
                let last = *altitude.last().unwrap_or(&0.0);
                altitude.push(last + rise);
            }
        }
        altitude
    }

    fn assert_partition(slopes: &[Slope], n: usize) {
        assert_eq!(slopes.first().map(|s| s.start_index), Some(0));
        assert_eq!(slopes.last().map(|s| s.end_index), Some(n - 1));
        for pair in slopes.windows(2) {
            assert_eq!(pair[0].end_index, pair[1].start_index);
            assert_ne!(pair[0].slope_type, pair[1].slope_type);
        }
    }

    fn segment(kind: SlopeType, start: usize, end: usize, distance: f64, grade: f64) -> Slope {
        Slope {
            slope_type: kind,
            start_index: start,
            end_index: end,
            start_altitude: 0.0,
            end_altitude: 0.0,
            grade,
            max_grade: grade.abs(),
            distance,
            duration: (distance / 5.0) as u32,
            average_speed: 5.0,
        }
    }

    #[test]
    fn test_short_plateau_between_ascents_is_bridged() {
        let slopes = vec![
            segment(SlopeType::Ascent, 0, 60, 600.0, 5.0),
            segment(SlopeType::Plateau, 60, 80, 200.0, 0.0),
            segment(SlopeType::Ascent, 80, 140, 600.0, 5.0),
        ];
        let merged = merge_bridged(slopes, 500.0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].slope_type, SlopeType::Ascent);
        assert_eq!(merged[0].distance, 1400.0);
        assert_eq!((merged[0].start_index, merged[0].end_index), (0, 140));
        assert!((merged[0].grade - 6000.0 / 1400.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_plateau_is_not_bridged() {
        let slopes = vec![
            segment(SlopeType::Ascent, 0, 60, 600.0, 5.0),
            segment(SlopeType::Plateau, 60, 120, 600.0, 0.0),
            segment(SlopeType::Ascent, 120, 180, 600.0, 5.0),
        ];
        assert_eq!(merge_bridged(slopes, 500.0).len(), 3);
    }

    #[test]
    fn test_repeated_bridges_fold_into_one() {
        let slopes = vec![
            segment(SlopeType::Descent, 0, 60, 600.0, -6.0),
            segment(SlopeType::Ascent, 60, 70, 100.0, 4.0),
            segment(SlopeType::Descent, 70, 130, 600.0, -6.0),
            segment(SlopeType::Plateau, 130, 150, 200.0, 0.0),
            segment(SlopeType::Descent, 150, 210, 600.0, -6.0),
        ];
        let merged = merge_bridged(slopes, 500.0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].distance, 2100.0);
        assert_eq!(merged[0].slope_type, SlopeType::Descent);
    }

    #[test]
    fn test_merge_same_type_weights_by_distance() {
        let slopes = vec![
            segment(SlopeType::Ascent, 0, 10, 100.0, 10.0),
            segment(SlopeType::Ascent, 10, 40, 300.0, 2.0),
        ];
        let merged = merge_same_type(slopes);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].grade - 4.0).abs() < 1e-9);
        assert_eq!(merged[0].max_grade, 10.0);
        assert_eq!(merged[0].duration, 80);
    }

    #[test]
    fn test_two_climbs_with_short_flat_become_one() {
        let altitude = legs(&[(80, 0.6), (20, 0.0), (80, 0.6)]);
        let n = altitude.len();
        let slopes = list_slopes(&profile_stream(altitude), &unsmoothed()).unwrap();

        assert_eq!(slopes.len(), 1);
        let climb = &slopes[0];
        assert_eq!(climb.slope_type, SlopeType::Ascent);
        assert_eq!((climb.start_index, climb.end_index), (0, n - 1));
        assert!((climb.distance - 1800.0).abs() < 1e-9);
        assert!((climb.grade - 16.0 / 3.0).abs() < 1e-6);
        assert!((climb.max_grade - 6.0).abs() < 1e-6);
        assert_eq!(climb.duration, 180);
        assert!((climb.average_speed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_bump_is_absorbed_into_plateau() {
        let altitude = legs(&[(100, 0.0), (10, 1.0), (90, 0.0)]);
        let n = altitude.len();
        let slopes = list_slopes(&profile_stream(altitude), &unsmoothed()).unwrap();

        assert_eq!(slopes.len(), 1);
        assert_eq!(slopes[0].slope_type, SlopeType::Plateau);
        assert!((slopes[0].distance - 2000.0).abs() < 1e-9);
        assert_partition(&slopes, n);
    }

    #[test]
    fn test_easy_long_ascent_fails_climb_index() {
        // 1000 m at 3.3 %: index 3300 < 3500
        let altitude = legs(&[(60, 0.0), (100, 0.33), (60, 0.0)]);
        let slopes = list_slopes(&profile_stream(altitude), &unsmoothed()).unwrap();
        assert_eq!(slopes.len(), 1);
        assert_eq!(slopes[0].slope_type, SlopeType::Plateau);
    }

    #[test]
    fn test_smoothed_profile_segments() {
        let altitude = legs(&[(100, 0.0), (100, 0.6), (100, 0.0), (100, -0.6), (100, 0.0)]);
        let n = altitude.len();
        let slopes = list_slopes_default(&profile_stream(altitude));

        let kinds: Vec<SlopeType> = slopes.iter().map(|s| s.slope_type).collect();
        assert_eq!(
            kinds,
            vec![
                SlopeType::Plateau,
                SlopeType::Ascent,
                SlopeType::Plateau,
                SlopeType::Descent,
                SlopeType::Plateau
            ]
        );
        assert_partition(&slopes, n);

        let climb = &slopes[1];
        assert!((90..=110).contains(&climb.start_index));
        assert!((190..=210).contains(&climb.end_index));
        assert!(climb.grade > 4.0 && climb.grade < 7.0);
        assert!(slopes[3].grade < -4.0);
    }

    #[test]
    fn test_flat_ride_is_single_plateau() {
        let slopes = list_slopes_default(&profile_stream(vec![240.0; 50]));
        assert_eq!(slopes.len(), 1);
        assert_eq!(slopes[0].slope_type, SlopeType::Plateau);
        assert_eq!((slopes[0].start_index, slopes[0].end_index), (0, 49));
    }

    #[test]
    fn test_stopped_samples_stay_in_run() {
        // Repeated distance while stopped at the top of a climb
        let mut distance: Vec<f64> = (0..=120).map(|i| i as f64 * 10.0).collect();
        distance.splice(60..60, vec![590.0; 5]);
        let n = distance.len();
        let altitude: Vec<f64> = distance.iter().map(|d| d * 0.06).collect();
        let stream = Stream::new(distance, (0..n as i64).collect()).with_altitude(altitude);

        let slopes = list_slopes(&stream, &unsmoothed()).unwrap();
        assert_eq!(slopes.len(), 1);
        assert_eq!(slopes[0].slope_type, SlopeType::Ascent);
        assert_partition(&slopes, n);
    }

    #[test]
    fn test_missing_altitude_or_short_stream() {
        let no_altitude = Stream::new(vec![0.0, 10.0, 20.0], vec![0, 1, 2]);
        assert!(list_slopes_default(&no_altitude).is_empty());
        assert!(list_slopes_default(&profile_stream(vec![100.0])).is_empty());
        assert!(list_slopes_default(&Stream::default()).is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let config = SlopeConfig {
            grade_threshold: 0.0,
            ..SlopeConfig::default()
        };
        let stream = profile_stream(vec![0.0; 10]);
        assert!(matches!(
            list_slopes(&stream, &config),
            Err(AnalyticsError::InvalidConfig { .. })
        ));

        let config = SlopeConfig {
            max_bridge_distance: f64::NAN,
            ..SlopeConfig::default()
        };
        assert!(list_slopes(&stream, &config).is_err());
    }

    #[test]
    fn test_config_partial_json() {
        let config: SlopeConfig = serde_json::from_str(r#"{"grade_threshold": 4.0}"#).unwrap();
        assert_eq!(config.grade_threshold, 4.0);
        assert_eq!(config.smoothing_window, 20);
    }

    #[test]
    fn test_slope_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&SlopeType::Ascent).unwrap(), "\"ASCENT\"");
    }
}
