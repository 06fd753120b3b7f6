//! Effort list shown for a single activity: its significant climbs followed
//! by its best efforts over standard targets.

use log::debug;

use crate::efforts::{Effort, EffortScan};
use crate::error::Result;
use crate::slopes::{list_slopes, SlopeConfig, SlopeType};
use crate::Activity;

/// Standard best efforts computed for every activity, in display order.
pub const STANDARD_ACTIVITY_SCANS: &[EffortScan] = &[
    EffortScan::BestTimeForDistance(1000.0),
    EffortScan::BestTimeForDistance(5000.0),
    EffortScan::BestTimeForDistance(10000.0),
    EffortScan::BestDistanceForTime(3600),
    EffortScan::BestElevationForDistance(500.0),
    EffortScan::BestElevationForDistance(1000.0),
    EffortScan::BestElevationForDistance(10000.0),
];

/// Build the effort list of one activity.
///
/// Ascent slopes come first, numbered from 1 in profile order, followed by
/// whichever [`STANDARD_ACTIVITY_SCANS`] the stream supports. An activity
/// without a stream has no efforts.
pub fn build_activity_efforts(activity: &Activity, config: &SlopeConfig) -> Result<Vec<Effort>> {
    let Some(stream) = activity.stream.as_ref() else {
        return Ok(Vec::new());
    };

    let mut efforts: Vec<Effort> = list_slopes(stream, config)?
        .into_iter()
        .filter(|slope| slope.slope_type == SlopeType::Ascent)
        .enumerate()
        .map(|(i, slope)| Effort {
            distance: slope.distance,
            seconds: slope.duration,
            delta_altitude: slope.end_altitude - slope.start_altitude,
            idx_start: slope.start_index,
            idx_end: slope.end_index,
            average_power: None,
            label: format!("Slope {} - max {:.1} %", i + 1, slope.max_grade),
            activity: Some(activity.short()),
        })
        .collect();
    let climbs = efforts.len();

    for scan in STANDARD_ACTIVITY_SCANS {
        if let Some(effort) = scan.evaluate(activity)? {
            efforts.push(effort);
        }
    }

    debug!(
        "[Efforts] Activity {}: {} climbs, {} efforts",
        activity.id,
        climbs,
        efforts.len()
    );

    Ok(efforts)
}
