//! Best effort across an activity history.
//!
//! Every activity with a stream is scanned independently and the results
//! are folded with the scan's ordering. Ties keep the earlier activity, so
//! the parallel reduction returns exactly what the sequential fold does.

use log::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::efforts::{Effort, EffortScan};
use crate::error::Result;
use crate::Activity;

/// Keep the better of two `(activity index, effort)` candidates.
///
/// Associative and commutative: a strictly better effort wins, otherwise the
/// lower activity index does.
fn pick_best(
    scan: &EffortScan,
    a: Option<(usize, Effort)>,
    b: Option<(usize, Effort)>,
) -> Option<(usize, Effort)> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => {
            if scan.is_better(&b.1, &a.1) {
                Some(b)
            } else if scan.is_better(&a.1, &b.1) || a.0 < b.0 {
                Some(a)
            } else {
                Some(b)
            }
        }
    }
}

/// Find the best effort for `scan` among `activities`.
///
/// The target is validated once up front. Activities without a stream are
/// skipped. The returned effort is tagged with the activity it came from.
///
/// # Example
/// ```
/// use effort_analytics::{find_best, Activity, ActivityType, EffortScan, Stream};
///
/// let stream = Stream::new((0..=120).map(|i| i as f64 * 8.0).collect(), (0..=120).collect())
///     .with_altitude(vec![10.0; 121]);
/// let activities = vec![Activity::new(1, "Lunch ride", ActivityType::Ride).with_stream(stream)];
///
/// let best = find_best(&activities, EffortScan::BestDistanceForTime(60)).unwrap();
/// assert_eq!(best.map(|e| e.distance), Some(480.0));
/// ```
pub fn find_best(activities: &[Activity], scan: EffortScan) -> Result<Option<Effort>> {
    scan.validate()?;

    let mut best = None;
    for (index, activity) in activities.iter().enumerate() {
        let candidate = scan.evaluate(activity)?.map(|effort| (index, effort));
        best = pick_best(&scan, best, candidate);
    }

    if let Some((index, effort)) = &best {
        info!(
            "[Aggregate] {} over {} activities: activity #{} ({})",
            scan.name(),
            activities.len(),
            index,
            effort.label
        );
    }

    Ok(best.map(|(_, effort)| effort))
}

/// Find the best effort for `scan` among `activities` using parallel processing.
///
/// Returns the same effort as [`find_best`].
#[cfg(feature = "parallel")]
pub fn find_best_parallel(activities: &[Activity], scan: EffortScan) -> Result<Option<Effort>> {
    if activities.len() < 10 {
        return find_best(activities, scan);
    }

    scan.validate()?;

    let candidates: Vec<Option<(usize, Effort)>> = activities
        .par_iter()
        .enumerate()
        .map(|(index, activity)| {
            scan.evaluate(activity)
                .map(|found| found.map(|effort| (index, effort)))
        })
        .collect::<Result<Vec<_>>>()?;

    let best = candidates
        .into_par_iter()
        .reduce(|| None, |a, b| pick_best(&scan, a, b));

    if let Some((index, effort)) = &best {
        info!(
            "[Aggregate] {} over {} activities (parallel): activity #{} ({})",
            scan.name(),
            activities.len(),
            index,
            effort.label
        );
    }

    Ok(best.map(|(_, effort)| effort))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityType, AnalyticsError, Stream};

    /// 1 Hz activity at a constant speed.
    fn steady(id: i64, speed: f64, samples: usize) -> Activity {
        let distance: Vec<f64> = (0..samples).map(|i| i as f64 * speed).collect();
        let time: Vec<i64> = (0..samples as i64).collect();
        let stream = Stream::new(distance, time)
            .with_altitude(vec![100.0; samples])
            .with_watts(vec![speed * 30.0; samples]);
        Activity::new(id, format!("Ride {}", id), ActivityType::Ride).with_stream(stream)
    }

    #[test]
    fn test_find_best_time_picks_fastest() {
        let activities = vec![steady(1, 5.0, 600), steady(2, 10.0, 600), steady(3, 8.0, 600)];
        let best = find_best(&activities, EffortScan::BestTimeForDistance(1000.0))
            .unwrap()
            .unwrap();
        assert_eq!(best.activity.unwrap().id, 2);
        assert_eq!(best.seconds, 100);
    }

    #[test]
    fn test_find_best_power_and_distance() {
        let activities = vec![steady(1, 5.0, 600), steady(2, 7.0, 600)];

        let power = find_best(&activities, EffortScan::BestPowerForTime(60))
            .unwrap()
            .unwrap();
        assert_eq!(power.activity.unwrap().id, 2);
        assert_eq!(power.average_power, Some(210.0));

        let distance = find_best(&activities, EffortScan::BestDistanceForTime(120))
            .unwrap()
            .unwrap();
        assert_eq!(distance.activity.unwrap().id, 2);
    }

    #[test]
    fn test_ties_keep_first_activity() {
        let activities = vec![steady(1, 6.0, 400), steady(2, 6.0, 400)];
        let best = find_best(&activities, EffortScan::BestElevationForDistance(500.0))
            .unwrap()
            .unwrap();
        assert_eq!(best.activity.unwrap().id, 1);
    }

    #[test]
    fn test_skips_activities_without_stream() {
        let activities = vec![
            Activity::new(1, "Manual", ActivityType::Ride),
            steady(2, 5.0, 400),
        ];
        let best = find_best(&activities, EffortScan::BestTimeForDistance(1000.0))
            .unwrap()
            .unwrap();
        assert_eq!(best.activity.unwrap().id, 2);
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(find_best(&[], EffortScan::BestPowerForTime(60)).unwrap(), None);
    }

    #[test]
    fn test_invalid_target_rejected_before_scanning() {
        let result = find_best(&[], EffortScan::BestTimeForDistance(80.0));
        assert!(matches!(result, Err(AnalyticsError::InvalidTarget { .. })));
    }

    #[test]
    fn test_pick_best_is_order_independent() {
        let scan = EffortScan::BestTimeForDistance(1000.0);
        let a = steady(1, 6.0, 400);
        let b = steady(2, 6.0, 400);
        let ea = scan.evaluate(&a).unwrap().map(|e| (0, e));
        let eb = scan.evaluate(&b).unwrap().map(|e| (1, e));
        let left = pick_best(&scan, ea.clone(), eb.clone()).map(|(i, _)| i);
        let right = pick_best(&scan, eb, ea).map(|(i, _)| i);
        assert_eq!(left, Some(0));
        assert_eq!(left, right);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let activities: Vec<Activity> = (0..24)
            .map(|i| steady(i, 4.0 + (i % 5) as f64, 500))
            .collect();
        for scan in [
            EffortScan::BestTimeForDistance(1000.0),
            EffortScan::BestDistanceForTime(60),
            EffortScan::BestPowerForTime(30),
            EffortScan::BestElevationForDistance(200.0),
        ] {
            assert_eq!(
                find_best(&activities, scan).unwrap(),
                find_best_parallel(&activities, scan).unwrap()
            );
        }
    }
}
