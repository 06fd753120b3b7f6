//! # Effort Analytics
//!
//! Best-effort, slope and Eddington analytics over recorded activity streams.
//!
//! This library provides:
//! - Sliding-window best efforts (fastest time for a distance, longest
//!   distance in a duration, best average power, steepest climb)
//! - Cross-activity aggregation of best efforts
//! - Slope segmentation of an elevation profile into ascents, descents and
//!   plateaus
//! - The Eddington number of an activity history
//! - Per-sport statistic tables built on the above
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel aggregation with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use effort_analytics::{best_time_for_distance, Stream};
//!
//! // 2 km at a steady 5 m/s, one sample per second
//! let distance: Vec<f64> = (0..=400).map(|i| i as f64 * 5.0).collect();
//! let time: Vec<i64> = (0..=400).collect();
//! let altitude = vec![120.0; 401];
//!
//! let stream = Stream::new(distance, time).with_altitude(altitude);
//!
//! let effort = best_time_for_distance(&stream, 1000.0)
//!     .expect("valid target")
//!     .expect("stream long enough");
//! assert_eq!(effort.seconds, 200);
//! println!("{}: {}", effort.label, effort.formatted_speed());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// Unified error handling
pub mod error;
pub use error::{AnalyticsError, Result};

// Provider stream model
pub mod stream;
pub use stream::{Stream, StreamSeries};

// Centered moving average
pub mod smoothing;
pub use smoothing::smooth;

// Sliding-window best efforts over a single stream
pub mod efforts;
pub use efforts::{
    best_distance_for_time, best_elevation_for_distance, best_power_for_time,
    best_time_for_distance, Effort, EffortScan,
};

// Best effort across an activity history
pub mod aggregate;
pub use aggregate::find_best;
#[cfg(feature = "parallel")]
pub use aggregate::find_best_parallel;

// Elevation profile segmentation
pub mod slopes;
pub use slopes::{list_slopes, list_slopes_default, Slope, SlopeConfig, SlopeType};

// Eddington number
pub mod eddington;
pub use eddington::{compute_eddington, EddingtonResult};

// Statistic tables per sport
pub mod statistics;
pub use statistics::{
    compute_statistics, statistics_for, DayMetric, GlobalMetric, RecordMetric, Statistic,
    StatisticResult,
};

// Effort list for a single activity
pub mod activity_efforts;
pub use activity_efforts::build_activity_efforts;

// Presentation helpers
pub mod format;
pub use format::{format_pace, format_seconds};

// ============================================================================
// Core Types
// ============================================================================

/// Sport type reported by the activity provider.
///
/// Unknown provider values deserialize to [`ActivityType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActivityType {
    Run,
    TrailRun,
    Ride,
    GravelRide,
    MountainBikeRide,
    VirtualRide,
    Commute,
    InlineSkate,
    Hike,
    AlpineSki,
    #[default]
    #[serde(other)]
    Other,
}

impl ActivityType {
    /// Provider name of this sport type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Run => "Run",
            ActivityType::TrailRun => "TrailRun",
            ActivityType::Ride => "Ride",
            ActivityType::GravelRide => "GravelRide",
            ActivityType::MountainBikeRide => "MountainBikeRide",
            ActivityType::VirtualRide => "VirtualRide",
            ActivityType::Commute => "Commute",
            ActivityType::InlineSkate => "InlineSkate",
            ActivityType::Hike => "Hike",
            ActivityType::AlpineSki => "AlpineSki",
            ActivityType::Other => "Other",
        }
    }

    /// Running sports express speed as a pace per kilometre.
    pub fn is_running(&self) -> bool {
        matches!(self, ActivityType::Run | ActivityType::TrailRun)
    }
}

impl From<&str> for ActivityType {
    fn from(value: &str) -> Self {
        match value {
            "Run" => ActivityType::Run,
            "TrailRun" => ActivityType::TrailRun,
            "Ride" => ActivityType::Ride,
            "GravelRide" => ActivityType::GravelRide,
            "MountainBikeRide" => ActivityType::MountainBikeRide,
            "VirtualRide" => ActivityType::VirtualRide,
            "Commute" => ActivityType::Commute,
            "InlineSkate" => ActivityType::InlineSkate,
            "Hike" => ActivityType::Hike,
            "AlpineSki" => ActivityType::AlpineSki,
            _ => ActivityType::Other,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the activity an effort was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityShort {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
}

/// A recorded activity with its summary fields and optional stream.
///
/// Deserializes from the provider's activity JSON; the stream is attached
/// separately since the provider serves it from another endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Activity {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    /// Total distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: u32,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: u32,
    /// Total elevation gain in meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    /// Highest altitude reached in meters
    #[serde(default)]
    pub elev_high: f64,
    /// Top speed in m/s
    #[serde(default)]
    pub max_speed: f64,
    /// Local start time, e.g. `2024-03-17T09:12:44Z`
    #[serde(default)]
    pub start_date_local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<Stream>,
}

impl Activity {
    /// Create an activity without a stream.
    pub fn new(id: i64, name: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            id,
            name: name.into(),
            activity_type,
            ..Default::default()
        }
    }

    /// Attach a recorded stream.
    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Identity used to tag efforts found in this activity.
    pub fn short(&self) -> ActivityShort {
        ActivityShort {
            id: self.id,
            name: self.name.clone(),
            activity_type: self.activity_type,
        }
    }

    /// Parse a provider activity from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
