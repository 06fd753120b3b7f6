//! Recorded activity stream, shaped like the provider's stream payload.
//!
//! Every series arrives wrapped in an envelope (`data`, `original_size`,
//! `resolution`, `series_type`); only `data` is used by the algorithms.
//! Series are index-aligned but may differ in length, so every consumer
//! clamps to the shortest series it reads.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// One provider series with its envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct StreamSeries<T> {
    /// Samples; `null` entries in the payload decode as `T::default()`
    #[serde(default, deserialize_with = "nulls_as_default")]
    pub data: Vec<T>,
    #[serde(default)]
    pub original_size: usize,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub series_type: String,
}

impl<T> StreamSeries<T> {
    /// Wrap samples in a full-resolution envelope.
    pub fn new(data: Vec<T>) -> Self {
        Self {
            original_size: data.len(),
            data,
            resolution: "high".to_string(),
            series_type: "distance".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn nulls_as_default<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let raw: Vec<Option<T>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(Option::unwrap_or_default).collect())
}

/// Index-aligned samples recorded during one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stream {
    /// Cumulative distance in meters, non-decreasing
    #[serde(default)]
    pub distance: StreamSeries<f64>,
    /// Elapsed seconds since the start
    #[serde(default)]
    pub time: StreamSeries<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<StreamSeries<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<StreamSeries<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<StreamSeries<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<StreamSeries<bool>>,
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<StreamSeries<f64>>,
    /// Power in watts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watts: Option<StreamSeries<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_smooth: Option<StreamSeries<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_smooth: Option<StreamSeries<f64>>,
}

impl Stream {
    /// Create a stream from distance and time samples.
    pub fn new(distance: Vec<f64>, time: Vec<i64>) -> Self {
        Self {
            distance: StreamSeries::new(distance),
            time: StreamSeries::new(time),
            ..Default::default()
        }
    }

    pub fn with_altitude(mut self, altitude: Vec<f64>) -> Self {
        self.altitude = Some(StreamSeries::new(altitude));
        self
    }

    pub fn with_watts(mut self, watts: Vec<f64>) -> Self {
        self.watts = Some(StreamSeries::new(watts));
        self
    }

    pub fn with_latlng(mut self, latlng: Vec<[f64; 2]>) -> Self {
        self.latlng = Some(StreamSeries::new(latlng));
        self
    }

    pub fn with_heartrate(mut self, heartrate: Vec<i64>) -> Self {
        self.heartrate = Some(StreamSeries::new(heartrate));
        self
    }

    /// Parse a provider stream payload.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn distances(&self) -> &[f64] {
        &self.distance.data
    }

    pub fn times(&self) -> &[i64] {
        &self.time.data
    }

    /// Altitude samples, or `None` when the activity has no usable altitude.
    pub fn altitudes(&self) -> Option<&[f64]> {
        self.altitude
            .as_ref()
            .map(|s| s.data.as_slice())
            .filter(|data| !data.is_empty())
    }

    /// Power samples, or `None` when no power meter was recording.
    pub fn watts(&self) -> Option<&[f64]> {
        self.watts
            .as_ref()
            .map(|s| s.data.as_slice())
            .filter(|data| !data.is_empty())
    }

    /// Number of samples shared by the distance and time series.
    pub fn len(&self) -> usize {
        self.distance.len().min(self.time.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_payload_with_null_watts() {
        let json = r#"{
            "distance": {"data": [0.0, 5.2, 10.1], "original_size": 3, "resolution": "high", "series_type": "distance"},
            "time": {"data": [0, 1, 2], "original_size": 3, "resolution": "high", "series_type": "distance"},
            "latlng": {"data": [[45.1, 5.7], [45.1001, 5.7001], [45.1002, 5.7002]], "original_size": 3, "resolution": "high", "series_type": "distance"},
            "moving": {"data": [false, true, true], "original_size": 3, "resolution": "high", "series_type": "distance"},
            "altitude": {"data": [210.0, 210.4, 210.9], "original_size": 3, "resolution": "high", "series_type": "distance"},
            "watts": {"data": [null, 180, 195], "original_size": 3, "resolution": "high", "series_type": "distance"}
        }"#;

        let stream = Stream::from_json(json).unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.watts(), Some(&[0.0, 180.0, 195.0][..]));
        assert_eq!(stream.altitudes().map(|a| a.len()), Some(3));
        assert_eq!(stream.latlng.as_ref().map(|s| s.data[1]), Some([45.1001, 5.7001]));
        assert!(stream.heartrate.is_none());
    }

    #[test]
    fn test_empty_optional_series_is_unavailable() {
        let stream = Stream::new(vec![0.0, 10.0], vec![0, 1])
            .with_altitude(Vec::new())
            .with_watts(Vec::new());
        assert!(stream.altitudes().is_none());
        assert!(stream.watts().is_none());
    }

    #[test]
    fn test_len_uses_shortest_of_distance_and_time() {
        let stream = Stream::new(vec![0.0, 10.0, 20.0], vec![0, 1]);
        assert_eq!(stream.len(), 2);
        assert!(!stream.is_empty());
        assert!(Stream::default().is_empty());
    }

    #[test]
    fn test_series_envelope() {
        let series = StreamSeries::new(vec![1.0, 2.0]);
        assert_eq!(series.original_size, 2);
        assert_eq!(series.resolution, "high");
    }

    #[test]
    fn test_malformed_payload_is_json_error() {
        let err = Stream::from_json("{\"distance\": 3}").unwrap_err();
        assert!(matches!(err, crate::AnalyticsError::Json { .. }));
    }
}
