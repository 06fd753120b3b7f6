//! Unified error handling for the effort-analytics library.
//!
//! Only programmer errors surface here: a misconfigured target or threshold,
//! or provider JSON that cannot be decoded. Missing data (no stream, no
//! altitude, no power meter) is the normal case and is reported as `None`
//! by the scans, never as an error.

use std::fmt;

/// Unified error type for effort-analytics operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Scan target is at or below the minimum the scan accepts
    InvalidTarget {
        scan: &'static str,
        target: f64,
        minimum: f64,
    },
    /// Slope segmentation thresholds are not usable
    InvalidConfig { message: String },
    /// Provider stream or activity JSON could not be decoded
    Json { message: String },
}

impl fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyticsError::InvalidTarget {
                scan,
                target,
                minimum,
            } => {
                write!(
                    f,
                    "Invalid target for {}: {} must be > {}",
                    scan, target, minimum
                )
            }
            AnalyticsError::InvalidConfig { message } => {
                write!(f, "Configuration error: {}", message)
            }
            AnalyticsError::Json { message } => {
                write!(f, "JSON error: {}", message)
            }
        }
    }
}

impl std::error::Error for AnalyticsError {}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Json {
            message: err.to_string(),
        }
    }
}

/// Result type alias for effort-analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Reject targets that are not strictly above `minimum` (NaN included).
pub(crate) fn ensure_target_above(scan: &'static str, target: f64, minimum: f64) -> Result<()> {
    if target > minimum {
        Ok(())
    } else {
        Err(AnalyticsError::InvalidTarget {
            scan,
            target,
            minimum,
        })
    }
}
