//! Presentation helpers for durations, pace, speed and gradient.

/// Format a duration as zero-padded hours, minutes and seconds.
///
/// Leading zero units are dropped and a whole number of hours renders as
/// just the hours:
///
/// ```
/// use effort_analytics::format_seconds;
/// assert_eq!(format_seconds(59), "59s");
/// assert_eq!(format_seconds(125), "02m 05s");
/// assert_eq!(format_seconds(3725), "01h 02m 05s");
/// assert_eq!(format_seconds(7200), "2h");
/// ```
pub fn format_seconds(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        if minutes == 0 && secs == 0 {
            format!("{}h", hours)
        } else {
            format!("{:02}h {:02}m {:02}s", hours, minutes, secs)
        }
    } else if minutes > 0 {
        format!("{:02}m {:02}s", minutes, secs)
    } else {
        format!("{:02}s", secs)
    }
}

/// Format a pace given in seconds per kilometre as `m'ss`.
pub fn format_pace(seconds_per_km: f64) -> String {
    if !seconds_per_km.is_finite() || seconds_per_km < 0.0 {
        return "0'00".to_string();
    }
    let total = seconds_per_km as u64;
    format!("{}'{:02}", total / 60, total % 60)
}

/// Speed in km/h for a distance in meters covered in `seconds`.
pub(crate) fn speed_kmh(distance: f64, seconds: u32) -> f64 {
    if seconds == 0 {
        0.0
    } else {
        distance / seconds as f64 * 3.6
    }
}

/// Grade in percent of an elevation change over a distance.
pub(crate) fn grade_percent(delta_altitude: f64, distance: f64) -> f64 {
    if distance > 0.0 {
        100.0 * delta_altitude / distance
    } else {
        0.0
    }
}
