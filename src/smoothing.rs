//! Centered moving average used to denoise altitude and distance samples
//! before slope classification.

/// Centered moving average with half-width `window`.
///
/// Element `i` is the mean of `data[i - window ..= i + window]`, truncated
/// at both edges. A `window` of 0 or 1, or empty input, returns a copy.
/// Runs in O(n) regardless of `window` using prefix sums.
pub fn smooth(data: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || data.is_empty() {
        return data.to_vec();
    }

    let n = data.len();
    let mut prefix = Vec::with_capacity(n + 1);
    let mut running = 0.0;
    prefix.push(running);
    for &value in data {
        running += value;
        prefix.push(running);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(window);
            let hi = (i + window + 1).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_smooth(data: &[f64], window: usize) -> Vec<f64> {
        (0..data.len())
            .map(|i| {
                let lo = i.saturating_sub(window);
                let hi = (i + window).min(data.len() - 1);
                let slice = &data[lo..=hi];
                slice.iter().sum::<f64>() / slice.len() as f64
            })
            .collect()
    }

    #[test]
    fn test_small_window_is_identity() {
        let data = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(smooth(&data, 0), data);
        assert_eq!(smooth(&data, 1), data);
        assert!(smooth(&[], 5).is_empty());
    }

    #[test]
    fn test_edges_are_truncated() {
        let smoothed = smooth(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(smoothed, vec![2.0, 2.5, 3.0, 3.5, 4.0]);
    }

    #[test]
    fn test_window_wider_than_data() {
        let smoothed = smooth(&[2.0, 4.0, 6.0], 10);
        assert_eq!(smoothed, vec![4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_matches_naive_average() {
        let data: Vec<f64> = (0..300)
            .map(|i| 200.0 + (i as f64 * 0.37).sin() * 15.0 + (i % 7) as f64)
            .collect();
        for window in [2, 5, 20, 50] {
            let fast = smooth(&data, window);
            let slow = naive_smooth(&data, window);
            for (a, b) in fast.iter().zip(&slow) {
                assert!((a - b).abs() < 1e-9, "window {}: {} vs {}", window, a, b);
            }
        }
    }

    #[test]
    fn test_constant_signal_unchanged() {
        let data = vec![150.0; 64];
        assert_eq!(smooth(&data, 20), data);
    }
}
