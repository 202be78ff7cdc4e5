//! Forecast windowing: pick the next few buckets at or after "now".

use crate::types::ForecastSample;

/// Buckets covering roughly the next six hours of a 3-hour feed.
pub const NEXT_6H_BUCKETS: usize = 2;

/// Select up to `max_count` samples whose timestamp is at or after `now_unix`.
///
/// Samples are taken in input order (ascending by timestamp); earlier ones
/// are skipped, never reordered.
pub fn select_upcoming(
    samples: &[ForecastSample],
    now_unix: i64,
    max_count: usize,
) -> Vec<ForecastSample> {
    if max_count == 0 {
        return Vec::new();
    }

    samples
        .iter()
        .filter(|s| s.timestamp_unix >= now_unix)
        .take(max_count)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> ForecastSample {
        ForecastSample {
            timestamp_unix: ts,
            temperature_c: 20.0,
            precipitation_probability_pct: 0,
            wind_kmh: 5.0,
            rain_volume_mm: None,
        }
    }

    fn timestamps(samples: &[ForecastSample]) -> Vec<i64> {
        samples.iter().map(|s| s.timestamp_unix).collect()
    }

    #[test]
    fn test_skips_past_samples() {
        let samples: Vec<_> = [100, 200, 300, 400].into_iter().map(sample).collect();
        let picked = select_upcoming(&samples, 250, 2);
        assert_eq!(timestamps(&picked), vec![300, 400]);
    }

    #[test]
    fn test_includes_sample_at_now() {
        let samples: Vec<_> = [100, 200, 300].into_iter().map(sample).collect();
        let picked = select_upcoming(&samples, 200, 2);
        assert_eq!(timestamps(&picked), vec![200, 300]);
    }

    #[test]
    fn test_caps_at_max_count() {
        let samples: Vec<_> = (1..=10).map(|i| sample(i * 10_800)).collect();
        let picked = select_upcoming(&samples, 0, NEXT_6H_BUCKETS);
        assert_eq!(picked.len(), 2);
        assert_eq!(timestamps(&picked), vec![10_800, 21_600]);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_upcoming(&[], 0, 2).is_empty());
    }

    #[test]
    fn test_all_in_past() {
        let samples: Vec<_> = [100, 200].into_iter().map(sample).collect();
        assert!(select_upcoming(&samples, 1_000, 2).is_empty());
    }

    #[test]
    fn test_zero_max_count() {
        let samples: Vec<_> = [100, 200].into_iter().map(sample).collect();
        assert!(select_upcoming(&samples, 0, 0).is_empty());
    }

    #[test]
    fn test_input_untouched_and_order_preserved() {
        let samples: Vec<_> = [100, 200, 300, 400, 500].into_iter().map(sample).collect();
        let before = samples.clone();
        for now in [0, 150, 300, 450, 600] {
            for max in 0..7 {
                let picked = select_upcoming(&samples, now, max);
                assert!(picked.len() <= max);
                assert!(picked.iter().all(|s| s.timestamp_unix >= now));
                assert!(picked
                    .windows(2)
                    .all(|w| w[0].timestamp_unix < w[1].timestamp_unix));
            }
        }
        assert_eq!(samples, before);
    }
}
