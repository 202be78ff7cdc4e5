//! Unit conversions for upstream readings.

/// Kilometres per hour in one metre per second.
const KMH_PER_MPS: f64 = 3.6;

/// Convert a wind speed from metres per second to kilometres per hour.
pub fn meters_per_second_to_kmh(speed: f64) -> f64 {
    speed * KMH_PER_MPS
}

/// Convert a 0.0..=1.0 probability into a whole percentage, clamped to 0..=100.
pub fn probability_to_percent(probability: f64) -> u8 {
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_per_second_to_kmh() {
        assert_eq!(meters_per_second_to_kmh(0.0), 0.0);
        assert!((meters_per_second_to_kmh(10.0) - 36.0).abs() < 1e-9);
        assert!((meters_per_second_to_kmh(2.5) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_probability_to_percent() {
        assert_eq!(probability_to_percent(0.0), 0);
        assert_eq!(probability_to_percent(0.616), 62);
        assert_eq!(probability_to_percent(1.0), 100);
        assert_eq!(probability_to_percent(1.2), 100);
        assert_eq!(probability_to_percent(-0.1), 0);
    }
}
