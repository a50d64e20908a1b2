//! Confidence scoring and priority bands for lift recommendations

use crate::physics_engine::round_half_up;

/// Starting confidence for single-well optimizers.
pub(crate) const BASE_CONFIDENCE: f64 = 0.85;

/// Starting confidence for field-wide gas-lift allocation.
pub(crate) const BASE_ALLOCATION_CONFIDENCE: f64 = 0.8;

/// No recommendation is reported below this confidence.
pub(crate) const MIN_CONFIDENCE: f64 = 0.5;

/// Subtract each penalty whose condition holds, then floor at
/// [`MIN_CONFIDENCE`] and cap at 1.0.
///
/// ```ignore
/// let c = score_confidence(BASE_CONFIDENCE, &[(hot_motor, 0.1), (overloaded, 0.05)]);
/// ```
pub(crate) fn score_confidence(base: f64, penalties: &[(bool, f64)]) -> f64 {
    let score = penalties
        .iter()
        .filter(|(applies, _)| *applies)
        .fold(base, |acc, (_, penalty)| acc - penalty);
    round_half_up(score.clamp(MIN_CONFIDENCE, 1.0), 4)
}

/// Recommendation priority from the expected production increase (%).
///
/// 1 = act first. Bands use the absolute value, inclusive lower bounds:
/// ≥10 → 1, ≥5 → 2, ≥2 → 3, otherwise 4.
pub fn priority_for_percent(production_increase_percent: f64) -> u8 {
    let pct = production_increase_percent.abs();
    if pct >= 10.0 {
        1
    } else if pct >= 5.0 {
        2
    } else if pct >= 2.0 {
        3
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalties_applied_only_when_true() {
        let score = score_confidence(BASE_CONFIDENCE, &[(true, 0.1), (false, 0.3), (true, 0.05)]);
        assert!((score - 0.7).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_confidence_floor() {
        let score = score_confidence(BASE_CONFIDENCE, &[(true, 0.2), (true, 0.2), (true, 0.2)]);
        assert_eq!(score, MIN_CONFIDENCE);
    }

    #[test]
    fn test_priority_bands() {
        assert_eq!(priority_for_percent(12.0), 1);
        assert_eq!(priority_for_percent(10.0), 1);
        assert_eq!(priority_for_percent(-7.5), 2);
        assert_eq!(priority_for_percent(5.0), 2);
        assert_eq!(priority_for_percent(2.0), 3);
        assert_eq!(priority_for_percent(1.99), 4);
        assert_eq!(priority_for_percent(0.0), 4);
    }
}
