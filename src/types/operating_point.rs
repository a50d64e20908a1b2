//! Well operating point snapshot read from the attribute store

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key holding the artificial-lift method of a well.
pub const LIFT_TYPE_KEY: &str = "lift_type";
/// Key holding the 0–1 quality score of the latest measurements.
pub const DATA_QUALITY_KEY: &str = "data_quality";
/// Key holding the field a well belongs to.
pub const FIELD_ID_KEY: &str = "field_id";

/// Read-only snapshot of a well's latest numeric attributes and string tags.
///
/// Optimizers read every input through [`WellOperatingPoint::get_or`] so a
/// missing measurement falls back to the documented default instead of
/// failing the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellOperatingPoint {
    #[serde(default)]
    pub values: HashMap<String, f64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl WellOperatingPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style numeric attribute.
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// Builder-style string tag.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().filter(|v| v.is_finite())
    }

    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).unwrap_or(default)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Quality of the underlying measurements, 1.0 when not reported.
    pub fn data_quality(&self) -> f64 {
        self.get_or(DATA_QUALITY_KEY, 1.0).clamp(0.0, 1.0)
    }

    /// Whether this well is produced by continuous gas lift.
    ///
    /// Accepts a `lift_type` tag of `GAS_LIFT` or `GL` (any case), a numeric
    /// `lift_type` of 1, or no lift type at all with a gas injection rate.
    pub fn is_gas_lift(&self) -> bool {
        if let Some(tag) = self.tag(LIFT_TYPE_KEY) {
            return tag.eq_ignore_ascii_case("GAS_LIFT") || tag.eq_ignore_ascii_case("GL");
        }
        match self.get(LIFT_TYPE_KEY) {
            Some(code) => (code - 1.0).abs() < f64::EPSILON,
            None => self.get("gas_injection_rate").is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_defaults() {
        let point = WellOperatingPoint::new().with("frequency", 52.0);
        assert_eq!(point.get_or("frequency", 50.0), 52.0);
        assert_eq!(point.get_or("motor_load", 70.0), 70.0);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let point = WellOperatingPoint::new().with("pip", f64::NAN);
        assert_eq!(point.get("pip"), None);
        assert_eq!(point.get_or("pip", 200.0), 200.0);
    }

    #[test]
    fn test_gas_lift_detection() {
        assert!(WellOperatingPoint::new().with_tag(LIFT_TYPE_KEY, "gl").is_gas_lift());
        assert!(WellOperatingPoint::new().with_tag(LIFT_TYPE_KEY, "Gas_Lift").is_gas_lift());
        assert!(!WellOperatingPoint::new().with_tag(LIFT_TYPE_KEY, "ESP").is_gas_lift());
        assert!(WellOperatingPoint::new().with(LIFT_TYPE_KEY, 1.0).is_gas_lift());
        assert!(!WellOperatingPoint::new().with(LIFT_TYPE_KEY, 2.0).is_gas_lift());
        assert!(WellOperatingPoint::new()
            .with("gas_injection_rate", 400.0)
            .is_gas_lift());
        assert!(!WellOperatingPoint::new().with("frequency", 50.0).is_gas_lift());
    }

    #[test]
    fn test_data_quality_default_and_clamp() {
        assert_eq!(WellOperatingPoint::new().data_quality(), 1.0);
        assert_eq!(
            WellOperatingPoint::new().with(DATA_QUALITY_KEY, 1.7).data_quality(),
            1.0
        );
    }
}
