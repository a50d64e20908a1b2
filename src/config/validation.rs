//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks for optimizer limits.
//!
//! Two-pass parse approach: the raw TOML is first walked as a `toml::Value`
//! and every key is compared against the known field names, emitting
//! warnings with "did you mean?" suggestions. Normal serde deserialization
//! follows. Unknown keys never break a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `EngineConfig`.
///
/// Must be kept in step with the struct hierarchy in engine_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [general]
        "general",
        "general.recommendation_expiry_hours",
        "general.auto_expire_recommendations",
        "general.min_data_quality",
        // [esp]
        "esp",
        "esp.min_frequency_change",
        "esp.max_frequency",
        "esp.min_frequency",
        "esp.target_motor_load",
        "esp.max_motor_temperature",
        // [gas_lift]
        "gas_lift",
        "gas_lift.max_total_gas_rate",
        "gas_lift.min_gas_per_well",
        "gas_lift.max_gas_per_well",
        "gas_lift.allocation_increment",
        "gas_lift.min_change_percent",
        // [pcp]
        "pcp",
        "pcp.min_rpm_change",
        "pcp.max_rpm",
        "pcp.min_rpm",
        "pcp.target_torque",
        "pcp.max_torque",
        "pcp.max_rod_load",
        "pcp.wear_factor_threshold",
        // [rod_pump]
        "rod_pump",
        "rod_pump.min_spm_change",
        "rod_pump.max_spm",
        "rod_pump.min_spm",
        "rod_pump.max_stroke",
        "rod_pump.min_stroke",
        "rod_pump.stroke_step",
        "rod_pump.target_fillage",
        "rod_pump.min_fillage",
        "rod_pump.max_peak_load",
        "rod_pump.max_rod_stress",
        "rod_pump.counterbalance_low",
        "rod_pump.counterbalance_high",
        // [decline]
        "decline",
        "decline.default_b_exponent",
    ];
    keys.iter().copied().collect()
}

/// Recursively walk a TOML value tree and collect all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed `EngineConfig`.
///
/// Returns (errors, warnings). Errors are impossible values that must be
/// rejected; warnings are suspicious but usable.
pub fn validate_physical_ranges(
    config: &super::EngineConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Motor load and torque targets are percentages of nameplate
    let esp = &config.esp;
    if !(0.0..=100.0).contains(&esp.target_motor_load) {
        errors.push(format!(
            "esp.target_motor_load = {:.1} is outside physical range (0-100 %)",
            esp.target_motor_load
        ));
    }
    let pcp = &config.pcp;
    if !(0.0..=100.0).contains(&pcp.target_torque) || !(0.0..=100.0).contains(&pcp.max_torque) {
        errors.push(format!(
            "pcp torque limits ({:.1}, {:.1}) must be within 0-100 %",
            pcp.target_torque, pcp.max_torque
        ));
    }

    let rp = &config.rod_pump;
    if !(0.0..=100.0).contains(&rp.target_fillage) || !(0.0..=100.0).contains(&rp.min_fillage) {
        errors.push(format!(
            "rod_pump fillage limits ({:.1}, {:.1}) must be within 0-100 %",
            rp.target_fillage, rp.min_fillage
        ));
    }
    if !(0.0..=100.0).contains(&rp.counterbalance_low)
        || !(0.0..=100.0).contains(&rp.counterbalance_high)
    {
        errors.push(format!(
            "rod_pump counterbalance band ({:.1}, {:.1}) must be within 0-100 %",
            rp.counterbalance_low, rp.counterbalance_high
        ));
    }

    if !(0.0..=1.0).contains(&config.general.min_data_quality) {
        errors.push(format!(
            "general.min_data_quality = {:.2} must be within 0-1",
            config.general.min_data_quality
        ));
    }

    // ESP drives above 70 Hz are unusual
    if esp.max_frequency > 70.0 {
        warnings.push(ValidationWarning {
            field: "esp.max_frequency".to_string(),
            message: format!(
                "max_frequency = {:.1} Hz is above the typical VSD range (30-70 Hz)",
                esp.max_frequency
            ),
            suggestion: None,
        });
    }

    if rp.max_spm > 20.0 {
        warnings.push(ValidationWarning {
            field: "rod_pump.max_spm".to_string(),
            message: format!(
                "max_spm = {:.1} is above the typical beam-pump range (1-20 SPM)",
                rp.max_spm
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("max_frequncy", "max_frequency"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [esp]
            max_frequency = 60.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"esp".to_string()));
        assert!(keys.contains(&"esp.max_frequency".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[rod_pump]
target_filage = 80.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("target_filage"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("rod_pump.target_fillage")
        );
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("completely_unrelated_section = 1\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].suggestion.is_none());
    }

    #[test]
    fn test_default_config_passes_range_checks() {
        let (errors, warnings) = validate_physical_ranges(&super::super::EngineConfig::default());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert!(warnings.is_empty());
    }
}
