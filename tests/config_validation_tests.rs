//! Config Validation Tests
//!
//! Typo detection, range validation and file round-trips for
//! `EngineConfig`, exercised through the public API only.

use std::io::Write;

use reservoir_optimizer::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use reservoir_optimizer::config::{ConfigError, EngineConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_esp_section_warns_with_suggestion() {
    let toml_str = r#"
[esp]
max_frequncy = 62.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("max_frequncy"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("esp.max_frequency"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn misspelled_section_is_reported() {
    let warnings = validate_unknown_keys("[gas_lfit]\nmin_gas_per_well = 40.0\n");
    assert!(warnings.iter().any(|w| w.field == "gas_lfit"));
    assert!(warnings
        .iter()
        .any(|w| w.suggestion.as_deref() == Some("gas_lift")));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[general]
recommendation_expiry_hours = 12
min_data_quality = 0.7

[esp]
min_frequency = 35.0
max_frequency = 58.0

[rod_pump]
target_fillage = 80.0
stroke_step = 6.0

[decline]
default_b_exponent = 0.4
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn far_away_key_has_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("completely_unrelated", &known).is_none());
    assert_eq!(
        suggest_correction("pcp.max_rmp", &known).as_deref(),
        Some("pcp.max_rpm")
    );
}

#[test]
fn unknown_keys_do_not_break_loading() {
    let config = EngineConfig::from_toml_str("[esp]\nmax_frequncy = 62.0\n").unwrap();
    assert_eq!(config, EngineConfig::default());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn inverted_bounds_are_rejected() {
    let toml_str = r#"
[esp]
min_frequency = 60.0
max_frequency = 30.0
"#;
    match EngineConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(
                errors.iter().any(|e| e.starts_with("esp.frequency")),
                "errors: {errors:?}"
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn every_problem_is_collected() {
    let toml_str = r#"
[pcp]
target_torque = 95.0
max_torque = 90.0

[rod_pump]
counterbalance_low = 60.0
counterbalance_high = 50.0

[decline]
default_b_exponent = 1.0
"#;
    let Err(ConfigError::Validation(errors)) = EngineConfig::from_toml_str(toml_str) else {
        panic!("expected validation errors");
    };
    assert!(errors.iter().any(|e| e.contains("target_torque")));
    assert!(errors.iter().any(|e| e.contains("counterbalance")));
    assert!(errors.iter().any(|e| e.contains("default_b_exponent")));
}

#[test]
fn non_finite_limits_are_rejected() {
    let mut config = EngineConfig::default();
    config.gas_lift.max_gas_per_well = f64::NAN;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("must be finite"));
}

#[test]
fn data_quality_floor_must_be_a_fraction() {
    let mut config = EngineConfig::default();
    config.general.min_data_quality = 1.5;
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("min_data_quality"));
}

#[test]
fn high_vsd_frequency_only_warns() {
    let mut config = EngineConfig::default();
    config.esp.max_frequency = 75.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "esp.max_frequency");
    assert!(config.validate().is_ok());
}

// ============================================================================
// File Round-Trips
// ============================================================================

#[test]
fn save_and_reload_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optimizer_config.toml");

    let mut config = EngineConfig::default();
    config.esp.target_motor_load = 72.5;
    config.gas_lift.max_total_gas_rate = 6000.0;
    config.decline.default_b_exponent = 0.3;
    config.save_to_file(&path).unwrap();

    let reloaded = EngineConfig::load_from_file(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn partial_file_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pcp]\nmax_rpm = 400.0").unwrap();

    let config = EngineConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.pcp.max_rpm, 400.0);
    assert_eq!(config.pcp.min_rpm, 50.0);
    assert_eq!(config.esp, EngineConfig::default().esp);
}

#[test]
fn parse_error_names_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[esp\nmax_frequency = ").unwrap();

    let err = EngineConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err
        .to_string()
        .contains(&file.path().display().to_string()));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}
