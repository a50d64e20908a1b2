//! Engine Configuration - optimizer limits and model defaults as TOML values
//!
//! Every optimizer bound, target and significance threshold lives in this
//! module. Each section implements `Default` with the field-proven values,
//! so a missing config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "RESERVOIR_OPT_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "optimizer_config.toml";

/// Root configuration passed to every optimizer and model call.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$RESERVOIR_OPT_CONFIG` env var
/// 2. `./optimizer_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Recommendation lifecycle and data-quality gate
    #[serde(default)]
    pub general: GeneralConfig,

    /// ESP frequency optimizer
    #[serde(default)]
    pub esp: EspConfig,

    /// Gas-lift allocation optimizer
    #[serde(default)]
    pub gas_lift: GasLiftConfig,

    /// PCP speed optimizer
    #[serde(default)]
    pub pcp: PcpConfig,

    /// Rod-pump speed/stroke optimizer
    #[serde(default)]
    pub rod_pump: RodPumpConfig,

    /// Decline-curve defaults
    #[serde(default)]
    pub decline: DeclineConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$RESERVOIR_OPT_CONFIG` environment variable
    /// 2. `./optimizer_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded optimizer config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded optimizer config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Optimizer config saved");
        Ok(())
    }

    /// Validate all limits for internal consistency.
    ///
    /// Rules:
    /// - Every value must be finite
    /// - Lower bounds must be strictly below upper bounds
    /// - Targets must sit inside their bounds
    /// - Minimum-change thresholds must be positive
    /// - The default hyperbolic exponent must lie in (0, 1)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let esp = &self.esp;
        Self::check_bounds(esp.min_frequency, esp.max_frequency, "esp.frequency", &mut errors);
        Self::check_positive(esp.min_frequency_change, "esp.min_frequency_change", &mut errors);
        Self::check_positive(esp.max_motor_temperature, "esp.max_motor_temperature", &mut errors);

        let gl = &self.gas_lift;
        Self::check_bounds(gl.min_gas_per_well, gl.max_gas_per_well, "gas_lift.gas_per_well", &mut errors);
        Self::check_positive(gl.max_total_gas_rate, "gas_lift.max_total_gas_rate", &mut errors);
        Self::check_positive(gl.allocation_increment, "gas_lift.allocation_increment", &mut errors);
        Self::check_positive(gl.min_change_percent, "gas_lift.min_change_percent", &mut errors);

        let pcp = &self.pcp;
        Self::check_bounds(pcp.min_rpm, pcp.max_rpm, "pcp.rpm", &mut errors);
        Self::check_positive(pcp.min_rpm_change, "pcp.min_rpm_change", &mut errors);
        Self::check_positive(pcp.max_rod_load, "pcp.max_rod_load", &mut errors);
        if pcp.target_torque > pcp.max_torque {
            errors.push(format!(
                "pcp.target_torque ({:.1}) must be <= max_torque ({:.1})",
                pcp.target_torque, pcp.max_torque
            ));
        }

        let rp = &self.rod_pump;
        Self::check_bounds(rp.min_spm, rp.max_spm, "rod_pump.spm", &mut errors);
        Self::check_bounds(rp.min_stroke, rp.max_stroke, "rod_pump.stroke", &mut errors);
        Self::check_bounds(
            rp.counterbalance_low,
            rp.counterbalance_high,
            "rod_pump.counterbalance",
            &mut errors,
        );
        Self::check_positive(rp.min_spm_change, "rod_pump.min_spm_change", &mut errors);
        Self::check_positive(rp.max_peak_load, "rod_pump.max_peak_load", &mut errors);
        Self::check_positive(rp.max_rod_stress, "rod_pump.max_rod_stress", &mut errors);
        Self::check_positive(rp.target_fillage, "rod_pump.target_fillage", &mut errors);
        if rp.min_fillage > rp.target_fillage {
            errors.push(format!(
                "rod_pump.min_fillage ({:.1}) must be <= target_fillage ({:.1})",
                rp.min_fillage, rp.target_fillage
            ));
        }

        let b = self.decline.default_b_exponent;
        if !(b > 0.0 && b < 1.0) {
            errors.push(format!(
                "decline.default_b_exponent ({b}) must be strictly between 0 and 1"
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_bounds(min: f64, max: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, catch them explicitly
        if !min.is_finite() || !max.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got min={min}, max={max})"
            ));
            return;
        }
        if min >= max {
            errors.push(format!("{name}: min ({min:.3}) must be < max ({max:.3})"));
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !(value.is_finite() && value > 0.0) {
            errors.push(format!("{name} must be a positive finite number (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "Config parse error ({}): {}", path.display(), e),
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// General
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Hours until a pending recommendation expires
    #[serde(default = "default_expiry_hours")]
    pub recommendation_expiry_hours: u32,

    /// Stamp an expiry time on new recommendations
    #[serde(default = "default_true")]
    pub auto_expire_recommendations: bool,

    /// Operating points reporting `data_quality` below this are skipped (0-1)
    #[serde(default = "default_min_data_quality")]
    pub min_data_quality: f64,
}

fn default_expiry_hours() -> u32 { 24 }
fn default_true() -> bool { true }
fn default_min_data_quality() -> f64 { 0.8 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            recommendation_expiry_hours: default_expiry_hours(),
            auto_expire_recommendations: default_true(),
            min_data_quality: default_min_data_quality(),
        }
    }
}

// ============================================================================
// ESP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EspConfig {
    /// Smallest frequency change worth recommending (Hz)
    #[serde(default = "default_min_frequency_change")]
    pub min_frequency_change: f64,

    /// VSD upper bound (Hz)
    #[serde(default = "default_max_frequency")]
    pub max_frequency: f64,

    /// VSD lower bound (Hz)
    #[serde(default = "default_min_frequency")]
    pub min_frequency: f64,

    /// Motor load the optimizer steers toward (% of nameplate)
    #[serde(default = "default_target_motor_load")]
    pub target_motor_load: f64,

    /// Motor winding temperature limit (°F)
    #[serde(default = "default_max_motor_temperature")]
    pub max_motor_temperature: f64,
}

fn default_min_frequency_change() -> f64 { 0.5 }
fn default_max_frequency() -> f64 { 60.0 }
fn default_min_frequency() -> f64 { 30.0 }
fn default_target_motor_load() -> f64 { 75.0 }
fn default_max_motor_temperature() -> f64 { 280.0 }

impl Default for EspConfig {
    fn default() -> Self {
        Self {
            min_frequency_change: default_min_frequency_change(),
            max_frequency: default_max_frequency(),
            min_frequency: default_min_frequency(),
            target_motor_load: default_target_motor_load(),
            max_motor_temperature: default_max_motor_temperature(),
        }
    }
}

// ============================================================================
// Gas Lift
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasLiftConfig {
    /// Field-wide injection gas ceiling (MSCF/day)
    #[serde(default = "default_max_total_gas_rate")]
    pub max_total_gas_rate: f64,

    /// Per-well floor (MSCF/day)
    #[serde(default = "default_min_gas_per_well")]
    pub min_gas_per_well: f64,

    /// Per-well ceiling (MSCF/day)
    #[serde(default = "default_max_gas_per_well")]
    pub max_gas_per_well: f64,

    /// Size of each incremental allocation (MSCF/day)
    #[serde(default = "default_allocation_increment")]
    pub allocation_increment: f64,

    /// Minimum |Δgas| / current gas (%) to emit a recommendation
    #[serde(default = "default_gl_min_change_percent")]
    pub min_change_percent: f64,
}

fn default_max_total_gas_rate() -> f64 { 10_000.0 }
fn default_min_gas_per_well() -> f64 { 50.0 }
fn default_max_gas_per_well() -> f64 { 2_000.0 }
fn default_allocation_increment() -> f64 { 50.0 }
fn default_gl_min_change_percent() -> f64 { 5.0 }

impl Default for GasLiftConfig {
    fn default() -> Self {
        Self {
            max_total_gas_rate: default_max_total_gas_rate(),
            min_gas_per_well: default_min_gas_per_well(),
            max_gas_per_well: default_max_gas_per_well(),
            allocation_increment: default_allocation_increment(),
            min_change_percent: default_gl_min_change_percent(),
        }
    }
}

// ============================================================================
// PCP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcpConfig {
    /// Smallest speed change worth recommending (RPM)
    #[serde(default = "default_min_rpm_change")]
    pub min_rpm_change: f64,

    #[serde(default = "default_max_rpm")]
    pub max_rpm: f64,

    #[serde(default = "default_min_rpm")]
    pub min_rpm: f64,

    /// Drive torque the optimizer steers toward (% of rating)
    #[serde(default = "default_target_torque")]
    pub target_torque: f64,

    /// Drive torque limit (% of rating)
    #[serde(default = "default_max_torque")]
    pub max_torque: f64,

    /// Rod string axial load limit (lbs)
    #[serde(default = "default_max_rod_load")]
    pub max_rod_load: f64,

    /// Rod or stator wear factor flagged as high
    #[serde(default = "default_wear_factor_threshold")]
    pub wear_factor_threshold: f64,
}

fn default_min_rpm_change() -> f64 { 5.0 }
fn default_max_rpm() -> f64 { 500.0 }
fn default_min_rpm() -> f64 { 50.0 }
fn default_target_torque() -> f64 { 70.0 }
fn default_max_torque() -> f64 { 90.0 }
fn default_max_rod_load() -> f64 { 15_000.0 }
fn default_wear_factor_threshold() -> f64 { 0.7 }

impl Default for PcpConfig {
    fn default() -> Self {
        Self {
            min_rpm_change: default_min_rpm_change(),
            max_rpm: default_max_rpm(),
            min_rpm: default_min_rpm(),
            target_torque: default_target_torque(),
            max_torque: default_max_torque(),
            max_rod_load: default_max_rod_load(),
            wear_factor_threshold: default_wear_factor_threshold(),
        }
    }
}

// ============================================================================
// Rod Pump
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RodPumpConfig {
    /// Smallest speed change worth recommending (SPM)
    #[serde(default = "default_min_spm_change")]
    pub min_spm_change: f64,

    #[serde(default = "default_max_spm")]
    pub max_spm: f64,

    #[serde(default = "default_min_spm")]
    pub min_spm: f64,

    /// Surface unit maximum stroke (inches)
    #[serde(default = "default_max_stroke")]
    pub max_stroke: f64,

    #[serde(default = "default_min_stroke")]
    pub min_stroke: f64,

    /// Stroke lengthening applied when speed is pinned at max (inches)
    #[serde(default = "default_stroke_step")]
    pub stroke_step: f64,

    /// Fillage the optimizer steers toward (%)
    #[serde(default = "default_target_fillage")]
    pub target_fillage: f64,

    /// Lowest fillage assumed after a speed increase (%)
    #[serde(default = "default_min_fillage")]
    pub min_fillage: f64,

    /// Polished-rod peak load limit (lbs)
    #[serde(default = "default_max_peak_load")]
    pub max_peak_load: f64,

    /// Rod stress limit (psi)
    #[serde(default = "default_max_rod_stress")]
    pub max_rod_stress: f64,

    /// Healthy counterbalance band, lower edge (%)
    #[serde(default = "default_counterbalance_low")]
    pub counterbalance_low: f64,

    /// Healthy counterbalance band, upper edge (%)
    #[serde(default = "default_counterbalance_high")]
    pub counterbalance_high: f64,
}

fn default_min_spm_change() -> f64 { 0.5 }
fn default_max_spm() -> f64 { 15.0 }
fn default_min_spm() -> f64 { 3.0 }
fn default_max_stroke() -> f64 { 144.0 }
fn default_min_stroke() -> f64 { 24.0 }
fn default_stroke_step() -> f64 { 12.0 }
fn default_target_fillage() -> f64 { 85.0 }
fn default_min_fillage() -> f64 { 50.0 }
fn default_max_peak_load() -> f64 { 25_000.0 }
fn default_max_rod_stress() -> f64 { 30_000.0 }
fn default_counterbalance_low() -> f64 { 45.0 }
fn default_counterbalance_high() -> f64 { 55.0 }

impl Default for RodPumpConfig {
    fn default() -> Self {
        Self {
            min_spm_change: default_min_spm_change(),
            max_spm: default_max_spm(),
            min_spm: default_min_spm(),
            max_stroke: default_max_stroke(),
            min_stroke: default_min_stroke(),
            stroke_step: default_stroke_step(),
            target_fillage: default_target_fillage(),
            min_fillage: default_min_fillage(),
            max_peak_load: default_max_peak_load(),
            max_rod_stress: default_max_rod_stress(),
            counterbalance_low: default_counterbalance_low(),
            counterbalance_high: default_counterbalance_high(),
        }
    }
}

// ============================================================================
// Decline
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineConfig {
    /// Hyperbolic exponent used when the supplied b is missing or outside (0, 1)
    #[serde(default = "default_b_exponent")]
    pub default_b_exponent: f64,
}

fn default_b_exponent() -> f64 { 0.5 }

impl Default for DeclineConfig {
    fn default() -> Self {
        Self {
            default_b_exponent: default_b_exponent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str("[esp]\nmax_frequency = 65.0\n").unwrap();
        assert!((config.esp.max_frequency - 65.0).abs() < f64::EPSILON);
        assert!((config.esp.min_frequency - 30.0).abs() < f64::EPSILON);
        assert!((config.rod_pump.target_fillage - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = EngineConfig::default();
        config.pcp.min_rpm = 600.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("pcp.rpm")), "{errors:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_b_outside_unit_interval_rejected() {
        let mut config = EngineConfig::default();
        config.decline.default_b_exponent = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_bound_rejected() {
        let mut config = EngineConfig::default();
        config.esp.max_frequency = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
