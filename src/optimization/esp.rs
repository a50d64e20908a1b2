//! ESP frequency optimization
//!
//! Moves the VSD frequency toward the target motor load while keeping the
//! motor below its temperature limit. Expected values follow the pump
//! affinity laws with r = f_new / f_current:
//!
//! - Production ∝ r
//! - Motor load ∝ r²
//! - Power ∝ r³

use crate::config::{EngineConfig, EspConfig};
use crate::physics_engine::{percent_change, round_half_up};
use crate::storage::AttributeStore;
use crate::types::{
    EspDetails, LiftDetails, LiftType, LimitingConstraint, OptimizationResult,
    RecommendationType, WellOperatingPoint,
};

use super::confidence::{score_confidence, BASE_CONFIDENCE};

/// Best efficiency point of the reference pump curve (Hz).
pub const BEP_FREQUENCY: f64 = 55.0;

/// Frequency step per percent of load below target (Hz/%).
const LOAD_GAP_STEP_HZ: f64 = 0.1;

/// Motor load above which frequency is reduced (%).
const OVERLOAD_PERCENT: f64 = 85.0;

/// Motor load below which the motor runs inefficiently (%).
const UNDERLOAD_PERCENT: f64 = 50.0;

/// Motor temperature above which efficiency is derated (°F).
const HOT_MOTOR_TEMPERATURE: f64 = 270.0;

const TEMPERATURE_STEP_HZ: f64 = 2.0;
const LOAD_STEP_HZ: f64 = 1.0;

/// Temperature rise per percent of motor load (°F/%).
const TEMPERATURE_PER_LOAD: f64 = 0.5;

/// Measurements read from the operating point, with field defaults.
#[derive(Debug, Clone, Copy)]
struct EspInputs {
    frequency: f64,
    motor_load: f64,
    motor_temperature: f64,
    pip: f64,
    discharge_pressure: f64,
    production: f64,
    power_kw: f64,
}

impl EspInputs {
    fn read(point: &WellOperatingPoint) -> Self {
        Self {
            frequency: point.get_or("frequency", 50.0),
            motor_load: point.get_or("motor_load", 70.0),
            motor_temperature: point.get_or("motor_temperature", 250.0),
            pip: point.get_or("pip", 200.0),
            discharge_pressure: point.get_or("discharge_pressure", 1500.0),
            production: point.get_or("current_production_bpd", 500.0),
            power_kw: point.get_or("power_kw", 100.0),
        }
    }
}

/// Optimize a stored well. `None` when the asset is unknown or its data
/// quality is below the configured floor.
pub fn optimize(
    store: &dyn AttributeStore,
    asset_id: &str,
    config: &EngineConfig,
) -> Option<OptimizationResult> {
    super::optimize(LiftType::Esp, store, asset_id, config)
}

/// Optimize ESP frequency for one operating point.
pub fn optimize_point(
    asset_id: &str,
    point: &WellOperatingPoint,
    config: &EngineConfig,
) -> OptimizationResult {
    let cfg = &config.esp;
    let input = EspInputs::read(point);

    let (optimal, constraint) = optimal_frequency(&input, cfg);
    let optimal = optimal.clamp(cfg.min_frequency, cfg.max_frequency);

    // Affinity-law projections
    let ratio = if input.frequency > 0.0 {
        round_half_up(optimal / input.frequency, 4)
    } else {
        1.0
    };
    let expected_production = round_half_up(input.production * ratio, 2);
    let expected_load = round_half_up(input.motor_load * ratio.powi(2), 2);
    let expected_temperature = round_half_up(
        input.motor_temperature + TEMPERATURE_PER_LOAD * (expected_load - input.motor_load),
        1,
    );
    let expected_power = round_half_up(input.power_kw * ratio.powi(3), 2);

    let current_efficiency = efficiency(
        input.production,
        input.power_kw,
        input.motor_temperature,
        input.motor_load,
    );
    let expected_efficiency = efficiency(
        expected_production,
        expected_power,
        expected_temperature,
        expected_load,
    );

    let delta = optimal - input.frequency;
    let is_significant = delta.abs() >= cfg.min_frequency_change;
    let not_significant_reason = (!is_significant).then(|| {
        format!(
            "Change ({:.1} Hz) is below minimum threshold ({:.1} Hz)",
            delta.abs(),
            cfg.min_frequency_change
        )
    });

    let max_temp = cfg.max_motor_temperature;
    let confidence = score_confidence(
        BASE_CONFIDENCE,
        &[
            (input.motor_temperature > 0.9 * max_temp, 0.1),
            (input.motor_load > OVERLOAD_PERCENT, 0.05),
            (constraint == Some(LimitingConstraint::MotorTemperature), 0.1),
        ],
    );

    let recommended = round_half_up(optimal, 1);

    OptimizationResult {
        asset_id: asset_id.to_string(),
        lift_type: LiftType::Esp,
        recommendation_type: RecommendationType::EspFrequency,
        current_value: input.frequency,
        recommended_value: recommended,
        change: round_half_up(recommended - input.frequency, 2),
        change_percent: percent_change(input.frequency, recommended),
        min_value: cfg.min_frequency,
        max_value: cfg.max_frequency,
        limiting_constraint: constraint,
        current_production_bpd: input.production,
        expected_production_bpd: expected_production,
        expected_production_increase: round_half_up(expected_production - input.production, 2),
        expected_production_increase_percent: percent_change(input.production, expected_production),
        expected_efficiency_improvement: round_half_up(expected_efficiency - current_efficiency, 2),
        expected_power_kw: expected_power,
        is_significant,
        not_significant_reason,
        confidence,
        details: LiftDetails::Esp(EspDetails {
            current_motor_load: input.motor_load,
            current_motor_temperature: input.motor_temperature,
            current_pip: input.pip,
            current_discharge_pressure: input.discharge_pressure,
            current_power_kw: input.power_kw,
            expected_motor_load: expected_load,
            expected_motor_temperature: expected_temperature,
            current_efficiency,
            bep_frequency: BEP_FREQUENCY,
            distance_from_bep_percent: round_half_up(
                (optimal - BEP_FREQUENCY).abs() / BEP_FREQUENCY * 100.0,
                2,
            ),
        }),
    }
}

/// Directional adjustment and the constraint that bounded it.
fn optimal_frequency(input: &EspInputs, cfg: &EspConfig) -> (f64, Option<LimitingConstraint>) {
    let max_temp = cfg.max_motor_temperature;

    if input.motor_load < cfg.target_motor_load && input.motor_temperature < 0.9 * max_temp {
        // Headroom on load and temperature: speed up
        let step = (cfg.target_motor_load - input.motor_load) * LOAD_GAP_STEP_HZ;
        let optimal = (input.frequency + step).min(cfg.max_frequency);
        let constraint =
            (optimal >= cfg.max_frequency).then_some(LimitingConstraint::MaxFrequency);
        (optimal, constraint)
    } else if input.motor_load > OVERLOAD_PERCENT || input.motor_temperature > 0.95 * max_temp {
        let (step, reason) = if input.motor_temperature > 0.95 * max_temp {
            (TEMPERATURE_STEP_HZ, LimitingConstraint::MotorTemperature)
        } else {
            (LOAD_STEP_HZ, LimitingConstraint::MotorLoad)
        };
        let optimal = (input.frequency - step).max(cfg.min_frequency);
        if optimal <= cfg.min_frequency {
            (optimal, Some(LimitingConstraint::MinFrequency))
        } else {
            (optimal, Some(reason))
        }
    } else {
        (input.frequency, None)
    }
}

/// Production per kW, derated for a hot or badly loaded motor.
fn efficiency(production: f64, power_kw: f64, temperature: f64, load: f64) -> f64 {
    if power_kw <= 0.0 {
        return 0.0;
    }
    let mut eff = production / power_kw;
    if temperature > HOT_MOTOR_TEMPERATURE {
        eff *= 0.9;
    }
    if !(UNDERLOAD_PERCENT..=OVERLOAD_PERCENT).contains(&load) {
        eff *= 0.95;
    }
    round_half_up(eff, 2)
}
