//! PCP speed optimization
//!
//! Progressive cavity pumps deliver roughly in proportion to rotor speed.
//! Speed is raised while torque and rod load have headroom, and cut when
//! either approaches its limit. Efficiency peaks at an optimal efficiency
//! point (OEP) that drops with fluid viscosity.

use crate::config::{EngineConfig, PcpConfig};
use crate::physics_engine::{percent_change, round_half_up};
use crate::storage::AttributeStore;
use crate::types::{
    LiftDetails, LiftType, LimitingConstraint, OptimizationResult, PcpDetails,
    RecommendationType, WellOperatingPoint,
};

use super::confidence::{score_confidence, BASE_CONFIDENCE};

/// OEP of the reference pump with water-like fluid (RPM).
const BASE_OEP_RPM: f64 = 250.0;

/// Largest viscosity reduction of the OEP (fraction).
const MAX_VISCOSITY_DERATE: f64 = 0.3;

/// Speed step per percent of torque below target (RPM/%).
const RPM_PER_TORQUE_PERCENT: f64 = 1.5;

const TORQUE_STEP_RPM: f64 = 20.0;
const ROD_LOAD_STEP_RPM: f64 = 15.0;

/// Pump efficiency at the OEP (%).
const PEAK_EFFICIENCY: f64 = 80.0;
const MIN_EFFICIENCY: f64 = 50.0;

#[derive(Debug, Clone, Copy)]
struct PcpInputs {
    rpm: f64,
    torque: f64,
    drive_load: f64,
    rod_load: f64,
    production: f64,
    power_kw: f64,
    viscosity: f64,
    pump_efficiency: f64,
}

impl PcpInputs {
    fn read(point: &WellOperatingPoint) -> Self {
        Self {
            rpm: point.get_or("rpm", 200.0),
            torque: point.get_or("torque", 60.0),
            drive_load: point.get_or("drive_load", 65.0),
            rod_load: point.get_or("rod_load", 8000.0),
            production: point.get_or("current_production_bpd", 300.0),
            power_kw: point.get_or("power_kw", 50.0),
            viscosity: point.get_or("fluid_viscosity", 100.0),
            pump_efficiency: point.get_or("pump_efficiency", 75.0),
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
    super::optimize(LiftType::Pcp, store, asset_id, config)
}

/// Optimal efficiency point for a fluid viscosity (cp).
///
/// Formula: OEP = round(250 × (1 − min(μ/1000, 0.3)))
pub fn oep_rpm(viscosity: f64) -> f64 {
    let derate = (viscosity / 1000.0).min(MAX_VISCOSITY_DERATE);
    round_half_up(BASE_OEP_RPM * (1.0 - derate), 0)
}

/// Optimize rotor speed for one operating point.
pub fn optimize_point(
    asset_id: &str,
    point: &WellOperatingPoint,
    config: &EngineConfig,
) -> OptimizationResult {
    let cfg = &config.pcp;
    let input = PcpInputs::read(point);
    let oep = oep_rpm(input.viscosity);

    let (optimal, constraint) = optimal_rpm(&input, cfg);
    let optimal = optimal.clamp(cfg.min_rpm, cfg.max_rpm);

    let ratio = if input.rpm > 0.0 {
        round_half_up(optimal / input.rpm, 4)
    } else {
        1.0
    };
    let expected_production = round_half_up(input.production * ratio, 2);
    let expected_torque = round_half_up(input.torque * ratio, 2);
    let expected_drive_load = round_half_up(input.drive_load * ratio, 2);
    let expected_power = round_half_up(input.power_kw * ratio.powi(2), 2);
    let expected_efficiency = pump_efficiency(optimal, oep, input.viscosity);

    let rod_wear_factor = rod_wear_factor(optimal, cfg.max_rpm);
    let stator_wear_factor = stator_wear_factor(optimal, cfg.max_rpm, input.viscosity);

    let delta = optimal - input.rpm;
    let is_significant = delta.abs() >= cfg.min_rpm_change;
    let not_significant_reason = (!is_significant).then(|| {
        format!(
            "Change ({:.0} RPM) is below minimum threshold ({:.0} RPM)",
            delta.abs(),
            cfg.min_rpm_change
        )
    });

    let confidence = score_confidence(
        BASE_CONFIDENCE,
        &[
            (input.torque > 0.85 * cfg.max_torque, 0.1),
            (input.rod_load > 0.85 * cfg.max_rod_load, 0.1),
            (
                matches!(
                    constraint,
                    Some(LimitingConstraint::Torque | LimitingConstraint::RodLoad)
                ),
                0.05,
            ),
        ],
    );

    let recommended = round_half_up(optimal, 0);

    OptimizationResult {
        asset_id: asset_id.to_string(),
        lift_type: LiftType::Pcp,
        recommendation_type: RecommendationType::PcpSpeed,
        current_value: input.rpm,
        recommended_value: recommended,
        change: round_half_up(recommended - input.rpm, 2),
        change_percent: percent_change(input.rpm, recommended),
        min_value: cfg.min_rpm,
        max_value: cfg.max_rpm,
        limiting_constraint: constraint,
        current_production_bpd: input.production,
        expected_production_bpd: expected_production,
        expected_production_increase: round_half_up(expected_production - input.production, 2),
        expected_production_increase_percent: percent_change(input.production, expected_production),
        expected_efficiency_improvement: round_half_up(
            expected_efficiency - input.pump_efficiency,
            2,
        ),
        expected_power_kw: expected_power,
        is_significant,
        not_significant_reason,
        confidence,
        details: LiftDetails::Pcp(PcpDetails {
            current_torque: input.torque,
            current_drive_load: input.drive_load,
            current_rod_load: input.rod_load,
            current_viscosity: input.viscosity,
            current_pump_efficiency: input.pump_efficiency,
            expected_torque,
            expected_drive_load,
            expected_pump_efficiency: expected_efficiency,
            oep_rpm: oep,
            distance_from_oep_percent: round_half_up(oep_distance(optimal, oep) * 100.0, 2),
            rod_wear_factor,
            stator_wear_factor,
            high_wear: rod_wear_factor > cfg.wear_factor_threshold
                || stator_wear_factor > cfg.wear_factor_threshold,
        }),
    }
}

fn optimal_rpm(input: &PcpInputs, cfg: &PcpConfig) -> (f64, Option<LimitingConstraint>) {
    let (optimal, mut constraint) = if input.torque < cfg.target_torque
        && input.rod_load < 0.85 * cfg.max_rod_load
    {
        let step = (cfg.target_torque - input.torque) * RPM_PER_TORQUE_PERCENT;
        let optimal = (input.rpm + step).min(cfg.max_rpm);
        (
            optimal,
            (optimal >= cfg.max_rpm).then_some(LimitingConstraint::MaxRpm),
        )
    } else if input.torque > 0.9 * cfg.max_torque {
        (
            (input.rpm - TORQUE_STEP_RPM).max(cfg.min_rpm),
            Some(LimitingConstraint::Torque),
        )
    } else if input.rod_load > 0.9 * cfg.max_rod_load {
        (
            (input.rpm - ROD_LOAD_STEP_RPM).max(cfg.min_rpm),
            Some(LimitingConstraint::RodLoad),
        )
    } else {
        (input.rpm, None)
    };

    if optimal <= cfg.min_rpm {
        constraint = Some(LimitingConstraint::MinRpm);
    }
    (optimal, constraint)
}

/// Relative distance from the OEP, 4 dp.
fn oep_distance(rpm: f64, oep: f64) -> f64 {
    round_half_up((rpm - oep).abs() / oep.max(1.0), 4)
}

/// Pump efficiency (%) at a rotor speed.
///
/// Formula: η = 80 − min(15·d, 15) − min(μ/500, 5), floored at 50
///
/// Where:
/// - d = |rpm − OEP| / OEP
/// - μ = viscosity (cp)
pub fn pump_efficiency(rpm: f64, oep: f64, viscosity: f64) -> f64 {
    let distance_penalty = (oep_distance(rpm, oep) * 15.0).min(15.0);
    let viscosity_penalty = round_half_up(viscosity / 500.0, 4).min(5.0);
    (PEAK_EFFICIENCY - distance_penalty - viscosity_penalty).max(MIN_EFFICIENCY)
}

/// Rod wear grows with the square of relative speed.
fn rod_wear_factor(rpm: f64, max_rpm: f64) -> f64 {
    let ratio = round_half_up(rpm / max_rpm, 4);
    round_half_up(ratio.powi(2), 3)
}

/// Stator wear grows with speed and with thinner fluid.
fn stator_wear_factor(rpm: f64, max_rpm: f64, viscosity: f64) -> f64 {
    let ratio = round_half_up(rpm / max_rpm, 4);
    let thin_fluid = round_half_up(200.0 / viscosity.max(1.0), 4).min(1.0);
    round_half_up(ratio * thin_fluid, 3)
}
