//! Rod pump speed and stroke optimization
//!
//! Reads the dynamometer-card summary of a beam pump (fillage, peak load,
//! rod stress, counterbalance) and adjusts strokes per minute:
//!
//! - Underfilled pump: slow down so the barrel fills between strokes
//! - Fully filled pump with load headroom: speed up, or lengthen the stroke
//!   once SPM is already at its limit
//! - High rod stress or peak load: slow down regardless of fillage
//!
//! Counterbalance outside the configured band produces a separate advisory
//! that alone makes the result worth reviewing.

use std::f64::consts::PI;

use crate::config::{EngineConfig, RodPumpConfig};
use crate::physics_engine::{percent_change, round_half_up};
use crate::storage::AttributeStore;
use crate::types::{
    LiftDetails, LiftType, LimitingConstraint, OptimizationResult, RecommendationType,
    RodPumpDetails, WellOperatingPoint,
};

use super::confidence::{score_confidence, BASE_CONFIDENCE};

/// Cubic inches per barrel × 4 (area of a circle uses D²/4).
const DISPLACEMENT_DIVISOR: f64 = 4.0 * 9702.0;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Fillage above which the pump is considered fully filled (%).
const FULL_FILLAGE_PERCENT: f64 = 95.0;

/// Fillage below which card data is unreliable (%).
const UNRELIABLE_FILLAGE_PERCENT: f64 = 30.0;

const MAX_PUMP_EFFICIENCY: f64 = 95.0;

#[derive(Debug, Clone, Copy)]
struct RodPumpInputs {
    spm: f64,
    stroke_length: f64,
    fillage: f64,
    peak_load: f64,
    counterbalance: f64,
    production: f64,
    power_kw: f64,
    pump_efficiency: f64,
    rod_stress: f64,
    pump_diameter: f64,
}

impl RodPumpInputs {
    fn read(point: &WellOperatingPoint) -> Self {
        Self {
            spm: point.get_or("spm", 8.0),
            stroke_length: point.get_or("stroke_length", 86.0),
            fillage: point.get_or("fillage", 75.0),
            peak_load: point.get_or("peak_load", 15000.0),
            counterbalance: point.get_or("counterbalance", 50.0),
            production: point.get_or("current_production_bpd", 100.0),
            power_kw: point.get_or("power_kw", 20.0),
            pump_efficiency: point.get_or("pump_efficiency", 70.0),
            rod_stress: point.get_or("rod_stress", 20000.0),
            pump_diameter: point.get_or("pump_diameter", 2.25),
        }
    }
}

/// Setpoints chosen by the fillage and load rules.
#[derive(Debug, Clone)]
struct Adjustment {
    spm: f64,
    stroke_length: f64,
    constraint: Option<LimitingConstraint>,
    analysis: String,
}

/// Optimize a stored well. `None` when the asset is unknown or its data
/// quality is below the configured floor.
pub fn optimize(
    store: &dyn AttributeStore,
    asset_id: &str,
    config: &EngineConfig,
) -> Option<OptimizationResult> {
    super::optimize(LiftType::RodPump, store, asset_id, config)
}

/// Plunger displacement per stroke (bbl).
///
/// Formula: V = π·D²·S / (4 × 9702)
///
/// Where:
/// - D = plunger diameter (inches)
/// - S = stroke length (inches)
/// - 9702 = cubic inches per barrel
pub fn pump_displacement(diameter_in: f64, stroke_in: f64) -> f64 {
    round_half_up(PI * diameter_in.powi(2) * stroke_in / DISPLACEMENT_DIVISOR, 6)
}

/// Optimize pump speed (and stroke length when speed is pinned) for one
/// operating point.
pub fn optimize_point(
    asset_id: &str,
    point: &WellOperatingPoint,
    config: &EngineConfig,
) -> OptimizationResult {
    let cfg = &config.rod_pump;
    let input = RodPumpInputs::read(point);

    let displacement = pump_displacement(input.pump_diameter, input.stroke_length);
    let theoretical_capacity = round_half_up(displacement * input.spm * MINUTES_PER_DAY, 2);
    let volumetric_efficiency = if input.production > 0.0 {
        round_half_up(input.production / theoretical_capacity.max(1.0) * 100.0, 2)
    } else {
        0.0
    };

    let adjustment = adjust(&input, cfg);
    let counterbalance_recommendation = counterbalance_advice(input.counterbalance, cfg);

    // Projections at the new setpoints
    let spm_ratio = round_half_up(adjustment.spm / input.spm.max(1.0), 4);
    let stroke_ratio = if input.stroke_length > 0.0 {
        adjustment.stroke_length / input.stroke_length
    } else {
        1.0
    };
    let capacity_ratio = round_half_up(spm_ratio * stroke_ratio, 4);

    let expected_fillage = if capacity_ratio > 0.0 {
        let raw = round_half_up(input.fillage / capacity_ratio, 2);
        if capacity_ratio < 1.0 {
            raw.min(100.0)
        } else {
            raw.max(cfg.min_fillage)
        }
    } else {
        input.fillage
    };
    let expected_fillage = round_half_up(expected_fillage, 1);

    let new_displacement = pump_displacement(input.pump_diameter, adjustment.stroke_length);
    let expected_production = round_half_up(
        new_displacement * adjustment.spm * MINUTES_PER_DAY * expected_fillage / 100.0,
        2,
    );
    let expected_peak_load = round_half_up(input.peak_load * spm_ratio.powi(2), 0);
    let expected_rod_stress = round_half_up(input.rod_stress * spm_ratio.powi(2), 0);
    let expected_power = round_half_up(input.power_kw * capacity_ratio, 2);
    let expected_efficiency = (input.pump_efficiency
        + round_half_up((expected_fillage - input.fillage) / 10.0, 2))
    .min(MAX_PUMP_EFFICIENCY);
    let optimal_fillage_spm = round_half_up(input.spm * input.fillage / cfg.target_fillage, 2);

    let spm_change = adjustment.spm - input.spm;
    let stroke_changed = (adjustment.stroke_length - input.stroke_length).abs() > f64::EPSILON;
    let is_significant = spm_change.abs() >= cfg.min_spm_change
        || stroke_changed
        || counterbalance_recommendation.is_some();
    let not_significant_reason = (!is_significant).then(|| {
        format!(
            "SPM change ({:.1}) is below minimum threshold ({:.1})",
            spm_change.abs(),
            cfg.min_spm_change
        )
    });

    let confidence = score_confidence(
        BASE_CONFIDENCE,
        &[
            (input.fillage < UNRELIABLE_FILLAGE_PERCENT, 0.15),
            (input.peak_load > 0.85 * cfg.max_peak_load, 0.1),
            (input.rod_stress > 0.85 * cfg.max_rod_stress, 0.1),
        ],
    );

    let recommended_spm = round_half_up(adjustment.spm, 1);
    let recommended_stroke = round_half_up(adjustment.stroke_length, 0);

    let (recommendation_type, current_value, recommended_value, min_value, max_value) =
        if stroke_changed {
            (
                RecommendationType::RodPumpStroke,
                input.stroke_length,
                recommended_stroke,
                cfg.min_stroke,
                cfg.max_stroke,
            )
        } else {
            (
                RecommendationType::RodPumpSpeed,
                input.spm,
                recommended_spm,
                cfg.min_spm,
                cfg.max_spm,
            )
        };

    OptimizationResult {
        asset_id: asset_id.to_string(),
        lift_type: LiftType::RodPump,
        recommendation_type,
        current_value,
        recommended_value,
        change: round_half_up(recommended_value - current_value, 2),
        change_percent: percent_change(current_value, recommended_value),
        min_value,
        max_value,
        limiting_constraint: adjustment.constraint,
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
        details: LiftDetails::RodPump(RodPumpDetails {
            current_spm: input.spm,
            recommended_spm,
            current_stroke_length: input.stroke_length,
            recommended_stroke_length: recommended_stroke,
            current_fillage: input.fillage,
            expected_fillage,
            current_peak_load: input.peak_load,
            expected_peak_load,
            current_rod_stress: input.rod_stress,
            expected_rod_stress,
            current_counterbalance: input.counterbalance,
            current_pump_efficiency: input.pump_efficiency,
            expected_pump_efficiency: expected_efficiency,
            pump_displacement: displacement,
            theoretical_capacity,
            volumetric_efficiency,
            optimal_fillage_spm,
            counterbalance_recommendation,
            analysis: adjustment.analysis,
        }),
    }
}

/// Fillage rules first, then the structural-load overrides.
fn adjust(input: &RodPumpInputs, cfg: &RodPumpConfig) -> Adjustment {
    let mut spm = input.spm;
    let mut stroke_length = input.stroke_length;
    let mut constraint = None;
    let mut analysis;

    if input.fillage < cfg.target_fillage {
        // Running faster than the well can fill the barrel
        let reduction =
            input.spm * (1.0 - round_half_up(input.fillage / cfg.target_fillage, 4)) * 0.5;
        spm = (input.spm - reduction).max(cfg.min_spm);
        analysis = format!(
            "Pump underfilled ({:.0}%). Recommend reducing SPM to improve fillage.",
            input.fillage
        );
        if spm <= cfg.min_spm {
            constraint = Some(LimitingConstraint::MinSpm);
        }
    } else if input.fillage > FULL_FILLAGE_PERCENT {
        if input.spm > cfg.max_spm {
            spm = cfg.max_spm;
            constraint = Some(LimitingConstraint::MaxSpm);
            analysis = format!(
                "Pump fully filled ({:.0}%) but running above maximum SPM. Recommend reducing SPM to {:.1}.",
                input.fillage, cfg.max_spm
            );
        } else if input.peak_load < 0.85 * cfg.max_peak_load
            && input.rod_stress < 0.85 * cfg.max_rod_stress
        {
            spm = (input.spm + 1.0).min(cfg.max_spm);
            analysis = format!(
                "Pump fully filled ({:.0}%) with load headroom. Recommend increasing SPM.",
                input.fillage
            );
            if spm >= cfg.max_spm {
                constraint = Some(LimitingConstraint::MaxSpm);
            }
            if spm <= input.spm && input.stroke_length < cfg.max_stroke {
                // Speed is pinned; take the extra capacity from a longer stroke
                spm = input.spm;
                stroke_length = (input.stroke_length + cfg.stroke_step).min(cfg.max_stroke);
                analysis = format!(
                    "Pump fully filled ({:.0}%) with load headroom at maximum SPM. Recommend lengthening stroke.",
                    input.fillage
                );
                constraint = (stroke_length >= cfg.max_stroke)
                    .then_some(LimitingConstraint::MaxStroke);
            }
        } else {
            analysis = format!(
                "Pump fully filled ({:.0}%) but near load limits. Maintain current settings.",
                input.fillage
            );
        }
    } else {
        analysis = format!("Pump fillage ({:.0}%) is within optimal range.", input.fillage);
    }

    if input.rod_stress > 0.9 * cfg.max_rod_stress {
        spm = (spm - 1.0).max(cfg.min_spm);
        stroke_length = input.stroke_length;
        constraint = Some(LimitingConstraint::RodStress);
        analysis.push_str(" High rod stress detected - reducing speed.");
    }
    if input.peak_load > 0.9 * cfg.max_peak_load {
        spm = (spm - 0.5).max(cfg.min_spm);
        stroke_length = input.stroke_length;
        constraint = Some(LimitingConstraint::PeakLoad);
        analysis.push_str(" High peak load detected.");
    }

    Adjustment {
        spm: spm.clamp(cfg.min_spm, cfg.max_spm),
        stroke_length,
        constraint,
        analysis,
    }
}

/// Advisory when counterbalance sits outside [low, high].
fn counterbalance_advice(counterbalance: f64, cfg: &RodPumpConfig) -> Option<String> {
    let target = round_half_up((cfg.counterbalance_low + cfg.counterbalance_high) / 2.0, 0);
    let direction = if counterbalance < cfg.counterbalance_low {
        "Increase"
    } else if counterbalance > cfg.counterbalance_high {
        "Decrease"
    } else {
        return None;
    };
    Some(format!(
        "{direction} counterbalance from {counterbalance:.0}% to {target:.0}% for optimal load distribution"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::recommendation_title;

    fn make_point(spm: f64, fillage: f64) -> WellOperatingPoint {
        WellOperatingPoint::new()
            .with("spm", spm)
            .with("fillage", fillage)
            .with("stroke_length", 86.0)
            .with("peak_load", 15000.0)
            .with("rod_stress", 20000.0)
            .with("counterbalance", 50.0)
    }

    fn details(result: &OptimizationResult) -> &RodPumpDetails {
        match &result.details {
            LiftDetails::RodPump(d) => d,
            other => panic!("expected rod pump details, got {other:?}"),
        }
    }

    #[test]
    fn test_pump_displacement() {
        let disp = pump_displacement(2.25, 86.0);
        assert!((disp - 0.035245).abs() < 1e-5, "got {disp}");
    }

    #[test]
    fn test_underfilled_pump_slows_down() {
        let config = EngineConfig::default();
        let result = optimize_point("rp-1", &make_point(8.0, 60.0), &config);

        assert_eq!(result.recommendation_type, RecommendationType::RodPumpSpeed);
        assert_eq!(result.recommended_value, 6.8);
        assert!(result.is_significant);
        assert_eq!(result.limiting_constraint, None);
        let d = details(&result);
        assert!(d.analysis.starts_with("Pump underfilled (60%)"));
        assert!(d.expected_fillage > 60.0 && d.expected_fillage <= 100.0);
        assert!(d.expected_peak_load < 15000.0);
    }

    #[test]
    fn test_full_pump_with_headroom_speeds_up() {
        let config = EngineConfig::default();
        let result = optimize_point("rp-1", &make_point(8.0, 98.0), &config);

        assert_eq!(result.recommended_value, 9.0);
        assert_eq!(details(&result).expected_fillage, 87.1);
        assert_eq!(
            details(&result).analysis,
            "Pump fully filled (98%) with load headroom. Recommend increasing SPM."
        );
    }

    #[test]
    fn test_full_pump_near_limits_holds() {
        let config = EngineConfig::default();
        let point = make_point(8.0, 98.0).with("peak_load", 22000.0);
        let result = optimize_point("rp-1", &point, &config);

        assert_eq!(result.recommended_value, 8.0);
        assert!(!result.is_significant);
        assert_eq!(
            result.not_significant_reason.as_deref(),
            Some("SPM change (0.0) is below minimum threshold (0.5)")
        );
        assert!((result.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_rod_stress_override() {
        let config = EngineConfig::default();
        let point = make_point(8.0, 90.0).with("rod_stress", 28000.0);
        let result = optimize_point("rp-1", &point, &config);

        assert_eq!(result.recommended_value, 7.0);
        assert_eq!(result.limiting_constraint, Some(LimitingConstraint::RodStress));
        assert_eq!(
            details(&result).analysis,
            "Pump fillage (90%) is within optimal range. High rod stress detected - reducing speed."
        );
        assert!((result.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_stroke_lengthened_when_spm_pinned() {
        let config = EngineConfig::default();
        let result = optimize_point("rp-1", &make_point(15.0, 98.0), &config);

        assert_eq!(result.recommendation_type, RecommendationType::RodPumpStroke);
        assert_eq!(result.current_value, 86.0);
        assert_eq!(result.recommended_value, 98.0);
        assert!(result.is_significant);
        assert!(result.expected_production_bpd > 0.0);
        assert_eq!(details(&result).recommended_spm, 15.0);
    }

    #[test]
    fn test_overspeed_full_pump_slows_to_max_spm() {
        let config = EngineConfig::default();
        let result = optimize_point("rp-1", &make_point(18.0, 98.0), &config);

        assert_eq!(result.recommendation_type, RecommendationType::RodPumpSpeed);
        assert_eq!(result.current_value, 18.0);
        assert_eq!(result.recommended_value, 15.0);
        assert_eq!(result.limiting_constraint, Some(LimitingConstraint::MaxSpm));
        assert_eq!(details(&result).recommended_stroke_length, 86.0);
        assert!(details(&result).analysis.contains("above maximum SPM"));
        let title = recommendation_title(
            result.recommendation_type,
            result.current_value,
            result.recommended_value,
        );
        assert!(title.starts_with("Decrease"), "{title}");
    }

    #[test]
    fn test_counterbalance_alone_is_significant() {
        let config = EngineConfig::default();
        let point = make_point(8.0, 90.0).with("counterbalance", 40.0);
        let result = optimize_point("rp-1", &point, &config);

        assert_eq!(result.recommended_value, 8.0);
        assert!(result.is_significant);
        assert_eq!(
            details(&result).counterbalance_recommendation.as_deref(),
            Some("Increase counterbalance from 40% to 50% for optimal load distribution")
        );
    }

    #[test]
    fn test_low_fillage_floor_and_confidence() {
        let config = EngineConfig::default();
        let result = optimize_point("rp-1", &make_point(3.5, 20.0), &config);

        assert_eq!(result.recommended_value, 3.0);
        assert_eq!(result.limiting_constraint, Some(LimitingConstraint::MinSpm));
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }
}
