//! Conversion from OptimizationResult → operator-facing Recommendation

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::EngineConfig;
use crate::types::{
    EspDetails, LiftDetails, OptimizationResult, PcpDetails, Recommendation,
    RecommendationStatus, RecommendationType, RodPumpDetails,
};

use super::confidence::priority_for_percent;

/// Package a significant result for operator review.
///
/// Returns `None` when the result is below its significance threshold.
pub fn create_recommendation(
    result: &OptimizationResult,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<Recommendation> {
    if !result.is_significant {
        return None;
    }

    Some(Recommendation {
        asset_id: result.asset_id.clone(),
        recommendation_type: result.recommendation_type,
        lift_type: result.lift_type,
        current_value: result.current_value,
        recommended_value: result.recommended_value,
        unit: result.recommendation_type.unit().to_string(),
        title: recommendation_title(
            result.recommendation_type,
            result.current_value,
            result.recommended_value,
        ),
        description: describe(result),
        priority: priority_for_percent(result.expected_production_increase_percent),
        confidence: result.confidence,
        expected_production_increase: result.expected_production_increase,
        expected_production_increase_percent: result.expected_production_increase_percent,
        expected_efficiency_improvement: Some(result.expected_efficiency_improvement),
        status: RecommendationStatus::Pending,
        created_at: now,
        expires_at: Recommendation::expiry_from(now, config.general.recommendation_expiry_hours),
        updated_at: now,
        status_reason: None,
    })
}

/// "{Increase|Decrease} {quantity} from X to Y {unit}"
///
/// An unchanged setpoint (e.g. a counterbalance-only advisory) reads
/// "Maintain {quantity} at X {unit}".
pub fn recommendation_title(kind: RecommendationType, current: f64, recommended: f64) -> String {
    let p = kind.display_precision();
    let direction = if recommended > current {
        "Increase"
    } else if recommended < current {
        "Decrease"
    } else {
        return format!("Maintain {} at {current:.p$} {}", kind.quantity(), kind.unit());
    };
    format!(
        "{direction} {} from {current:.p$} to {recommended:.p$} {}",
        kind.quantity(),
        kind.unit()
    )
}

/// Multi-line description: headline, expected benefits, current conditions,
/// lift-specific analysis, limiting factor and confidence.
fn describe(result: &OptimizationResult) -> String {
    let mut parts: Vec<String> = match &result.details {
        LiftDetails::Esp(d) => esp_sections(result, d),
        LiftDetails::Pcp(d) => pcp_sections(result, d),
        LiftDetails::RodPump(d) => rod_pump_sections(result, d),
    };

    if let Some(constraint) = result.limiting_constraint {
        parts.push(format!("Limiting factor: {constraint}"));
    }
    parts.push(format!("Confidence: {:.0}%", result.confidence * 100.0));

    parts.join("\n\n")
}

fn esp_sections(result: &OptimizationResult, d: &EspDetails) -> Vec<String> {
    vec![
        format!(
            "Optimize ESP frequency from {:.1} Hz to {:.1} Hz.",
            result.current_value, result.recommended_value
        ),
        format!(
            "Expected Benefits:\n\
             - Production increase: {:+.0} BPD ({:+.1}%)\n\
             - Efficiency improvement: {:+.1}%",
            result.expected_production_increase,
            result.expected_production_increase_percent,
            result.expected_efficiency_improvement,
        ),
        format!(
            "Current Conditions:\n\
             - Motor load: {:.0}%\n\
             - Motor temperature: {:.0}°F\n\
             - Production: {:.0} BPD",
            d.current_motor_load, d.current_motor_temperature, result.current_production_bpd,
        ),
    ]
}

fn pcp_sections(result: &OptimizationResult, d: &PcpDetails) -> Vec<String> {
    let mut wear = format!(
        "Wear Analysis:\n\
         - Rod wear factor: {:.2}\n\
         - Stator wear factor: {:.2}",
        d.rod_wear_factor, d.stator_wear_factor,
    );
    if d.high_wear {
        wear.push_str("\n- Wear above threshold; schedule rod and stator inspection");
    }

    vec![
        format!(
            "Optimize PCP speed from {:.0} RPM to {:.0} RPM.",
            result.current_value, result.recommended_value
        ),
        format!(
            "Expected Benefits:\n\
             - Production change: {:+.0} BPD ({:+.1}%)\n\
             - Efficiency: {:.0}% → {:.0}% ({:+.1}%)",
            result.expected_production_increase,
            result.expected_production_increase_percent,
            d.current_pump_efficiency,
            d.expected_pump_efficiency,
            result.expected_efficiency_improvement,
        ),
        format!(
            "Current Conditions:\n\
             - Torque: {:.0}%\n\
             - Drive load: {:.0}%\n\
             - Rod load: {:.0} lbs\n\
             - Production: {:.0} BPD",
            d.current_torque, d.current_drive_load, d.current_rod_load, result.current_production_bpd,
        ),
        wear,
    ]
}

fn rod_pump_sections(result: &OptimizationResult, d: &RodPumpDetails) -> Vec<String> {
    let headline = if result.recommendation_type == RecommendationType::RodPumpStroke {
        format!(
            "Adjust stroke length from {:.0} to {:.0} inches.",
            d.current_stroke_length, d.recommended_stroke_length
        )
    } else {
        format!(
            "Adjust pump speed from {:.1} to {:.1} SPM.",
            d.current_spm, d.recommended_spm
        )
    };

    let mut parts = vec![
        headline,
        format!(
            "Expected Benefits:\n\
             - Production change: {:+.0} BPD ({:+.1}%)\n\
             - Fillage: {:.0}% → {:.0}%\n\
             - Efficiency: {:+.1}%",
            result.expected_production_increase,
            result.expected_production_increase_percent,
            d.current_fillage,
            d.expected_fillage,
            result.expected_efficiency_improvement,
        ),
        format!(
            "Current Conditions:\n\
             - SPM: {:.1}\n\
             - Stroke: {:.0} inches\n\
             - Fillage: {:.0}%\n\
             - Peak load: {:.0} lbs\n\
             - Rod stress: {:.0} psi",
            d.current_spm, d.current_stroke_length, d.current_fillage, d.current_peak_load, d.current_rod_stress,
        ),
    ];
    if let Some(ref cb) = d.counterbalance_recommendation {
        parts.push(format!("Counterbalance: {cb}"));
    }
    parts.push(format!("Analysis: {}", d.analysis));
    parts
}

/// Move every pending recommendation past its expiry to `Expired`.
///
/// No-op when `general.auto_expire_recommendations` is off. Returns how many
/// expired.
pub fn expire_due(
    recommendations: &mut [Recommendation],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> usize {
    if !config.general.auto_expire_recommendations {
        return 0;
    }
    let expired = recommendations
        .iter_mut()
        .map(|rec| rec.expire_if_due(now))
        .filter(|&expired| expired)
        .count();
    if expired > 0 {
        info!(expired, "Expired stale recommendations");
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{esp, pcp, rod_pump};
    use crate::types::WellOperatingPoint;

    fn make_esp_result(load: f64) -> OptimizationResult {
        let point = WellOperatingPoint::new()
            .with("frequency", 50.0)
            .with("motor_load", load)
            .with("motor_temperature", 200.0);
        esp::optimize_point("esp-7", &point, &EngineConfig::default())
    }

    #[test]
    fn test_titles() {
        assert_eq!(
            recommendation_title(RecommendationType::EspFrequency, 50.0, 51.5),
            "Increase ESP frequency from 50.0 to 51.5 Hz"
        );
        assert_eq!(
            recommendation_title(RecommendationType::PcpSpeed, 300.0, 280.0),
            "Decrease PCP speed from 300 to 280 RPM"
        );
        assert_eq!(
            recommendation_title(RecommendationType::GasLiftAllocation, 500.0, 650.0),
            "Increase gas injection from 500 to 650 MSCF/day"
        );
        assert_eq!(
            recommendation_title(RecommendationType::RodPumpSpeed, 8.0, 8.0),
            "Maintain pump speed at 8.0 SPM"
        );
    }

    #[test]
    fn test_insignificant_result_yields_nothing() {
        let result = make_esp_result(80.0);
        assert!(!result.is_significant);
        assert!(create_recommendation(&result, &EngineConfig::default(), Utc::now()).is_none());
    }

    #[test]
    fn test_esp_recommendation_fields() {
        let now = Utc::now();
        let config = EngineConfig::default();
        let result = make_esp_result(60.0);
        let rec = create_recommendation(&result, &config, now).unwrap();

        assert_eq!(rec.status, RecommendationStatus::Pending);
        assert_eq!(rec.unit, "Hz");
        assert_eq!(rec.title, "Increase ESP frequency from 50.0 to 51.5 Hz");
        // +3% production → priority 3
        assert_eq!(rec.priority, 3);
        assert_eq!(rec.expires_at, now + chrono::Duration::hours(24));
        assert!(rec.description.starts_with("Optimize ESP frequency from 50.0 Hz to 51.5 Hz."));
        assert!(rec.description.contains("- Production increase: +15 BPD (+3.0%)"));
        assert!(rec.description.contains("- Motor load: 60%"));
        assert!(rec.description.ends_with("Confidence: 85%"));
        assert!(!rec.description.contains("Limiting factor"));
    }

    #[test]
    fn test_pcp_description_has_wear_and_constraint() {
        let point = WellOperatingPoint::new()
            .with("rpm", 300.0)
            .with("torque", 85.0);
        let result = pcp::optimize_point("pcp-3", &point, &EngineConfig::default());
        let rec = create_recommendation(&result, &EngineConfig::default(), Utc::now()).unwrap();

        assert!(rec.description.contains("Wear Analysis:"));
        assert!(rec.description.contains("Limiting factor: TORQUE"));
        assert_eq!(rec.unit, "RPM");
    }

    #[test]
    fn test_rod_pump_counterbalance_in_description() {
        let point = WellOperatingPoint::new()
            .with("spm", 8.0)
            .with("fillage", 90.0)
            .with("counterbalance", 60.0);
        let result = rod_pump::optimize_point("rp-2", &point, &EngineConfig::default());
        let rec = create_recommendation(&result, &EngineConfig::default(), Utc::now()).unwrap();

        assert_eq!(rec.title, "Maintain pump speed at 8.0 SPM");
        assert!(rec
            .description
            .contains("Counterbalance: Decrease counterbalance from 60% to 50% for optimal load distribution"));
        assert!(rec.description.contains("Analysis: Pump fillage (90%) is within optimal range."));
    }
}
