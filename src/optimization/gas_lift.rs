//! Field-wide gas-lift allocation
//!
//! Distributes a limited injection-gas budget across the gas-lift wells of a
//! field by marginal oil rate (dQo/dQg): wells that return the most oil per
//! extra MSCF/day are served first.
//!
//! ## Algorithm
//!
//! 1. Estimate each well's marginal oil rate with diminishing returns
//! 2. Budget = min(requested or current field total, field cap)
//! 3. Phase 1: every well receives its minimum rate while gas remains
//! 4. Phase 2: fixed increments go to the best-ranked well with headroom
//!
//! The allocation never exceeds the budget, and no well leaves
//! [min_gas_per_well, max_gas_per_well].

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::{EngineConfig, GasLiftConfig};
use crate::physics_engine::{percent_change, round_half_up};
use crate::storage::AttributeStore;
use crate::types::{
    GasLiftAllocationResult, LiftType, OptimizationSkipReason, Recommendation,
    RecommendationStatus, RecommendationType, WellAllocation, WellOperatingPoint,
};

use super::confidence::{
    priority_for_percent, score_confidence, BASE_ALLOCATION_CONFIDENCE,
};
use super::recommendation_title;

/// Fraction of the production/gas ratio realised at the margin.
const MARGINAL_FRACTION: f64 = 0.5;

/// Strength of diminishing returns as injection approaches the well maximum.
const DIMINISHING_RETURNS: f64 = 0.3;

/// Below this many wells the allocation is less trustworthy.
const MIN_WELLS_FOR_CONFIDENCE: usize = 5;

/// Relative marginal-rate spread above which confidence is reduced.
const MAX_MARGINAL_SPREAD: f64 = 0.5;

/// Inputs of one gas-lift well.
#[derive(Debug, Clone, PartialEq)]
pub struct GasLiftWell {
    pub asset_id: String,
    /// MSCF/day
    pub current_gas_rate: f64,
    pub current_production_bpd: f64,
    pub gas_oil_ratio: f64,
    pub min_gas_rate: f64,
    pub max_gas_rate: f64,
}

impl GasLiftWell {
    /// Read a well snapshot, falling back to field defaults.
    pub fn from_point(asset_id: &str, point: &WellOperatingPoint, cfg: &GasLiftConfig) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            current_gas_rate: point.get_or("gas_injection_rate", 500.0),
            current_production_bpd: point.get_or("current_production_bpd", 200.0),
            gas_oil_ratio: point.get_or("gor", 1000.0),
            min_gas_rate: point.get_or("min_gas_rate", cfg.min_gas_per_well),
            max_gas_rate: point.get_or("max_gas_rate", cfg.max_gas_per_well),
        }
    }

    /// Marginal oil rate (BPD per MSCF/day).
    ///
    /// Formula: dQo/dQg = Qo / max(Qg, 1) × 0.5 × (1 − 0.3 × Qg / Qg_max)
    pub fn marginal_oil_rate(&self) -> f64 {
        let base = self.current_production_bpd / self.current_gas_rate.max(1.0) * MARGINAL_FRACTION;
        let utilization = if self.max_gas_rate > 0.0 {
            round_half_up(self.current_gas_rate / self.max_gas_rate, 4)
        } else {
            1.0
        };
        round_half_up(base * (1.0 - DIMINISHING_RETURNS * utilization), 4)
    }
}

/// Allocate gas across the gas-lift wells of a stored field.
///
/// `None` when the field is unknown or has no eligible gas-lift wells.
pub fn allocate(
    store: &dyn AttributeStore,
    field_id: &str,
    total_gas: Option<f64>,
    config: &EngineConfig,
) -> Option<GasLiftAllocationResult> {
    let Some(well_ids) = store.field_wells(field_id) else {
        debug!(field_id = %field_id, reason = %OptimizationSkipReason::UnknownField, "Gas-lift allocation skipped");
        return None;
    };

    let wells: Vec<GasLiftWell> = well_ids
        .iter()
        .filter_map(|id| {
            let point = store.operating_point(id)?;
            if !point.is_gas_lift() {
                return None;
            }
            if point.data_quality() < config.general.min_data_quality {
                debug!(asset_id = %id, reason = %OptimizationSkipReason::LowDataQuality, "Well excluded from allocation");
                return None;
            }
            Some(GasLiftWell::from_point(id, &point, &config.gas_lift))
        })
        .collect();

    if wells.is_empty() {
        debug!(field_id = %field_id, reason = %OptimizationSkipReason::NoGasLiftWells, "Gas-lift allocation skipped");
        return None;
    }

    let result = allocate_wells(field_id, &wells, total_gas, config, Utc::now());
    info!(
        field_id = %field_id,
        wells = result.allocations.len(),
        budget = result.total_available_gas,
        production_increase = result.expected_production_increase,
        "Gas-lift allocation complete"
    );
    Some(result)
}

/// Pure allocation over an explicit well list.
pub fn allocate_wells(
    field_id: &str,
    wells: &[GasLiftWell],
    total_gas: Option<f64>,
    config: &EngineConfig,
    timestamp: DateTime<Utc>,
) -> GasLiftAllocationResult {
    let cfg = &config.gas_lift;

    let mut ranked: Vec<(&GasLiftWell, f64)> =
        wells.iter().map(|w| (w, w.marginal_oil_rate())).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let current_total_gas: f64 = wells.iter().map(|w| w.current_gas_rate).sum();
    let budget = total_gas
        .unwrap_or(current_total_gas)
        .min(cfg.max_total_gas_rate)
        .max(0.0);

    let allocated = distribute(&ranked, budget, cfg);

    let allocations: Vec<WellAllocation> = ranked
        .iter()
        .zip(allocated.iter())
        .enumerate()
        .map(|(i, ((well, marginal), &recommended))| {
            let gas_change = recommended - well.current_gas_rate;
            let expected =
                (well.current_production_bpd + gas_change * marginal).max(0.0);
            let expected = round_half_up(expected, 0);
            WellAllocation {
                asset_id: well.asset_id.clone(),
                current_gas_rate: well.current_gas_rate,
                recommended_gas_rate: round_half_up(recommended, 0),
                gas_rate_change: round_half_up(gas_change, 0),
                current_production_bpd: well.current_production_bpd,
                expected_production_bpd: expected,
                expected_production_increase: round_half_up(
                    expected - well.current_production_bpd,
                    0,
                ),
                marginal_oil_rate: *marginal,
                gas_oil_ratio: well.gas_oil_ratio,
                priority_rank: i + 1,
                at_minimum: recommended <= well.min_gas_rate,
                at_maximum: recommended >= well.max_gas_rate,
            }
        })
        .collect();

    let optimized_total_gas: f64 = allocations.iter().map(|a| a.recommended_gas_rate).sum();
    let current_total_production: f64 = wells.iter().map(|w| w.current_production_bpd).sum();
    let expected_total_production: f64 =
        allocations.iter().map(|a| a.expected_production_bpd).sum();
    let production_increase = expected_total_production - current_total_production;

    let current_efficiency = ratio(current_total_production, current_total_gas);
    let optimized_efficiency = ratio(expected_total_production, optimized_total_gas);
    let efficiency_improvement_percent = if current_efficiency > 0.0 {
        round_half_up(
            (optimized_efficiency - current_efficiency) / current_efficiency * 100.0,
            2,
        )
    } else {
        0.0
    };

    GasLiftAllocationResult {
        field_id: field_id.to_string(),
        total_available_gas: budget,
        current_total_gas_rate: current_total_gas,
        optimized_total_gas_rate: optimized_total_gas,
        current_total_production,
        expected_total_production,
        expected_production_increase: round_half_up(production_increase, 2),
        expected_production_increase_percent: percent_change(
            current_total_production,
            expected_total_production,
        ),
        efficiency_improvement_percent,
        confidence: allocation_confidence(&ranked),
        allocations,
        timestamp,
    }
}

/// Two-phase distribution over wells already sorted by marginal rate.
/// Returns the allocation of each well in the same order.
fn distribute(ranked: &[(&GasLiftWell, f64)], budget: f64, cfg: &GasLiftConfig) -> Vec<f64> {
    let mut remaining = budget;

    // Phase 1: minimum rates, best wells first
    let mut allocated: Vec<f64> = ranked
        .iter()
        .map(|(well, _)| {
            let min_alloc = well.min_gas_rate.max(cfg.min_gas_per_well);
            if remaining >= min_alloc {
                remaining -= min_alloc;
                min_alloc
            } else {
                let rest = remaining.max(0.0);
                remaining = 0.0;
                rest
            }
        })
        .collect();

    // Phase 2: increments to the best well with headroom
    let increment = cfg.allocation_increment;
    if increment <= 0.0 {
        return allocated;
    }
    while remaining >= increment {
        let slot = ranked.iter().zip(allocated.iter()).position(|((well, _), &alloc)| {
            alloc + increment <= well.max_gas_rate.min(cfg.max_gas_per_well)
        });
        match slot {
            Some(i) => {
                allocated[i] += increment;
                remaining -= increment;
            }
            None => break,
        }
    }
    allocated
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn allocation_confidence(ranked: &[(&GasLiftWell, f64)]) -> f64 {
    let max = ranked.iter().map(|(_, m)| *m).fold(f64::MIN, f64::max);
    let min = ranked.iter().map(|(_, m)| *m).fold(f64::MAX, f64::min);
    let spread = if max > 0.0 { (max - min) / max } else { 0.0 };

    score_confidence(
        BASE_ALLOCATION_CONFIDENCE,
        &[
            (ranked.len() < MIN_WELLS_FOR_CONFIDENCE, 0.1),
            (spread > MAX_MARGINAL_SPREAD, 0.05),
        ],
    )
}

/// One recommendation per well whose rate changes by at least
/// `min_change_percent` of its current rate.
pub fn create_recommendations(
    result: &GasLiftAllocationResult,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    result
        .allocations
        .iter()
        .filter(|a| a.gas_rate_change != 0.0)
        .filter(|a| a.change_percent() >= config.gas_lift.min_change_percent)
        .map(|alloc| {
            let increase_percent = if alloc.current_production_bpd > 0.0 {
                round_half_up(
                    alloc.expected_production_increase / alloc.current_production_bpd * 100.0,
                    2,
                )
            } else {
                0.0
            };
            Recommendation {
                asset_id: alloc.asset_id.clone(),
                recommendation_type: RecommendationType::GasLiftAllocation,
                lift_type: LiftType::GasLift,
                current_value: alloc.current_gas_rate,
                recommended_value: alloc.recommended_gas_rate,
                unit: RecommendationType::GasLiftAllocation.unit().to_string(),
                title: recommendation_title(
                    RecommendationType::GasLiftAllocation,
                    alloc.current_gas_rate,
                    alloc.recommended_gas_rate,
                ),
                description: describe_allocation(result, alloc),
                priority: priority_for_percent(increase_percent),
                confidence: result.confidence,
                expected_production_increase: alloc.expected_production_increase,
                expected_production_increase_percent: increase_percent,
                expected_efficiency_improvement: None,
                status: RecommendationStatus::Pending,
                created_at: now,
                expires_at: Recommendation::expiry_from(
                    now,
                    config.general.recommendation_expiry_hours,
                ),
                updated_at: now,
                status_reason: None,
            }
        })
        .collect()
}

fn describe_allocation(result: &GasLiftAllocationResult, alloc: &WellAllocation) -> String {
    let direction = if alloc.gas_rate_change > 0.0 { "Increase" } else { "Decrease" };

    let mut parts = vec![
        format!(
            "{direction} gas injection rate from {:.0} to {:.0} MSCF/day.",
            alloc.current_gas_rate, alloc.recommended_gas_rate
        ),
        format!(
            "Expected Benefits:\n\
             - Production change: {:+.0} BPD\n\
             - Marginal oil rate: {:.3} BPD per MSCF/day",
            alloc.expected_production_increase, alloc.marginal_oil_rate,
        ),
        format!(
            "Field Context:\n\
             - Field: {}\n\
             - Total available gas: {:.0} MSCF/day\n\
             - Field production increase: {:+.0} BPD ({:+.1}%)",
            result.field_id,
            result.total_available_gas,
            result.expected_production_increase,
            result.expected_production_increase_percent,
        ),
    ];

    let mut rank = format!(
        "Well priority rank: {} of {}",
        alloc.priority_rank,
        result.allocations.len()
    );
    if alloc.at_minimum {
        rank.push_str("\nWell at minimum gas rate constraint");
    }
    if alloc.at_maximum {
        rank.push_str("\nWell at maximum gas rate constraint");
    }
    parts.push(rank);
    parts.push(format!("Confidence: {:.0}%", result.confidence * 100.0));

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_well(id: &str, gas: f64, production: f64) -> GasLiftWell {
        GasLiftWell {
            asset_id: id.to_string(),
            current_gas_rate: gas,
            current_production_bpd: production,
            gas_oil_ratio: 1000.0,
            min_gas_rate: 50.0,
            max_gas_rate: 2000.0,
        }
    }

    fn make_field() -> Vec<GasLiftWell> {
        vec![
            make_well("w-low", 800.0, 200.0),
            make_well("w-high", 400.0, 400.0),
            make_well("w-mid", 500.0, 300.0),
        ]
    }

    #[test]
    fn test_marginal_oil_rate() {
        // 400/400 × 0.5 × (1 − 0.3 × 0.2) = 0.47
        assert_eq!(make_well("w", 400.0, 400.0).marginal_oil_rate(), 0.47);
        // zero gas uses a divisor of 1
        assert_eq!(make_well("w", 0.0, 10.0).marginal_oil_rate(), 5.0);
    }

    #[test]
    fn test_ranked_by_marginal_rate() {
        let result = allocate_wells("f1", &make_field(), None, &EngineConfig::default(), Utc::now());
        let order: Vec<&str> = result.allocations.iter().map(|a| a.asset_id.as_str()).collect();
        assert_eq!(order, vec!["w-high", "w-mid", "w-low"]);
        assert_eq!(result.allocations[0].priority_rank, 1);
    }

    #[test]
    fn test_budget_respected_and_bounds_held() {
        let config = EngineConfig::default();
        let result = allocate_wells("f1", &make_field(), Some(1700.0), &config, Utc::now());

        assert_eq!(result.total_available_gas, 1700.0);
        let total: f64 = result.allocations.iter().map(|a| a.recommended_gas_rate).sum();
        assert!(total <= 1700.0 + 1e-9, "allocated {total}");
        for a in &result.allocations {
            assert!(a.recommended_gas_rate >= config.gas_lift.min_gas_per_well);
            assert!(a.recommended_gas_rate <= config.gas_lift.max_gas_per_well);
        }
        // Best well absorbs the increments: 1700 − 3×50 = 1550 extra
        assert_eq!(result.allocations[0].recommended_gas_rate, 1600.0);
        assert!(result.allocations[2].at_minimum);
    }

    #[test]
    fn test_budget_capped_by_field_limit() {
        let result = allocate_wells(
            "f1",
            &make_field(),
            Some(50_000.0),
            &EngineConfig::default(),
            Utc::now(),
        );
        assert_eq!(result.total_available_gas, 10_000.0);
        // Three wells can take at most 3 × 2000
        assert_eq!(result.optimized_total_gas_rate, 6000.0);
        assert!(result.allocations.iter().all(|a| a.at_maximum));
    }

    #[test]
    fn test_tiny_budget_goes_to_best_well() {
        let result = allocate_wells("f1", &make_field(), Some(70.0), &EngineConfig::default(), Utc::now());
        let rates: Vec<f64> = result.allocations.iter().map(|a| a.recommended_gas_rate).collect();
        assert_eq!(rates, vec![50.0, 20.0, 0.0]);
    }

    #[test]
    fn test_confidence_small_field() {
        let result = allocate_wells("f1", &make_field(), None, &EngineConfig::default(), Utc::now());
        // < 5 wells and marginal spread > 0.5
        assert!((result.confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_recommendations_only_for_material_changes() {
        let config = EngineConfig::default();
        let wells = vec![make_well("steady", 500.0, 300.0)];
        // Budget equals current rate: 50 minimum + 9 × 50 increments = 500
        let result = allocate_wells("f1", &wells, None, &config, Utc::now());
        assert_eq!(result.allocations[0].recommended_gas_rate, 500.0);
        assert!(create_recommendations(&result, &config, Utc::now()).is_empty());

        let result = allocate_wells("f1", &make_field(), Some(1700.0), &config, Utc::now());
        let recs = create_recommendations(&result, &config, Utc::now());
        assert_eq!(recs.len(), 3);
        let top = &recs[0];
        assert_eq!(top.title, "Increase gas injection from 400 to 1600 MSCF/day");
        assert_eq!(top.unit, "MSCF/day");
        assert!(top.description.contains("Well priority rank: 1 of 3"));
        assert!(top.description.contains("Field: f1"));
        assert!(recs[2].description.contains("Well at minimum gas rate constraint"));
    }
}
