//! Artificial-Lift Optimization Engine
//!
//! Turns the latest well measurements into bounded, confidence-scored setpoint
//! recommendations. Entirely algorithmic and synchronous.
//!
//! ## Optimizers
//!
//! - [`esp`]: drive frequency toward target motor load
//! - [`pcp`]: rotor speed toward target torque and the optimal efficiency point
//! - [`rod_pump`]: strokes per minute (and stroke length) from pump fillage
//! - [`gas_lift`]: field gas budget distributed by marginal oil rate
//!
//! Every single-well optimizer follows the same steps: read inputs, apply a
//! directional adjustment, record the limiting constraint, clamp to the
//! configured band, project expected values, then test significance and
//! score confidence. Significant results become a [`Recommendation`] through
//! [`create_recommendation`].

mod confidence;
pub mod esp;
pub mod gas_lift;
pub mod pcp;
mod recommendation;
pub mod rod_pump;

pub use confidence::priority_for_percent;
pub use recommendation::{create_recommendation, expire_due, recommendation_title};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::storage::AttributeStore;
use crate::types::{LiftType, OptimizationResult, OptimizationSkipReason, WellOperatingPoint};

#[cfg(doc)]
use crate::types::Recommendation;

/// Fetch a well snapshot and apply the data-quality gate.
pub fn load_point(
    store: &dyn AttributeStore,
    asset_id: &str,
    config: &EngineConfig,
) -> Result<WellOperatingPoint, OptimizationSkipReason> {
    if !store.exists(asset_id) {
        return Err(OptimizationSkipReason::UnknownAsset);
    }
    let point = store
        .operating_point(asset_id)
        .ok_or(OptimizationSkipReason::UnknownAsset)?;
    if point.data_quality() < config.general.min_data_quality {
        return Err(OptimizationSkipReason::LowDataQuality);
    }
    Ok(point)
}

/// Run the single-well optimizer for `lift`.
///
/// Gas lift is field-wide; use [`gas_lift::allocate`] for it.
pub fn optimize(
    lift: LiftType,
    store: &dyn AttributeStore,
    asset_id: &str,
    config: &EngineConfig,
) -> Option<OptimizationResult> {
    let point = match load_point(store, asset_id, config) {
        Ok(point) => point,
        Err(reason) => {
            debug!(asset_id = %asset_id, lift = %lift, reason = %reason, "Optimization skipped");
            return None;
        }
    };

    let result = match lift {
        LiftType::Esp => esp::optimize_point(asset_id, &point, config),
        LiftType::Pcp => pcp::optimize_point(asset_id, &point, config),
        LiftType::RodPump => rod_pump::optimize_point(asset_id, &point, config),
        LiftType::GasLift => {
            warn!(asset_id = %asset_id, "Gas lift is optimized per field, not per well");
            return None;
        }
    };

    debug!(
        asset_id = %asset_id,
        lift = %lift,
        current = result.current_value,
        recommended = result.recommended_value,
        significant = result.is_significant,
        "Optimization complete"
    );
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::types::DATA_QUALITY_KEY;

    fn make_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_well("good", WellOperatingPoint::new().with("frequency", 50.0))
            .unwrap();
        store
            .add_well(
                "noisy",
                WellOperatingPoint::new()
                    .with("frequency", 50.0)
                    .with(DATA_QUALITY_KEY, 0.4),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_load_point_gates() {
        let store = make_store();
        let config = EngineConfig::default();
        assert!(load_point(&store, "good", &config).is_ok());
        assert_eq!(
            load_point(&store, "missing", &config),
            Err(OptimizationSkipReason::UnknownAsset)
        );
        assert_eq!(
            load_point(&store, "noisy", &config),
            Err(OptimizationSkipReason::LowDataQuality)
        );
    }

    #[test]
    fn test_dispatch_by_lift_type() {
        let store = make_store();
        let config = EngineConfig::default();
        let result = optimize(LiftType::Esp, &store, "good", &config).unwrap();
        assert_eq!(result.lift_type, LiftType::Esp);
        assert!(optimize(LiftType::GasLift, &store, "good", &config).is_none());
        assert!(optimize(LiftType::Pcp, &store, "missing", &config).is_none());
    }
}
