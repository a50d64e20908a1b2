//! Reservoir Physics Engine
//!
//! Deterministic closed-form reservoir engineering models:
//!
//! ## Models
//!
//! - `decline`: Arps exponential / hyperbolic / harmonic decline curves
//! - `pvt`: bubble point, oil FVF, dead-oil viscosity and solution GOR correlations
//! - `ipr`: Vogel, Darcy, Fetkovich and Jones inflow performance
//! - `material_balance`: Havlena-Odeh material balance and drive indices
//! - `volumetrics`: volumetric OOIP, Archie saturation and shale volume
//!
//! Every model is a pure function of its inputs. Results that are persisted
//! or compared across platforms go through [`round_half_up`].

pub mod decline;
pub mod ipr;
pub mod material_balance;
pub mod pvt;
pub mod volumetrics;

pub use decline::{DeclineCalculation, DeclineParameters, DeclineType, ForecastPoint};
pub use ipr::{CurvePoint, IprEquation, IprMethod, IprModel, OperatingPoint};
pub use material_balance::{
    DataPoint, DriveIndices, DriveMechanism, FitQuality, HavlenaOdehResult, InitialConditions,
    MaterialBalanceStudy, MbeTerms, PlotType,
};
pub use pvt::{PvtCorrelation, PvtInput, PvtInputs, PvtProperty};
pub use volumetrics::{ArchieParameters, VshMethod};

/// Round half away from zero to `scale` decimal places.
///
/// Values whose decimal representation ends exactly on a 5 (e.g. 2.675)
/// often sit a hair below the midpoint in binary; a few ULPs of nudge makes
/// them round the way the decimal literal reads.
pub fn round_half_up(value: f64, scale: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(scale as i32);
    let scaled = value * factor;
    let nudged = scaled + scaled.signum() * scaled.abs() * f64::EPSILON * 4.0;
    nudged.round() / factor
}

/// Percentage change from `current` to `expected`, 0 when `current` is 0.
pub fn percent_change(current: f64, expected: f64) -> f64 {
    if current == 0.0 {
        return 0.0;
    }
    round_half_up((expected - current) / current * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up_midpoints() {
        assert!((round_half_up(2.675, 2) - 2.68).abs() < 1e-12);
        assert!((round_half_up(1.005, 2) - 1.01).abs() < 1e-12);
        assert!((round_half_up(-2.5, 0) - -3.0).abs() < 1e-12);
        assert!((round_half_up(1234.5678, 0) - 1235.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_half_up_passes_through_non_finite() {
        assert!(round_half_up(f64::NAN, 2).is_nan());
        assert!(round_half_up(f64::INFINITY, 2).is_infinite());
    }

    #[test]
    fn test_percent_change_zero_base() {
        assert_eq!(percent_change(0.0, 100.0), 0.0);
        assert!((percent_change(500.0, 550.0) - 10.0).abs() < 1e-9);
    }
}
