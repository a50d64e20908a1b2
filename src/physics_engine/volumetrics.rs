//! Volumetrics and Petrophysics
//!
//! - Volumetric OOIP from area, thickness, porosity, saturation and Bo
//! - Archie water saturation from resistivity logs
//! - Shale volume from gamma ray index

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, ensure_range, ensure_range_above, CalcError};

/// Barrels per acre-foot.
pub const BARRELS_PER_ACRE_FOOT: f64 = 7758.0;
pub const METERS_TO_FEET: f64 = 3.28084;

/// Stock-tank oil initially in place.
///
/// Formula: OOIP = 7758 × A × h × φ × (1 − Sw) / Bo
///
/// Where:
/// - A = area (acres)
/// - h = net pay (m, converted to ft)
/// - φ, Sw = fractions
/// - Bo = rb/STB
pub fn volumetric_ooip(
    area_acres: f64,
    thickness_m: f64,
    porosity: f64,
    water_saturation: f64,
    bo: f64,
) -> Result<f64, CalcError> {
    ensure_range("Porosity", porosity, 0.0, 1.0)?;
    ensure_range("Water Saturation", water_saturation, 0.0, 1.0)?;
    ensure_positive("Bo", bo)?;
    ensure_positive("Area", area_acres)?;
    ensure_positive("Thickness", thickness_m)?;

    let thickness_ft = thickness_m * METERS_TO_FEET;
    Ok(BARRELS_PER_ACRE_FOOT * area_acres * thickness_ft * porosity * (1.0 - water_saturation) / bo)
}

/// Archie's tortuosity, cementation and saturation exponents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchieParameters {
    pub a: f64,
    pub m: f64,
    pub n: f64,
}

impl Default for ArchieParameters {
    fn default() -> Self {
        Self {
            a: 1.0,
            m: 2.0,
            n: 2.0,
        }
    }
}

/// Archie water saturation, clamped to [0, 1].
///
/// Formula: Sw = (a·Rw / (φ^m·Rt))^(1/n)
pub fn archie_water_saturation(
    porosity: f64,
    rw: f64,
    rt: f64,
    params: ArchieParameters,
) -> Result<f64, CalcError> {
    ensure_range_above("Porosity", porosity, 0.0, 1.0)?;
    ensure_positive("Rw", rw)?;
    ensure_positive("Rt", rt)?;

    let ratio = params.a * rw / (porosity.powf(params.m) * rt);
    Ok(ratio.powf(1.0 / params.n).clamp(0.0, 1.0))
}

/// Gamma-ray to shale-volume transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VshMethod {
    #[default]
    Linear,
    LarionovTertiary,
    LarionovOlder,
    Steiber,
    Clavier,
}

impl VshMethod {
    /// Shale volume from a gamma-ray index already clamped to [0, 1].
    pub fn apply(self, igr: f64) -> f64 {
        let vsh = match self {
            Self::Linear => igr,
            Self::LarionovTertiary => 0.083 * (2f64.powf(3.7 * igr) - 1.0),
            Self::LarionovOlder => 0.33 * (2f64.powf(2.0 * igr) - 1.0),
            Self::Steiber => igr / (3.0 - 2.0 * igr),
            Self::Clavier => {
                let term = 3.38 - (igr + 0.7).powi(2);
                if term > 0.0 {
                    1.7 - term.sqrt()
                } else {
                    1.0
                }
            }
        };
        vsh.clamp(0.0, 1.0)
    }
}

/// Gamma ray index IGR = (GR − GRclean)/(GRshale − GRclean), clamped to [0, 1].
pub fn gamma_ray_index(gr_log: f64, gr_clean: f64, gr_shale: f64) -> Result<f64, CalcError> {
    if gr_shale <= gr_clean {
        return Err(CalcError::Invalid(
            "GR Shale must be greater than GR Clean".into(),
        ));
    }
    Ok(((gr_log - gr_clean) / (gr_shale - gr_clean)).clamp(0.0, 1.0))
}

pub fn shale_volume(
    gr_log: f64,
    gr_clean: f64,
    gr_shale: f64,
    method: VshMethod,
) -> Result<f64, CalcError> {
    Ok(method.apply(gamma_ray_index(gr_log, gr_clean, gr_shale)?))
}
