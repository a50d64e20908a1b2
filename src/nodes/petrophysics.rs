//! Volumetric and log-derived nodes: OOIP, Archie Sw and shale volume

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{number, optional_number, CalculationNode, OutputOptions};
use crate::error::CalcError;
use crate::physics_engine::volumetrics::{archie_water_saturation, shale_volume, volumetric_ooip};
use crate::physics_engine::{ArchieParameters, VshMethod};

// ============================================================================
// OOIP
// ============================================================================

/// Volumetric original oil in place (STB).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OoipNode {
    pub area_acres_field: String,
    pub thickness_m_field: String,
    pub porosity_field: String,
    pub water_saturation_field: String,
    pub bo_field: String,
    pub output_field: String,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for OoipNode {
    fn default() -> Self {
        Self {
            area_acres_field: "areaAcres".into(),
            thickness_m_field: "thicknessM".into(),
            porosity_field: "porosity".into(),
            water_saturation_field: "waterSaturation".into(),
            bo_field: "bo".into(),
            output_field: "ooip".into(),
            output: OutputOptions::default(),
        }
    }
}

impl CalculationNode for OoipNode {
    fn label(&self) -> &'static str {
        "OOIP"
    }

    fn output_field(&self) -> &str {
        &self.output_field
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        volumetric_ooip(
            number(body, &self.area_acres_field, "Area")?,
            number(body, &self.thickness_m_field, "Thickness")?,
            number(body, &self.porosity_field, "Porosity")?,
            number(body, &self.water_saturation_field, "Water Saturation")?,
            number(body, &self.bo_field, "Bo")?,
        )
    }
}

// ============================================================================
// Water saturation
// ============================================================================

/// Archie water saturation.
///
/// Each Archie constant comes from its body field when numeric, else from
/// the node's configured value, else from the clean-sand default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwNode {
    pub porosity_field: String,
    pub rw_field: String,
    pub rt_field: String,
    pub tortuosity_factor_field: Option<String>,
    pub cementation_exponent_field: Option<String>,
    pub saturation_exponent_field: Option<String>,
    pub tortuosity_factor: Option<f64>,
    pub cementation_exponent: Option<f64>,
    pub saturation_exponent: Option<f64>,
    pub output_field: String,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for SwNode {
    fn default() -> Self {
        Self {
            porosity_field: "porosity".into(),
            rw_field: "rw".into(),
            rt_field: "rt".into(),
            tortuosity_factor_field: Some("a".into()),
            cementation_exponent_field: Some("m".into()),
            saturation_exponent_field: Some("n".into()),
            tortuosity_factor: None,
            cementation_exponent: None,
            saturation_exponent: None,
            output_field: "sw".into(),
            output: OutputOptions::default(),
        }
    }
}

impl SwNode {
    /// Archie constants resolved for this body.
    pub fn archie_parameters(&self, body: &Map<String, Value>) -> ArchieParameters {
        let defaults = ArchieParameters::default();
        let resolve = |field: &Option<String>, configured: Option<f64>, default: f64| {
            optional_number(body, field.as_deref())
                .or(configured)
                .unwrap_or(default)
        };
        ArchieParameters {
            a: resolve(&self.tortuosity_factor_field, self.tortuosity_factor, defaults.a),
            m: resolve(&self.cementation_exponent_field, self.cementation_exponent, defaults.m),
            n: resolve(&self.saturation_exponent_field, self.saturation_exponent, defaults.n),
        }
    }
}

impl CalculationNode for SwNode {
    fn label(&self) -> &'static str {
        "Sw"
    }

    fn output_field(&self) -> &str {
        &self.output_field
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let porosity = number(body, &self.porosity_field, "Porosity")?;
        let rw = number(body, &self.rw_field, "Rw")?;
        let rt = number(body, &self.rt_field, "Rt")?;
        archie_water_saturation(porosity, rw, rt, self.archie_parameters(body))
    }
}

// ============================================================================
// Shale volume
// ============================================================================

/// Shale volume from the gamma-ray log, clamped to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VshNode {
    pub gr_log_field: String,
    pub gr_clean_field: String,
    pub gr_shale_field: String,
    pub method: VshMethod,
    pub output_field: String,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for VshNode {
    fn default() -> Self {
        Self {
            gr_log_field: "grLog".into(),
            gr_clean_field: "grClean".into(),
            gr_shale_field: "grShale".into(),
            method: VshMethod::Linear,
            output_field: "vsh".into(),
            output: OutputOptions::default(),
        }
    }
}

impl CalculationNode for VshNode {
    fn label(&self) -> &'static str {
        "Vsh"
    }

    fn output_field(&self) -> &str {
        &self.output_field
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        shale_volume(
            number(body, &self.gr_log_field, "GR Log")?,
            number(body, &self.gr_clean_field, "GR Clean")?,
            number(body, &self.gr_shale_field, "GR Shale")?,
            self.method,
        )
    }
}
