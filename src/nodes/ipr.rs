//! IPR flow-rate node

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{number, optional_number, CalculationNode, OutputOptions};
use crate::error::CalcError;
use crate::physics_engine::ipr::validate_pressures;
use crate::physics_engine::{IprEquation, IprMethod};

/// Fetkovich exponent used when the body carries none.
const DEFAULT_FETKOVICH_N: f64 = 1.0;

/// Flow rate at the body's flowing pressure for one IPR equation. The
/// equation's coefficients come from the body as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IprNode {
    pub method: IprMethod,
    pub reservoir_pressure_field: String,
    pub flowing_pressure_field: String,
    pub qmax_field: String,
    pub productivity_index_field: String,
    pub c_field: String,
    /// Optional; defaults to n = 1
    pub n_field: String,
    pub a_coeff_field: String,
    pub b_coeff_field: String,
    pub output_field: String,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for IprNode {
    fn default() -> Self {
        Self {
            method: IprMethod::Vogel,
            reservoir_pressure_field: "reservoirPressure".into(),
            flowing_pressure_field: "flowingPressure".into(),
            qmax_field: "qmax".into(),
            productivity_index_field: "productivityIndex".into(),
            c_field: "c".into(),
            n_field: "n".into(),
            a_coeff_field: "a".into(),
            b_coeff_field: "b".into(),
            output_field: "flowRate".into(),
            output: OutputOptions::default(),
        }
    }
}

impl IprNode {
    fn equation(&self, body: &Map<String, Value>) -> Result<IprEquation, CalcError> {
        Ok(match self.method {
            IprMethod::Vogel => IprEquation::Vogel {
                qmax: number(body, &self.qmax_field, "Qmax")?,
            },
            IprMethod::Darcy => IprEquation::Darcy {
                productivity_index: number(body, &self.productivity_index_field, "Productivity Index")?,
            },
            IprMethod::Fetkovich => IprEquation::Fetkovich {
                c: number(body, &self.c_field, "C coefficient")?,
                n: optional_number(body, Some(&self.n_field)).unwrap_or(DEFAULT_FETKOVICH_N),
            },
            IprMethod::Jones => IprEquation::Jones {
                a: number(body, &self.a_coeff_field, "a coefficient")?,
                b: number(body, &self.b_coeff_field, "b coefficient")?,
            },
        })
    }
}

impl CalculationNode for IprNode {
    fn label(&self) -> &'static str {
        "IPR calculation"
    }

    fn output_field(&self) -> &str {
        &self.output_field
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let pr = number(body, &self.reservoir_pressure_field, "Reservoir Pressure")?;
        let pwf = number(body, &self.flowing_pressure_field, "Flowing Pressure")?;
        validate_pressures(pr, pwf)?;

        self.equation(body)?.flow_rate(pr, pwf)
    }
}
