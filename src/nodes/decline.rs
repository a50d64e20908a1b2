//! Decline analysis node

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{number, optional_number, CalculationNode, OutputOptions};
use crate::error::CalcError;
use crate::physics_engine::{DeclineCalculation, DeclineParameters, DeclineType};

/// Arps decline evaluated from `qi`, `Di` and one time-like field.
///
/// For `TIME_TO_RATE` and `EUR` the time field carries the target or
/// economic-limit rate instead of a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeclineNode {
    pub initial_rate_field: String,
    pub decline_rate_field: String,
    pub time_field: String,
    /// Read only for hyperbolic decline
    pub b_exponent_field: Option<String>,
    pub decline_type: DeclineType,
    pub calculation_type: DeclineCalculation,
    pub default_b_exponent: f64,
    pub output_field: String,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for DeclineNode {
    fn default() -> Self {
        Self {
            initial_rate_field: "qi".into(),
            decline_rate_field: "di".into(),
            time_field: "t".into(),
            b_exponent_field: Some("b".into()),
            decline_type: DeclineType::Exponential,
            calculation_type: DeclineCalculation::RateAtTime,
            default_b_exponent: 0.5,
            output_field: "declineResult".into(),
            output: OutputOptions::default(),
        }
    }
}

impl CalculationNode for DeclineNode {
    fn label(&self) -> &'static str {
        "decline analysis"
    }

    fn output_field(&self) -> &str {
        &self.output_field
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let qi = number(body, &self.initial_rate_field, "Initial Rate")?;
        let di = number(body, &self.decline_rate_field, "Decline Rate")?;
        let t = number(body, &self.time_field, "Time")?;
        if t < 0.0 {
            return Err(CalcError::negative("Time", t));
        }

        let supplied_b = optional_number(body, self.b_exponent_field.as_deref());
        let params = DeclineParameters::for_type(
            self.decline_type,
            qi,
            di,
            supplied_b,
            self.default_b_exponent,
        )?;
        params.evaluate(self.calculation_type, t)
    }
}
