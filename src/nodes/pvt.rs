//! PVT correlation node

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{number, CalculationNode, OutputOptions};
use crate::error::CalcError;
use crate::physics_engine::pvt::{calculate, required_inputs};
use crate::physics_engine::{PvtCorrelation, PvtInput, PvtInputs, PvtProperty};

/// One fluid property from a black-oil correlation.
///
/// Only the inputs the (property, correlation) pair needs are read, so a
/// body for a dead-oil viscosity does not have to carry Rs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PvtNode {
    #[serde(alias = "propertyToCalculate")]
    pub property: PvtProperty,
    pub correlation: PvtCorrelation,
    pub rs_field: String,
    pub gas_gravity_field: String,
    pub oil_gravity_field: String,
    pub api_gravity_field: String,
    pub temperature_field: String,
    pub pressure_field: String,
    pub output_field: String,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for PvtNode {
    fn default() -> Self {
        Self {
            property: PvtProperty::BubblePoint,
            correlation: PvtCorrelation::Standing,
            rs_field: PvtInput::Rs.default_key().into(),
            gas_gravity_field: PvtInput::GasGravity.default_key().into(),
            oil_gravity_field: PvtInput::OilGravity.default_key().into(),
            api_gravity_field: PvtInput::ApiGravity.default_key().into(),
            temperature_field: PvtInput::Temperature.default_key().into(),
            pressure_field: PvtInput::Pressure.default_key().into(),
            output_field: "bubblePoint".into(),
            output: OutputOptions::default(),
        }
    }
}

impl PvtNode {
    /// Body field configured for an input.
    pub fn field_for(&self, input: PvtInput) -> &str {
        match input {
            PvtInput::Rs => &self.rs_field,
            PvtInput::GasGravity => &self.gas_gravity_field,
            PvtInput::OilGravity => &self.oil_gravity_field,
            PvtInput::ApiGravity => &self.api_gravity_field,
            PvtInput::Temperature => &self.temperature_field,
            PvtInput::Pressure => &self.pressure_field,
        }
    }
}

impl CalculationNode for PvtNode {
    fn label(&self) -> &'static str {
        "PVT correlation"
    }

    fn output_field(&self) -> &str {
        &self.output_field
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let mut inputs = PvtInputs::default();
        for &input in required_inputs(self.property, self.correlation)? {
            let value = number(body, self.field_for(input), input.display_name())?;
            inputs.set(input, value);
        }
        calculate(self.property, self.correlation, &inputs)
    }
}
