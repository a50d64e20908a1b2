//! Calculation Nodes - message-body adapters around the reservoir models
//!
//! Each node reads named numeric fields from a JSON object, runs one model
//! and writes a single rounded result back:
//!
//! ## Nodes
//!
//! - [`DeclineNode`]: Arps rate / cumulative / time-to-rate / EUR
//! - [`IprNode`]: Vogel, Darcy, Fetkovich or Jones flow rate
//! - [`PvtNode`]: black-oil correlation for one fluid property
//! - [`MaterialBalanceNode`]: Havlena-Odeh terms and drive indices
//! - [`OoipNode`], [`SwNode`], [`VshNode`]: volumetrics and petrophysics
//!
//! ## Output
//!
//! The rounded result is written to `output_field`, optionally copied into
//! metadata as a string, and optionally persisted as an attribute or, when
//! attribute saving is off, as a time-series sample. The input body is never
//! modified: on any failure the caller still holds the original message.

mod decline;
mod ipr;
mod material_balance;
mod petrophysics;
mod pvt;

pub use decline::DeclineNode;
pub use ipr::IprNode;
pub use material_balance::{MaterialBalanceNode, MbeCalculation};
pub use petrophysics::{OoipNode, SwNode, VshNode};
pub use pvt::PvtNode;

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::CalcError;
use crate::physics_engine::round_half_up;
use crate::storage::{AttributeScope, AttributeStore, PersistenceError};

/// Node failures. The message body is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error("Message body is not a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Calculation(#[from] CalcError),

    #[error("Failed to save {label} result: {source}")]
    Persistence {
        label: &'static str,
        #[source]
        source: PersistenceError,
    },
}

/// Updated message produced by a successful node run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutput {
    pub body: Value,
    pub metadata: HashMap<String, String>,
    /// Rounded result as written to the body
    pub value: f64,
}

// ============================================================================
// Output options
// ============================================================================

/// Where the result goes besides the message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputOptions {
    pub add_to_metadata: bool,
    pub save_as_attribute: bool,
    /// Only honoured when `save_as_attribute` is off
    pub save_as_telemetry: bool,
    pub attribute_scope: AttributeScope,
    /// Decimal places, rounded half-up
    pub result_precision: u32,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            add_to_metadata: false,
            save_as_attribute: true,
            save_as_telemetry: false,
            attribute_scope: AttributeScope::ServerScope,
            result_precision: 2,
        }
    }
}

impl OutputOptions {
    /// Metadata, body only.
    pub fn transient() -> Self {
        Self {
            save_as_attribute: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// Node trait
// ============================================================================

/// A single-output calculation over a JSON message body.
pub trait CalculationNode {
    /// Short name used in logs and persistence errors (e.g. "decline analysis")
    fn label(&self) -> &'static str;

    /// Body field receiving the result
    fn output_field(&self) -> &str;

    fn output_options(&self) -> &OutputOptions;

    /// Compute the unrounded result from the body fields.
    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError>;

    /// Evaluate, round, persist and return the updated message.
    ///
    /// Persistence happens before the body is rewritten, so a storage failure
    /// leaves no partially updated output behind.
    fn process(
        &self,
        body: &Value,
        store: &dyn AttributeStore,
        asset_id: &str,
    ) -> Result<NodeOutput, NodeError> {
        let object = body.as_object().ok_or(NodeError::NotAnObject)?;
        let raw = self.evaluate(object)?;

        let options = self.output_options();
        let field = self.output_field();
        let value = round_half_up(raw, options.result_precision);

        debug!(
            asset_id = %asset_id,
            node = self.label(),
            field,
            value,
            "Node result calculated"
        );

        persist(self.label(), options, field, value, store, asset_id)?;

        let mut updated = object.clone();
        updated.insert(field.to_string(), Value::from(value));

        let mut metadata = HashMap::new();
        if options.add_to_metadata {
            let precision = options.result_precision as usize;
            metadata.insert(field.to_string(), format!("{value:.precision$}"));
        }

        Ok(NodeOutput {
            body: Value::Object(updated),
            metadata,
            value,
        })
    }
}

fn persist(
    label: &'static str,
    options: &OutputOptions,
    field: &str,
    value: f64,
    store: &dyn AttributeStore,
    asset_id: &str,
) -> Result<(), NodeError> {
    let saved = if options.save_as_attribute {
        store.save_attribute(asset_id, options.attribute_scope, field, value)
    } else if options.save_as_telemetry {
        store.save_time_series(asset_id, Utc::now().timestamp_millis(), field, value)
    } else {
        return Ok(());
    };
    saved.map_err(|source| NodeError::Persistence { label, source })
}

// ============================================================================
// Body field helpers
// ============================================================================

/// Read a required numeric field. Null counts as missing.
pub(crate) fn number(body: &Map<String, Value>, field: &str, display: &str) -> Result<f64, CalcError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(CalcError::missing(display, field)),
        Some(value) => value.as_f64().ok_or_else(|| CalcError::NotNumeric {
            display: display.to_string(),
            field: field.to_string(),
        }),
    }
}

/// Read an optional numeric field; absent or non-numeric values give `None`.
pub(crate) fn optional_number(body: &Map<String, Value>, field: Option<&str>) -> Option<f64> {
    field
        .filter(|f| !f.is_empty())
        .and_then(|f| body.get(f))
        .and_then(Value::as_f64)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::storage::InMemoryStore;
    use crate::types::WellOperatingPoint;

    pub const WELL: &str = "well-1";

    pub fn make_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_well(WELL, WellOperatingPoint::new())
            .expect("well registered");
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_reads_and_rejects() {
        let body = json!({"qi": 100, "name": "x", "gone": null});
        let body = body.as_object().unwrap();

        assert_eq!(number(body, "qi", "Initial Rate").unwrap(), 100.0);
        assert_eq!(
            number(body, "name", "Initial Rate").unwrap_err().to_string(),
            "Initial Rate field 'name' must be a number"
        );
        assert_eq!(
            number(body, "gone", "Initial Rate").unwrap_err().to_string(),
            "Initial Rate field 'gone' not found in message body"
        );
        assert_eq!(
            number(body, "missing", "Time").unwrap_err().to_string(),
            "Time field 'missing' not found in message body"
        );
    }

    #[test]
    fn test_optional_number() {
        let body = json!({"b": 0.3, "s": "0.3"});
        let body = body.as_object().unwrap();

        assert_eq!(optional_number(body, Some("b")), Some(0.3));
        assert_eq!(optional_number(body, Some("s")), None);
        assert_eq!(optional_number(body, Some("")), None);
        assert_eq!(optional_number(body, None), None);
    }

    #[test]
    fn test_output_options_defaults() {
        let options: OutputOptions = serde_json::from_value(json!({})).unwrap();
        assert!(options.save_as_attribute);
        assert!(!options.save_as_telemetry);
        assert_eq!(options.attribute_scope, AttributeScope::ServerScope);
        assert_eq!(options.result_precision, 2);

        let options: OutputOptions =
            serde_json::from_value(json!({"attributeScope": "SHARED_SCOPE", "resultPrecision": 4}))
                .unwrap();
        assert_eq!(options.attribute_scope, AttributeScope::SharedScope);
        assert_eq!(options.result_precision, 4);
    }
}
