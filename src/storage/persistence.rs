//! AttributeStore trait - pluggable asset attribute backend
//!
//! Optimizers and calculation nodes read well snapshots and write results
//! through this trait so the host platform's storage can be swapped in:
//! - `InMemoryStore`: in-memory store for tests and the CLI
//! - A platform adapter implements the same trait against its telemetry service

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::types::{Recommendation, WellOperatingPoint, FIELD_ID_KEY};

/// Attribute visibility scope on the host platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeScope {
    #[default]
    ServerScope,
    SharedScope,
    ClientScope,
}

impl std::fmt::Display for AttributeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServerScope => write!(f, "SERVER_SCOPE"),
            Self::SharedScope => write!(f, "SHARED_SCOPE"),
            Self::ClientScope => write!(f, "CLIENT_SCOPE"),
        }
    }
}

/// Trait for pluggable attribute backends
///
/// Implementations must be thread-safe (Send + Sync); optimizers may run
/// for several wells concurrently against one store.
pub trait AttributeStore: Send + Sync {
    /// Whether an asset (well or field) with this id is known
    fn exists(&self, asset_id: &str) -> bool;

    /// Latest attribute snapshot of a well
    fn operating_point(&self, asset_id: &str) -> Option<WellOperatingPoint>;

    /// Well ids belonging to a field, `None` when the field is unknown
    fn field_wells(&self, field_id: &str) -> Option<Vec<String>>;

    /// Store a numeric attribute
    fn save_attribute(
        &self,
        asset_id: &str,
        scope: AttributeScope,
        key: &str,
        value: f64,
    ) -> Result<(), PersistenceError>;

    /// Append a numeric time-series sample (epoch milliseconds)
    fn save_time_series(
        &self,
        asset_id: &str,
        ts_ms: i64,
        key: &str,
        value: f64,
    ) -> Result<(), PersistenceError>;

    /// Store a recommendation for operator review
    fn save_recommendation(&self, recommendation: &Recommendation) -> Result<(), PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("asset not found: {0}")]
    NotFound(String),
}

/// One stored time-series sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub asset_id: String,
    pub ts_ms: i64,
    pub key: String,
    pub value: f64,
}

/// JSON layout accepted by [`InMemoryStore::from_json`]
#[derive(Debug, Default, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    wells: HashMap<String, WellOperatingPoint>,
}

type AttributeKey = (String, AttributeScope, String);

/// In-memory attribute store
///
/// Thread-safe via `RwLock`. Not durable; data is lost on drop.
pub struct InMemoryStore {
    wells: RwLock<HashMap<String, WellOperatingPoint>>,
    fields: RwLock<Vec<String>>,
    attributes: RwLock<HashMap<AttributeKey, f64>>,
    time_series: RwLock<Vec<TimeSeriesSample>>,
    recommendations: RwLock<Vec<Recommendation>>,
    max_time_series: usize,
    max_recommendations: usize,
}

impl InMemoryStore {
    /// Create an empty store with default limits
    pub fn new() -> Self {
        Self {
            wells: RwLock::new(HashMap::new()),
            fields: RwLock::new(Vec::new()),
            attributes: RwLock::new(HashMap::new()),
            time_series: RwLock::new(Vec::new()),
            recommendations: RwLock::new(Vec::new()),
            max_time_series: 10_000,
            max_recommendations: 1000,
        }
    }

    /// Load fields and well snapshots from JSON:
    /// `{"fields": ["F1"], "wells": {"W1": {"values": {...}, "tags": {...}}}}`
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let store = Self::new();
        for field in snapshot.fields {
            store.add_field(&field)?;
        }
        for (asset_id, point) in snapshot.wells {
            store.add_well(&asset_id, point)?;
        }
        Ok(store)
    }

    pub fn add_field(&self, field_id: &str) -> Result<(), PersistenceError> {
        let mut fields = self
            .fields
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        if !fields.iter().any(|f| f == field_id) {
            fields.push(field_id.to_string());
        }
        Ok(())
    }

    /// Insert or replace a well snapshot
    pub fn add_well(&self, asset_id: &str, point: WellOperatingPoint) -> Result<(), PersistenceError> {
        self.wells
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?
            .insert(asset_id.to_string(), point);
        Ok(())
    }

    pub fn attribute(&self, asset_id: &str, scope: AttributeScope, key: &str) -> Option<f64> {
        let attributes = self.attributes.read().ok()?;
        attributes
            .get(&(asset_id.to_string(), scope, key.to_string()))
            .copied()
    }

    /// Samples for one asset and key, oldest first
    pub fn time_series(&self, asset_id: &str, key: &str) -> Vec<(i64, f64)> {
        self.time_series
            .read()
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.asset_id == asset_id && s.key == key)
                    .map(|s| (s.ts_ms, s.value))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stored recommendations, most recent first
    pub fn recommendations(&self, limit: usize) -> Vec<Recommendation> {
        self.recommendations
            .read()
            .map(|recs| recs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore for InMemoryStore {
    fn exists(&self, asset_id: &str) -> bool {
        let is_well = self
            .wells
            .read()
            .map(|wells| wells.contains_key(asset_id))
            .unwrap_or(false);
        is_well
            || self
                .fields
                .read()
                .map(|fields| fields.iter().any(|f| f == asset_id))
                .unwrap_or(false)
    }

    fn operating_point(&self, asset_id: &str) -> Option<WellOperatingPoint> {
        self.wells.read().ok()?.get(asset_id).cloned()
    }

    fn field_wells(&self, field_id: &str) -> Option<Vec<String>> {
        let known = self.fields.read().ok()?.iter().any(|f| f == field_id);
        if !known {
            return None;
        }
        let wells = self.wells.read().ok()?;
        let mut ids: Vec<String> = wells
            .iter()
            .filter(|(_, point)| point.tag(FIELD_ID_KEY) == Some(field_id))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Some(ids)
    }

    fn save_attribute(
        &self,
        asset_id: &str,
        scope: AttributeScope,
        key: &str,
        value: f64,
    ) -> Result<(), PersistenceError> {
        if !self.exists(asset_id) {
            return Err(PersistenceError::NotFound(asset_id.to_string()));
        }
        self.attributes
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?
            .insert((asset_id.to_string(), scope, key.to_string()), value);
        Ok(())
    }

    fn save_time_series(
        &self,
        asset_id: &str,
        ts_ms: i64,
        key: &str,
        value: f64,
    ) -> Result<(), PersistenceError> {
        if !self.exists(asset_id) {
            return Err(PersistenceError::NotFound(asset_id.to_string()));
        }
        let mut samples = self
            .time_series
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        samples.push(TimeSeriesSample {
            asset_id: asset_id.to_string(),
            ts_ms,
            key: key.to_string(),
            value,
        });

        // Evict oldest if over limit
        if samples.len() > self.max_time_series {
            samples.remove(0);
        }
        Ok(())
    }

    fn save_recommendation(&self, recommendation: &Recommendation) -> Result<(), PersistenceError> {
        let mut recs = self
            .recommendations
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        recs.push(recommendation.clone());

        if recs.len() > self.max_recommendations {
            recs.remove(0);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.add_field("field-a").unwrap();
        store
            .add_well(
                "well-2",
                WellOperatingPoint::new().with_tag(FIELD_ID_KEY, "field-a"),
            )
            .unwrap();
        store
            .add_well(
                "well-1",
                WellOperatingPoint::new().with_tag(FIELD_ID_KEY, "field-a"),
            )
            .unwrap();
        store
            .add_well("well-9", WellOperatingPoint::new().with("frequency", 50.0))
            .unwrap();
        store
    }

    #[test]
    fn test_exists_covers_wells_and_fields() {
        let store = make_store();
        assert!(store.exists("well-1"));
        assert!(store.exists("field-a"));
        assert!(!store.exists("nope"));
    }

    #[test]
    fn test_field_wells_sorted_and_filtered() {
        let store = make_store();
        assert_eq!(
            store.field_wells("field-a"),
            Some(vec!["well-1".to_string(), "well-2".to_string()])
        );
        assert_eq!(store.field_wells("field-b"), None);
    }

    #[test]
    fn test_attribute_round_trip_and_unknown_asset() {
        let store = make_store();
        store
            .save_attribute("well-1", AttributeScope::ServerScope, "qmax", 1234.5)
            .unwrap();
        assert_eq!(
            store.attribute("well-1", AttributeScope::ServerScope, "qmax"),
            Some(1234.5)
        );
        assert_eq!(store.attribute("well-1", AttributeScope::SharedScope, "qmax"), None);
        assert_eq!(
            store.save_attribute("ghost", AttributeScope::ServerScope, "qmax", 1.0),
            Err(PersistenceError::NotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_time_series_order() {
        let store = make_store();
        store.save_time_series("well-1", 100, "rate", 10.0).unwrap();
        store.save_time_series("well-1", 200, "rate", 9.0).unwrap();
        store.save_time_series("well-2", 150, "rate", 1.0).unwrap();
        assert_eq!(store.time_series("well-1", "rate"), vec![(100, 10.0), (200, 9.0)]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "fields": ["north"],
            "wells": {
                "w1": {"values": {"frequency": 48.0}, "tags": {"field_id": "north"}}
            }
        }"#;
        let store = InMemoryStore::from_json(json).unwrap();
        assert_eq!(store.field_wells("north"), Some(vec!["w1".to_string()]));
        assert_eq!(
            store.operating_point("w1").map(|p| p.get_or("frequency", 0.0)),
            Some(48.0)
        );
        assert!(InMemoryStore::from_json("not json").is_err());
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn AttributeStore> = Box::new(make_store());
        assert_eq!(store.backend_name(), "InMemory");
        assert!(store.operating_point("well-9").is_some());
    }
}
