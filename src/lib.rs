//! Reservoir Optimizer: reservoir engineering models and artificial-lift optimization
//!
//! Closed-form petroleum engineering calculations plus constraint-based
//! optimizers that turn well measurements into operator recommendations.
//!
//! ## Architecture
//!
//! - **Physics Engine**: Arps decline, PVT correlations, IPR, Havlena-Odeh
//!   material balance, volumetrics and petrophysics
//! - **Optimization**: ESP frequency, gas-lift allocation, PCP speed and
//!   rod-pump speed/stroke, with recommendation packaging
//! - **Nodes**: JSON message-body adapters that run one model and persist
//!   the rounded result
//! - **Storage**: `AttributeStore` trait and an in-memory backend
//! - **Config**: `EngineConfig` TOML limits passed explicitly to every call

pub mod config;
pub mod error;
pub mod nodes;
pub mod optimization;
pub mod physics_engine;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export errors
pub use error::{CalcError, ErrorBody};

// Re-export commonly used types
pub use types::{
    GasLiftAllocationResult, LiftType, LimitingConstraint, OptimizationResult,
    OptimizationSkipReason, Recommendation, RecommendationStatus, RecommendationType,
    WellAllocation, WellOperatingPoint,
};

// Re-export nodes
pub use nodes::{
    CalculationNode, DeclineNode, IprNode, MaterialBalanceNode, NodeError, NodeOutput, OoipNode,
    OutputOptions, PvtNode, SwNode, VshNode,
};

// Re-export storage
pub use storage::{AttributeScope, AttributeStore, InMemoryStore, PersistenceError};
