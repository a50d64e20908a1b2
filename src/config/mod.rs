//! Engine Configuration Module
//!
//! Optimizer limits and model defaults loaded from TOML. The configuration is
//! an ordinary value: load it once and pass `&EngineConfig` to every call.
//!
//! ## Loading Order
//!
//! 1. `RESERVOIR_OPT_CONFIG` environment variable (path to TOML file)
//! 2. `optimizer_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ```ignore
//! let config = EngineConfig::load();
//! let result = esp::optimize(&store, "well-7", &config);
//! ```

mod engine_config;
pub mod validation;

pub use engine_config::*;
