//! Shared data structures for production optimization
//!
//! - WellOperatingPoint: latest attribute snapshot of a well
//! - OptimizationResult / GasLiftAllocationResult: optimizer outputs
//! - Recommendation: operator-facing action with approval lifecycle

mod operating_point;
mod optimization;
mod recommendation;

pub use operating_point::*;
pub use optimization::*;
pub use recommendation::*;
