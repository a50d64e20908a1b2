//! Asset Attribute Storage
//!
//! Optimizers and calculation nodes never talk to a database directly. They
//! read well snapshots and persist results through [`AttributeStore`].

mod persistence;

pub use persistence::{
    AttributeScope, AttributeStore, InMemoryStore, PersistenceError, TimeSeriesSample,
};
