//! Types library for the order metrics pipeline
//!
//! This library provides all core type definitions shared across the
//! pipeline, ensuring type safety and deterministic serialization of
//! the published metric documents.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, BuyerId, VendorId, MarketCode)
//! - `order`: Canonical order records and source taxonomies
//! - `metrics`: Derived metric documents (daily, rolling, snapshot)
//! - `errors`: Error taxonomy

// Public modules
pub mod errors;
pub mod ids;
pub mod metrics;
pub mod order;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::metrics::*;
    pub use crate::order::*;
}
