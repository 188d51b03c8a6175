//! Unique identifier types for pipeline entities
//!
//! All identifiers originate in the upstream warehouse as opaque strings,
//! so they are modeled as string newtypes rather than generated UUIDs.
//! Wrapping them keeps order/buyer/vendor keys from being mixed up at
//! call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order
///
/// The warehouse guarantees uniqueness per logical order; the append-only
/// recent-activity source may still carry several rows per id until the
/// reconciler collapses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Unique identifier for a buying account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerId(String);

impl BuyerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuyerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BuyerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Unique identifier for a selling account (POC)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(String);

impl VendorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VendorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Market identifier (ISO country code)
///
/// Format: two-letter uppercase code (e.g., "PH", "VN"). Normalized to
/// uppercase on construction so lookups never depend on caller casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketCode(String);

impl MarketCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used for output filenames.
    pub fn file_stem(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for MarketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarketCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
