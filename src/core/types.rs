//! core::types
//!
//! Strong types for the resource graph domain.
//!
//! # Types
//!
//! - [`ResourceId`] - Opaque, non-empty identifier of a remote resource
//! - [`ResourceMetadata`] - Descriptive attributes resolved for a resource
//! - [`Node`] - A resolved resource as it appears in the graph document
//! - [`Edge`] - A directed reference from a parent resource to a dependency
//!
//! # Examples
//!
//! ```
//! use refgraph::core::types::{ResourceId, ResourceMetadata};
//!
//! let id = ResourceId::new("proc-1").unwrap();
//! let meta = ResourceMetadata {
//!     id: id.clone(),
//!     display_name: "Order Sync".to_string(),
//!     category: "Process".to_string(),
//!     version: Some(3),
//! };
//! let node = meta.to_node();
//! assert_eq!(node.id, id);
//!
//! assert!(ResourceId::new("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),
}

/// Identifier of a remote resource.
///
/// The value is opaque; the only rule enforced is that it is not blank.
/// Used as the deduplication key during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a new resource id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidResourceId` if the id is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidResourceId(
                "resource id cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Descriptive attributes of a resource, as resolved from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// The resource this metadata describes
    pub id: ResourceId,
    /// Human-readable name
    pub display_name: String,
    /// Resource category (e.g. "Process", "Connector")
    pub category: String,
    /// Version used for the reference query; `None` means references cannot be looked up
    pub version: Option<u64>,
}

impl ResourceMetadata {
    /// Project the metadata into its graph form. The version is dropped.
    pub fn to_node(&self) -> Node {
        Node {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            category: self.category.clone(),
        }
    }
}

/// A resolved resource in the graph document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: ResourceId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub category: String,
}

/// A directed reference from `source` to `target`.
///
/// The target may be missing from the node set when its metadata lookup
/// reported not-found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: ResourceId,
    pub target: ResourceId,
}

impl Edge {
    /// Create an edge from `source` to `target`.
    pub fn new(source: ResourceId, target: ResourceId) -> Self {
        Self { source, target }
    }

    /// Whether the edge points back at its own source.
    pub fn is_self_edge(&self) -> bool {
        self.source == self.target
    }
}
