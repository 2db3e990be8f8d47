//! core
//!
//! Domain types, the graph document, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ResourceId, ResourceMetadata, Node, Edge
//! - [`graph`] - The discovered graph and its serialized document
//! - [`config`] - Configuration schema, loading, and resolution
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - The graph document shape is a stable contract with the renderer

pub mod config;
pub mod graph;
pub mod types;
