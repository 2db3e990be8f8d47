//! resolve
//!
//! Per-resource lookups used by discovery.
//!
//! # Modules
//!
//! - [`metadata`] - Resource metadata, with not-found mapped to absence
//! - [`references`] - Direct references, with query failures recovered as empty
//!
//! Both resolvers wrap every remote call in a
//! [`ResilientClient`](crate::remote::ResilientClient) and are cheap to
//! clone into spawned tasks.

pub mod metadata;
pub mod references;

pub use metadata::MetadataResolver;
pub use references::ReferenceResolver;
