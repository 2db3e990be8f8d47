//! engine
//!
//! Orchestrates discovery: resolve the root, expand references, prune what
//! does not exist, and assemble the graph document.
//!
//! # Architecture
//!
//! The engine sits between the CLI and the resolvers:
//!
//! ```text
//! cli ──► DiscoveryEngine ──► MetadataResolver ──┐
//!                        └──► ReferenceResolver ─┴─► ResilientClient ──► ResourceService
//! ```
//!
//! It takes an explicit [`RunConfig`](crate::core::config::RunConfig) or its
//! parts; it never reads the environment or config files itself.
//!
//! # Invariants
//!
//! - Each resource id is resolved at most once per run
//! - An id is claimed before any of its references are expanded, so cycles
//!   and self-references terminate
//! - Not-found resources are pruned from the nodes, while the edges that
//!   point at them are kept
//! - A failed reference query never aborts the run
//! - Output order is a function of remote data only
//!
//! # Example
//!
//! ```ignore
//! let service = Arc::new(HttpResourceService::new(&run.remote)?);
//! let engine = DiscoveryEngine::from_config(service, &run);
//! let graph = engine.discover(&run.root_id).await?;
//! graph.write_to(&run.output, false)?;
//! ```

pub mod discover;

pub use discover::{Discovery, DiscoveryEngine, DiscoveryError, DiscoveryOptions, DiscoveryStats};
