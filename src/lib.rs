//! Refgraph - discover the dependency graph behind a remote resource
//!
//! Refgraph starts at a root resource in a remote metadata service, follows
//! the references each resource declares, and writes the resulting directed
//! graph as a JSON document of nodes and edges.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Concurrent, deduplicated discovery from a root
//! - [`resolve`] - Per-resource metadata and reference lookups
//! - [`remote`] - Service abstraction, HTTP client, retries, and a mock
//! - [`core`] - Domain types, the graph document, and configuration
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every resource is resolved at most once per run
//! 2. Traversal terminates on cycles and self-references
//! 3. Resources that do not exist are absent from `nodes`; edges to them remain
//! 4. Transient remote failures are retried with exponential backoff
//! 5. The written document is identical for identical remote data

pub mod cli;
pub mod core;
pub mod engine;
pub mod remote;
pub mod resolve;
pub mod ui;
