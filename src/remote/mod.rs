//! remote
//!
//! Access to the remote metadata service.
//!
//! # Architecture
//!
//! The [`ResourceService`] trait is the seam between discovery and the
//! network. Resolvers never call it directly; they go through a
//! [`ResilientClient`], which owns retry and backoff.
//!
//! # Modules
//!
//! - `traits`: `ResourceService` trait, wire types, and `RemoteError`
//! - [`http`]: HTTP implementation using `reqwest`
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `retry`: Bounded exponential-backoff retry
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use refgraph::remote::{http::HttpResourceService, ResilientClient, ResourceService, RetryPolicy};
//!
//! let service: Arc<dyn ResourceService> = Arc::new(HttpResourceService::new(&settings)?);
//! let client = ResilientClient::new(RetryPolicy::default());
//! let meta = client
//!     .execute("metadata", || service.fetch_metadata(&id))
//!     .await?;
//! ```

pub mod http;
pub mod mock;
mod retry;
mod traits;

pub use retry::{PolicyBackoff, ResilientClient, RetryPolicy};
pub use traits::*;
