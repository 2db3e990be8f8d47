//! remote::mock
//!
//! In-memory `ResourceService` for deterministic testing.
//!
//! # Design
//!
//! The mock stores resources in memory, can be scripted to fail specific
//! calls, records every operation, and tracks how many calls were in flight
//! at once so concurrency limits can be asserted.
//!
//! # Example
//!
//! ```
//! use refgraph::remote::mock::MockService;
//! use refgraph::remote::{RemoteError, ResourceService};
//! use refgraph::core::types::ResourceId;
//!
//! # tokio_test::block_on(async {
//! let service = MockService::new()
//!     .with_resource("R", "Root", "Process", Some(1), &["A", "B"])
//!     .with_resource("A", "A", "Connector", Some(1), &[]);
//!
//! let root = ResourceId::new("R").unwrap();
//! let meta = service.fetch_metadata(&root).await.unwrap();
//! assert_eq!(meta.name, "Root");
//!
//! let refs = service.query_references(&root, 1).await.unwrap();
//! assert_eq!(refs.raw_ids().collect::<Vec<_>>(), vec!["A", "B"]);
//!
//! let missing = ResourceId::new("B").unwrap();
//! assert!(service.fetch_metadata(&missing).await.unwrap_err().is_not_found());
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{
    ReferenceEntry, ReferenceGroup, ReferenceQueryResponse, RemoteError, RemoteResource,
    ResourceService,
};
use crate::core::types::ResourceId;

/// Mock service for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockService {
    inner: Arc<Mutex<MockServiceInner>>,
}

#[derive(Debug, Default)]
struct MockServiceInner {
    /// Stored resources by id.
    resources: HashMap<String, MockResource>,
    /// One-shot failures, consumed front to back before normal behavior resumes.
    scripted: HashMap<(Call, String), VecDeque<RemoteError>>,
    /// Failures returned on every call.
    always: HashMap<(Call, String), RemoteError>,
    /// Artificial latency per call.
    latency: Duration,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Debug, Clone)]
struct MockResource {
    name: String,
    category: String,
    version: Option<u64>,
    groups: Vec<Vec<String>>,
}

/// Which service call a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Metadata,
    References,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    FetchMetadata { id: String },
    QueryReferences { id: String, version: u64 },
}

impl MockService {
    /// Create a new empty mock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource whose references form a single group.
    pub fn with_resource(
        self,
        id: &str,
        name: &str,
        category: &str,
        version: Option<u64>,
        references: &[&str],
    ) -> Self {
        let groups = vec![references.iter().map(|r| r.to_string()).collect()];
        self.with_grouped_resource(id, name, category, version, groups)
    }

    /// Add a resource with references split across several groups.
    pub fn with_grouped_resource(
        self,
        id: &str,
        name: &str,
        category: &str,
        version: Option<u64>,
        groups: Vec<Vec<String>>,
    ) -> Self {
        self.lock().resources.insert(
            id.to_string(),
            MockResource {
                name: name.to_string(),
                category: category.to_string(),
                version,
                groups,
            },
        );
        self
    }

    /// Fail the next calls of `call` for `id` with `errors`, in order.
    ///
    /// # Example
    ///
    /// ```
    /// use refgraph::remote::mock::{Call, MockService};
    /// use refgraph::remote::RemoteError;
    ///
    /// let service = MockService::new()
    ///     .with_resource("A", "A", "Connector", Some(1), &[])
    ///     .fail_next(Call::Metadata, "A", vec![RemoteError::from_status(503, "busy")]);
    /// ```
    pub fn fail_next(self, call: Call, id: &str, errors: Vec<RemoteError>) -> Self {
        self.lock()
            .scripted
            .entry((call, id.to_string()))
            .or_default()
            .extend(errors);
        self
    }

    /// Fail every call of `call` for `id` with `error`.
    pub fn fail_always(self, call: Call, id: &str, error: RemoteError) -> Self {
        self.lock().always.insert((call, id.to_string()), error);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Number of metadata lookups made for `id`.
    pub fn metadata_calls(&self, id: &str) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::FetchMetadata { id: i } if i == id))
            .count()
    }

    /// Number of reference queries made for `id`.
    pub fn reference_calls(&self, id: &str) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::QueryReferences { id: i, .. } if i == id))
            .count()
    }

    /// Highest number of calls observed in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockServiceInner> {
        self.inner.lock().unwrap()
    }

    /// Record the call and return its scripted failure, if any.
    fn begin(&self, call: Call, op: MockOperation, id: &str) -> (Duration, Option<RemoteError>) {
        let mut inner = self.lock();
        inner.operations.push(op);
        inner.in_flight += 1;
        inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);

        let key = (call, id.to_string());
        let scripted = inner.scripted.get_mut(&key).and_then(|q| q.pop_front());
        let failure = scripted.or_else(|| inner.always.get(&key).cloned());
        (inner.latency, failure)
    }

    fn end(&self) {
        let mut inner = self.lock();
        inner.in_flight -= 1;
    }

    async fn simulate(&self, latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ResourceService for MockService {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_metadata(&self, id: &ResourceId) -> Result<RemoteResource, RemoteError> {
        let (latency, failure) = self.begin(
            Call::Metadata,
            MockOperation::FetchMetadata {
                id: id.to_string(),
            },
            id.as_str(),
        );
        self.simulate(latency).await;
        self.end();

        if let Some(err) = failure {
            return Err(err);
        }

        let inner = self.lock();
        let resource = inner
            .resources
            .get(id.as_str())
            .ok_or_else(|| RemoteError::from_status(404, format!("resource {} not found", id)))?;
        Ok(RemoteResource {
            name: resource.name.clone(),
            category: resource.category.clone(),
            version: resource.version,
        })
    }

    async fn query_references(
        &self,
        id: &ResourceId,
        version: u64,
    ) -> Result<ReferenceQueryResponse, RemoteError> {
        let (latency, failure) = self.begin(
            Call::References,
            MockOperation::QueryReferences {
                id: id.to_string(),
                version,
            },
            id.as_str(),
        );
        self.simulate(latency).await;
        self.end();

        if let Some(err) = failure {
            return Err(err);
        }

        let inner = self.lock();
        let results = match inner.resources.get(id.as_str()) {
            Some(resource) => resource
                .groups
                .iter()
                .map(|group| ReferenceGroup {
                    references: group
                        .iter()
                        .map(|r| ReferenceEntry { id: r.clone() })
                        .collect(),
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(ReferenceQueryResponse { results })
    }
}
