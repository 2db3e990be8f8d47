//! resolve::references
//!
//! Resolves the resources directly referenced by a resource.
//!
//! # Failure policy
//!
//! This is a local recovery boundary. Any failure of the reference query
//! (network, undecodable response, exhausted retries) is logged and treated
//! as "no references discoverable from this resource". One unreachable edge
//! never aborts discovery of the rest of the graph.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::core::types::ResourceId;
use crate::remote::{ReferenceQueryResponse, RemoteError, ResilientClient, ResourceService};

/// Looks up direct references through the resilient client.
#[derive(Clone)]
pub struct ReferenceResolver {
    service: Arc<dyn ResourceService>,
    client: ResilientClient,
    /// Queries that failed and were recovered as empty, shared across clones
    failures: Arc<AtomicUsize>,
}

impl ReferenceResolver {
    pub fn new(service: Arc<dyn ResourceService>, client: ResilientClient) -> Self {
        Self {
            service,
            client,
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resolve the references of `id` at `version`, in response order.
    ///
    /// Never fails: query errors yield an empty list.
    pub async fn resolve(&self, id: &ResourceId, version: u64) -> Vec<ResourceId> {
        match self.try_resolve(id, version).await {
            Ok(references) => references,
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!(%id, version, error = %err, "reference query failed, not expanding this resource");
                Vec::new()
            }
        }
    }

    /// Resolve references, surfacing query failures.
    pub async fn try_resolve(
        &self,
        id: &ResourceId,
        version: u64,
    ) -> Result<Vec<ResourceId>, RemoteError> {
        let response = self
            .client
            .execute("references", || self.service.query_references(id, version))
            .await?;

        let references = flatten(id, &response);
        debug!(%id, version, count = references.len(), "resolved references");
        Ok(references)
    }

    /// Number of queries recovered as empty so far.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("service", &self.service.name())
            .field("policy", self.client.policy())
            .field("failures", &self.failure_count())
            .finish()
    }
}

/// Flatten grouped references into ids, dropping blank entries.
fn flatten(parent: &ResourceId, response: &ReferenceQueryResponse) -> Vec<ResourceId> {
    response
        .raw_ids()
        .filter_map(|raw| match ResourceId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(%parent, error = %e, "skipping malformed reference");
                None
            }
        })
        .collect()
}
