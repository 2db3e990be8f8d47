//! resolve::metadata
//!
//! Resolves a resource id into its metadata, or determines it does not exist.
//!
//! A not-found answer is an expected outcome (references to deleted or
//! inaccessible resources are common) and is returned as `Ok(None)`. Every
//! other failure, including exhausted retries, is returned to the caller.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::types::{ResourceId, ResourceMetadata};
use crate::remote::{RemoteError, ResilientClient, ResourceService};

/// Looks up resource metadata through the resilient client.
#[derive(Clone)]
pub struct MetadataResolver {
    service: Arc<dyn ResourceService>,
    client: ResilientClient,
}

impl MetadataResolver {
    pub fn new(service: Arc<dyn ResourceService>, client: ResilientClient) -> Self {
        Self { service, client }
    }

    /// Resolve metadata for `id`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(metadata))` if the resource exists
    /// - `Ok(None)` if the service reports it as not found
    ///
    /// # Errors
    ///
    /// Any non-not-found failure, including `RetryExhausted`.
    pub async fn resolve(&self, id: &ResourceId) -> Result<Option<ResourceMetadata>, RemoteError> {
        let result = self
            .client
            .execute("metadata", || self.service.fetch_metadata(id))
            .await;

        match result {
            Ok(resource) => {
                debug!(%id, name = %resource.name, category = %resource.category, "resolved metadata");
                Ok(Some(ResourceMetadata {
                    id: id.clone(),
                    display_name: resource.name,
                    category: resource.category,
                    version: resource.version,
                }))
            }
            Err(err) if err.is_not_found() => {
                info!(%id, reason = %err, "resource not found, pruning");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("service", &self.service.name())
            .field("policy", self.client.policy())
            .finish()
    }
}
