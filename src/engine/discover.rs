//! engine::discover
//!
//! Concurrent, deduplicated discovery of the graph reachable from a root.
//!
//! # Design
//!
//! A single coordinator owns all traversal state: the set of claimed ids,
//! the resolved nodes, and each node's reference list. Visits run as tokio
//! tasks in a `JoinSet` and only ever report an outcome back; they never
//! touch shared state.
//!
//! ```text
//!            claim(id) ──► pending ──► spawn visit(id) ──► JoinSet
//!                ▲                                           │
//!                └──── for each unclaimed reference ◄── outcome
//! ```
//!
//! An id is claimed (inserted into the visited set) when it is first
//! scheduled, before its metadata is fetched and before any of its
//! references are expanded. A second path reaching the same id, a diamond
//! or a cycle, finds it claimed and stops. Because claiming happens only on
//! the coordinator, check-and-insert is atomic without a lock, and every id
//! gets at most one metadata lookup and one reference query.
//!
//! The run finishes when no visit is pending or in flight. A resource below
//! the root that fails to resolve is logged and pruned like a missing one,
//! keeping the edge that reached it; only a failing root, or the `abort`
//! node error policy, ends the run early. Dropping the `JoinSet` on a fatal
//! error aborts outstanding visits.
//!
//! # Output order
//!
//! Task completion order varies between runs, so the graph is assembled
//! after the traversal settles: nodes breadth-first from the root following
//! each node's reference order, edges grouped by source in the same order.
//! Identical remote data always produces an identical document.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::config::{NodeErrorPolicy, RunConfig};
use crate::core::graph::{Graph, GraphError};
use crate::core::types::{Edge, Node, ResourceId};
use crate::remote::{RemoteError, ResilientClient, ResourceService, RetryPolicy};
use crate::resolve::{MetadataResolver, ReferenceResolver};

/// Errors that abort a discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The root resource does not exist.
    #[error("root resource '{0}' was not found")]
    RootNotFound(ResourceId),

    /// A resource's metadata could not be resolved.
    #[error("failed to resolve resource '{id}': {source}")]
    Resolve {
        id: ResourceId,
        #[source]
        source: RemoteError,
    },

    /// A visit task panicked or was cancelled.
    #[error("discovery task failed: {0}")]
    TaskFailed(String),

    /// The finished graph violated a document invariant.
    #[error(transparent)]
    Assembly(#[from] GraphError),
}

/// Tunables for a discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Maximum visits in flight at once (at least 1)
    pub max_in_flight: usize,
    /// What to do when a non-root resource fails to resolve
    pub on_node_error: NodeErrorPolicy,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            on_node_error: NodeErrorPolicy::Skip,
        }
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Metadata lookups issued (one per distinct id reached)
    pub metadata_lookups: usize,
    /// Reference queries issued
    pub reference_lookups: usize,
    /// Ids pruned because they were not found
    pub not_found: usize,
    /// Ids pruned after a resolution failure under the skip policy
    pub skipped: usize,
    /// Reference queries that failed and were treated as empty
    pub reference_failures: usize,
    /// Resources without a version, whose references were not queried
    pub unversioned: usize,
}

impl std::fmt::Display for DiscoveryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} metadata lookups, {} reference queries, {} not found, {} skipped, {} reference failures",
            self.metadata_lookups,
            self.reference_lookups,
            self.not_found,
            self.skipped,
            self.reference_failures
        )?;
        if self.unversioned > 0 {
            write!(f, ", {} unversioned", self.unversioned)?;
        }
        Ok(())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub graph: Graph,
    pub stats: DiscoveryStats,
}

/// Discovers the dependency graph reachable from a root resource.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use refgraph::engine::{DiscoveryEngine, DiscoveryOptions};
/// use refgraph::remote::{mock::MockService, RetryPolicy};
/// use refgraph::core::types::ResourceId;
///
/// # tokio_test::block_on(async {
/// let service = MockService::new()
///     .with_resource("R", "Root", "Process", Some(1), &["A", "B"])
///     .with_resource("A", "A", "Connector", Some(1), &[]);
///
/// let engine = DiscoveryEngine::new(
///     Arc::new(service),
///     RetryPolicy::immediate(5),
///     DiscoveryOptions::default(),
/// );
/// let graph = engine.discover(&ResourceId::new("R").unwrap()).await.unwrap();
///
/// assert_eq!(graph.node_count(), 2); // B was not found
/// assert_eq!(graph.edge_count(), 2); // R -> A, R -> B
/// # });
/// ```
pub struct DiscoveryEngine {
    service: Arc<dyn ResourceService>,
    client: ResilientClient,
    options: DiscoveryOptions,
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine")
            .field("service", &self.service.name())
            .field("policy", self.client.policy())
            .field("options", &self.options)
            .finish()
    }
}

/// What a single visit learned about one id.
enum VisitOutcome {
    /// Metadata resolved. `references` is `None` when the resource has no version.
    Resolved {
        node: Node,
        references: Option<Vec<ResourceId>>,
    },
    NotFound,
    Failed(RemoteError),
}

impl DiscoveryEngine {
    pub fn new(
        service: Arc<dyn ResourceService>,
        policy: RetryPolicy,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            service,
            client: ResilientClient::new(policy),
            options: DiscoveryOptions {
                max_in_flight: options.max_in_flight.max(1),
                ..options
            },
        }
    }

    /// Build an engine from a resolved run configuration.
    pub fn from_config(service: Arc<dyn ResourceService>, config: &RunConfig) -> Self {
        Self::new(service, config.retry, config.discovery)
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Discover the graph reachable from `root`.
    ///
    /// # Errors
    ///
    /// - `RootNotFound` if the root does not exist
    /// - `Resolve` if the root's metadata cannot be resolved, or a non-root
    ///   resource's metadata cannot be resolved under the abort policy
    /// - `TaskFailed` if a visit task panicked
    pub async fn discover(&self, root: &ResourceId) -> Result<Graph, DiscoveryError> {
        Ok(self.run(root).await?.graph)
    }

    /// Discover the graph and report run statistics.
    pub async fn run(&self, root: &ResourceId) -> Result<Discovery, DiscoveryError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("discover", %run_id, %root);
        self.traverse(root).instrument(span).await
    }

    async fn traverse(&self, root: &ResourceId) -> Result<Discovery, DiscoveryError> {
        // Fresh resolvers per run so failure counts do not leak between runs.
        let metadata = MetadataResolver::new(self.service.clone(), self.client.clone());
        let references = ReferenceResolver::new(self.service.clone(), self.client.clone());

        let mut state = Traversal::default();
        let mut tasks: JoinSet<(ResourceId, VisitOutcome)> = JoinSet::new();

        state.claim(root.clone());
        info!(max_in_flight = self.options.max_in_flight, "starting discovery");

        loop {
            while tasks.len() < self.options.max_in_flight {
                let Some(id) = state.pending.pop_front() else {
                    break;
                };
                state.stats.metadata_lookups += 1;
                tasks.spawn(
                    visit(id, metadata.clone(), references.clone()).in_current_span(),
                );
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (id, outcome) = joined.map_err(|e| DiscoveryError::TaskFailed(e.to_string()))?;

            match outcome {
                VisitOutcome::Resolved { node, references } => {
                    state.record(id, node, references);
                }
                VisitOutcome::NotFound if &id == root => {
                    return Err(DiscoveryError::RootNotFound(id));
                }
                VisitOutcome::NotFound => {
                    state.stats.not_found += 1;
                }
                VisitOutcome::Failed(source)
                    if &id == root || self.options.on_node_error == NodeErrorPolicy::Abort =>
                {
                    return Err(DiscoveryError::Resolve { id, source });
                }
                VisitOutcome::Failed(source) => {
                    warn!(%id, error = %source, "failed to resolve resource, skipping");
                    state.stats.skipped += 1;
                }
            }
        }

        state.stats.reference_failures = references.failure_count();
        let stats = state.stats;
        let graph = state.assemble(root)?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            metadata_lookups = stats.metadata_lookups,
            not_found = stats.not_found,
            reference_failures = stats.reference_failures,
            "discovery finished"
        );
        Ok(Discovery { graph, stats })
    }
}

/// Resolve one id: metadata first, then its references.
async fn visit(
    id: ResourceId,
    metadata: MetadataResolver,
    references: ReferenceResolver,
) -> (ResourceId, VisitOutcome) {
    let meta = match metadata.resolve(&id).await {
        Ok(Some(meta)) => meta,
        Ok(None) => return (id, VisitOutcome::NotFound),
        Err(err) => return (id, VisitOutcome::Failed(err)),
    };

    let refs = match meta.version {
        Some(version) => Some(references.resolve(&id, version).await),
        None => {
            warn!(%id, "resource has no version, not querying its references");
            None
        }
    };

    let node = meta.to_node();
    (
        id,
        VisitOutcome::Resolved {
            node,
            references: refs,
        },
    )
}

/// Coordinator-owned traversal state.
#[derive(Default)]
struct Traversal {
    /// Every id ever scheduled; the visited set
    claimed: HashSet<ResourceId>,
    /// Ids claimed but not yet spawned
    pending: VecDeque<ResourceId>,
    /// Resolved nodes
    nodes: HashMap<ResourceId, Node>,
    /// Reference lists of resolved nodes, in remote order
    adjacency: HashMap<ResourceId, Vec<ResourceId>>,
    stats: DiscoveryStats,
}

impl Traversal {
    /// Claim `id` for visiting. Returns false if it was already claimed.
    fn claim(&mut self, id: ResourceId) -> bool {
        if !self.claimed.insert(id.clone()) {
            return false;
        }
        self.pending.push_back(id);
        true
    }

    /// Record a resolved node and schedule its unclaimed references.
    fn record(&mut self, id: ResourceId, node: Node, references: Option<Vec<ResourceId>>) {
        self.nodes.insert(id.clone(), node);

        let references = match references {
            Some(refs) => {
                self.stats.reference_lookups += 1;
                refs
            }
            None => {
                self.stats.unversioned += 1;
                Vec::new()
            }
        };

        for target in &references {
            if self.claim(target.clone()) {
                debug!(source = %id, %target, "scheduling reference");
            }
        }
        self.adjacency.insert(id, references);
    }

    /// Build the graph in breadth-first order from `root`.
    fn assemble(mut self, root: &ResourceId) -> Result<Graph, GraphError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut edges = Vec::new();
        let mut seen = HashSet::from([root.clone()]);
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.nodes.remove(&id) else {
                continue;
            };
            nodes.push(node);

            for target in self.adjacency.remove(&id).unwrap_or_default() {
                if seen.insert(target.clone()) {
                    queue.push_back(target.clone());
                }
                edges.push(Edge::new(id.clone(), target));
            }
        }

        Graph::from_parts(nodes, edges)
    }
}
