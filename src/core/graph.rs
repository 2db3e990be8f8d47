//! core::graph
//!
//! The discovered resource graph and its serialized document form.
//!
//! # Document
//!
//! The graph is written as a single JSON document consumed by the renderer:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "R", "name": "Root", "category": "Process" }],
//!   "edges": [{ "source": "R", "target": "A" }]
//! }
//! ```
//!
//! Field names and shapes are the contract with the renderer and must not
//! change.
//!
//! # Invariants
//!
//! - Node ids are unique
//! - Every edge source is a node in the graph
//! - Edge targets may be missing from the node set (dangling edges)

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::types::{Edge, Node, ResourceId};

/// Errors from reading or writing graph documents.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to serialize graph: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to parse graph document '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to read graph document '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write graph document '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("duplicate node in graph document: {0}")]
    DuplicateNode(ResourceId),
}

/// A finished dependency graph.
///
/// Built once per discovery run and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Assemble a graph from its parts.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateNode` if two nodes share an id.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(&node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(Self { nodes, edges })
    }

    /// Nodes in discovery order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in discovery order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &ResourceId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Check whether the graph contains a node for `id`.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.node(id).is_some()
    }

    /// Edges whose target never resolved into a node.
    ///
    /// # Example
    ///
    /// ```
    /// use refgraph::core::graph::Graph;
    /// use refgraph::core::types::{Edge, Node, ResourceId};
    ///
    /// let r = ResourceId::new("R").unwrap();
    /// let gone = ResourceId::new("gone").unwrap();
    /// let graph = Graph::from_parts(
    ///     vec![Node { id: r.clone(), display_name: "Root".into(), category: "Process".into() }],
    ///     vec![Edge::new(r, gone.clone())],
    /// ).unwrap();
    ///
    /// let dangling: Vec<_> = graph.dangling_edges().collect();
    /// assert_eq!(dangling.len(), 1);
    /// assert_eq!(dangling[0].target, gone);
    /// ```
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        let ids: HashSet<&ResourceId> = self.nodes.iter().map(|n| &n.id).collect();
        self.edges
            .iter()
            .filter(move |e| !ids.contains(&e.target))
    }

    /// Serialize the graph document.
    pub fn to_json(&self, pretty: bool) -> Result<String, GraphError> {
        let result = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        result.map_err(GraphError::Serialize)
    }

    /// Write the graph document atomically, replacing any prior output.
    ///
    /// Writes to a uniquely named temp file next to `path`, syncs, then
    /// renames it over `path`. On failure the temp file is removed.
    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<(), GraphError> {
        let contents = self.to_json(pretty)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(write_error(path))?;
                parent
            }
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_error(dir))?;
        temp.write_all(contents.as_bytes())
            .map_err(write_error(temp.path()))?;
        temp.as_file()
            .sync_all()
            .map_err(write_error(temp.path()))?;

        temp.persist(path)
            .map_err(|err| GraphError::WriteError {
                path: path.to_path_buf(),
                source: err.error,
            })?;
        Ok(())
    }

    /// Read a previously written graph document.
    pub fn read_from(path: &Path) -> Result<Self, GraphError> {
        let contents = fs::read_to_string(path).map_err(|source| GraphError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let graph: Graph = serde_json::from_str(&contents).map_err(|source| GraphError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_parts(graph.nodes, graph.edges)
    }
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> GraphError {
    let path = path.to_path_buf();
    move |source| GraphError::WriteError { path, source }
}
