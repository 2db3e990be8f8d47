//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! User-facing messages go through this module and respect the quiet flag.
//! Diagnostics from the library go through `tracing` instead; see
//! [`crate::cli::init_logging`].

use std::fmt::Display;

use crate::core::graph::Graph;
use crate::core::types::Node;
use crate::engine::DiscoveryStats;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message to stderr (respects quiet mode).
///
/// Goes to stderr so it never mixes with a graph written to stdout.
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", message);
    }
}

/// Format a node for display: `id  name (category)`.
pub fn format_node(node: &Node) -> String {
    format!("{}  {} ({})", node.id, node.display_name, node.category)
}

/// One-line summary of a finished discovery.
pub fn format_summary(graph: &Graph, stats: &DiscoveryStats) -> String {
    let dangling = graph.dangling_edges().count();
    let mut line = format!(
        "Discovered {} {} and {} {}",
        graph.node_count(),
        plural(graph.node_count(), "resource", "resources"),
        graph.edge_count(),
        plural(graph.edge_count(), "reference", "references"),
    );
    if dangling > 0 {
        line.push_str(&format!(", {} dangling", dangling));
    }
    if stats.reference_failures > 0 {
        line.push_str(&format!(
            "; {} reference {} failed",
            stats.reference_failures,
            plural(stats.reference_failures, "query", "queries")
        ));
    }
    line
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
