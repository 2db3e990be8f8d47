//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the default locations
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Refgraph - discover the dependency graph behind a remote resource
#[derive(Parser, Debug)]
#[command(name = "refgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; only errors are printed
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover the graph reachable from a root resource
    #[command(
        name = "discover",
        long_about = "Discover the dependency graph reachable from a root resource.\n\n\
            Starting from ROOT_ID, refgraph looks up each resource's metadata and the \
            resources it references, following references until every reachable \
            resource has been visited once. Resources that no longer exist are left \
            out of the node list, but the references pointing at them are kept as \
            edges.\n\n\
            The graph is written as JSON with a `nodes` and an `edges` array.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Discover from the root configured in config.toml
    refgraph discover

    # Discover from a specific resource into a chosen file
    refgraph discover 5f0c2b -o deps.json

    # Pipe a pretty-printed graph to jq
    refgraph discover 5f0c2b --stdout --pretty | jq '.nodes | length'

    # Be gentler with the remote service
    refgraph discover --max-in-flight 2"
    )]
    Discover {
        /// Root resource id (defaults to discovery.root_id)
        #[arg(value_name = "ROOT_ID")]
        root_id: Option<String>,

        /// Output file (defaults to discovery.output, then graph.json)
        #[arg(short, long, value_name = "PATH", conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write the graph to stdout instead of a file
        #[arg(long)]
        stdout: bool,

        /// Pretty-print the JSON document
        #[arg(long)]
        pretty: bool,

        /// Maximum resource lookups in flight at once
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        max_in_flight: Option<u64>,
    },

    /// Resolve a single resource without traversing
    #[command(
        name = "lookup",
        long_about = "Resolve one resource's metadata and its direct references.\n\n\
            Useful for checking credentials and for inspecting why a resource is \
            or is not part of a discovered graph. Nothing is traversed or written.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show a resource and what it references
    refgraph lookup 5f0c2b

    # See the individual requests and retries
    refgraph --debug lookup 5f0c2b"
    )]
    Lookup {
        /// Resource id to resolve
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for refgraph commands.",
        after_help = "\
SETUP EXAMPLES:
    # Bash
    refgraph completion bash >> ~/.bashrc

    # Zsh
    refgraph completion zsh > ~/.zfunc/_refgraph

    # Fish
    refgraph completion fish > ~/.config/fish/completions/refgraph.fish

    # PowerShell
    refgraph completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration (token redacted)
    Show,
    /// Print the config file location
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
