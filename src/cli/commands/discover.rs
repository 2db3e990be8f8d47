//! cli::commands::discover
//!
//! Discover the graph reachable from a root resource and write it out.
//!
//! # Example
//!
//! ```bash
//! # Root and output from config.toml
//! refgraph discover
//!
//! # Explicit root, pretty JSON on stdout
//! refgraph discover 5f0c2b --stdout --pretty
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{resolve_run_config, Context};
use crate::core::config::{Overrides, RunConfig};
use crate::engine::{Discovery, DiscoveryEngine};
use crate::remote::http::HttpResourceService;
use crate::ui::output;

/// Arguments for the discover command.
#[derive(Debug, Clone, Default)]
pub struct DiscoverArgs {
    pub root_id: Option<String>,
    pub output: Option<PathBuf>,
    pub stdout: bool,
    pub pretty: bool,
    pub max_in_flight: Option<usize>,
}

/// Run the discover command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn discover(ctx: &Context, args: DiscoverArgs) -> Result<()> {
    let flags = Overrides {
        root_id: args.root_id.clone(),
        output: args.output.clone(),
        max_in_flight: args.max_in_flight,
        ..Default::default()
    };
    let run = resolve_run_config(ctx, flags)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(discover_async(ctx, &run, &args))
}

/// Async implementation of discover.
async fn discover_async(ctx: &Context, run: &RunConfig, args: &DiscoverArgs) -> Result<()> {
    let service =
        HttpResourceService::new(&run.remote).context("Failed to create remote client")?;
    let engine = DiscoveryEngine::from_config(Arc::new(service), run);

    output::debug(
        format!("Discovering from {} ({:?})", run.root_id, engine.options()),
        ctx.verbosity,
    );

    let Discovery { graph, stats } = engine
        .run(&run.root_id)
        .await
        .with_context(|| format!("Discovery from '{}' failed", run.root_id))?;

    if args.stdout {
        let json = graph.to_json(args.pretty)?;
        println!("{}", json);
    } else {
        graph
            .write_to(&run.output, args.pretty)
            .with_context(|| format!("Failed to write graph to {}", run.output.display()))?;
        output::success(format!("Wrote {}", run.output.display()), ctx.verbosity);
    }

    output::success(output::format_summary(&graph, &stats), ctx.verbosity);
    output::debug(stats, ctx.verbosity);
    Ok(())
}
