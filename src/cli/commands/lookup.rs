//! cli::commands::lookup
//!
//! Resolve one resource's metadata and direct references, without traversal.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{resolve_run_config, Context};
use crate::core::config::{Overrides, RunConfig};
use crate::core::types::ResourceId;
use crate::remote::http::HttpResourceService;
use crate::remote::{ResilientClient, ResourceService};
use crate::resolve::{MetadataResolver, ReferenceResolver};
use crate::ui::output;

/// Run the lookup command.
pub fn lookup(ctx: &Context, id: &str) -> Result<()> {
    let id = ResourceId::new(id).context("Invalid resource id")?;
    // The looked-up id stands in for the root so a configured root is not required.
    let flags = Overrides {
        root_id: Some(id.to_string()),
        ..Default::default()
    };
    let run = resolve_run_config(ctx, flags)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(lookup_async(ctx, &run, &id))
}

async fn lookup_async(ctx: &Context, run: &RunConfig, id: &ResourceId) -> Result<()> {
    let service: Arc<dyn ResourceService> = Arc::new(
        HttpResourceService::new(&run.remote).context("Failed to create remote client")?,
    );
    let client = ResilientClient::new(run.retry);

    let metadata = MetadataResolver::new(service.clone(), client.clone())
        .resolve(id)
        .await
        .with_context(|| format!("Failed to resolve '{}'", id))?;

    let Some(metadata) = metadata else {
        output::print(format!("{}  (not found)", id), ctx.verbosity);
        return Ok(());
    };
    output::print(output::format_node(&metadata.to_node()), ctx.verbosity);

    let Some(version) = metadata.version else {
        output::warn("resource has no version; references not queried", ctx.verbosity);
        return Ok(());
    };
    output::print(format!("version: {}", version), ctx.verbosity);

    let references = ReferenceResolver::new(service, client)
        .try_resolve(id, version)
        .await
        .with_context(|| format!("Failed to query references of '{}'", id))?;

    if references.is_empty() {
        output::print("references: none", ctx.verbosity);
    } else {
        output::print(
            format!("references ({}):", references.len()),
            ctx.verbosity,
        );
        output::print(output::format_list(&references, "  "), ctx.verbosity);
    }
    Ok(())
}
