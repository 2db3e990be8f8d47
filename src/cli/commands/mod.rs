//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves configuration from the file, environment, and flags
//! 2. Calls the engine or a resolver
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to the remote service (discover, lookup) are async.
//! Each builds a tokio runtime and blocks on its async implementation, so
//! the rest of the CLI stays synchronous.

mod completion;
mod config_cmd;
mod discover;
mod lookup;

pub use completion::completion;
pub use config_cmd::{path as config_path, show as config_show};
pub use discover::{discover, DiscoverArgs};
pub use lookup::lookup;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::{Config, Overrides, RunConfig};
use crate::ui::output::Verbosity;

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit `--config` path
    pub config_path: Option<PathBuf>,
    /// Output verbosity
    pub verbosity: Verbosity,
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Discover {
            root_id,
            output,
            stdout,
            pretty,
            max_in_flight,
        } => discover::discover(
            ctx,
            DiscoverArgs {
                root_id,
                output,
                stdout,
                pretty,
                max_in_flight: max_in_flight.map(|n| n as usize),
            },
        ),
        Command::Lookup { id } => lookup::lookup(ctx, &id),
        Command::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(ctx),
            ConfigAction::Path => config_cmd::path(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load the config file and resolve it against the environment and `flags`.
///
/// Flags win over the environment, which wins over the file.
pub(crate) fn resolve_run_config(ctx: &Context, flags: Overrides) -> Result<RunConfig> {
    let config = load_config(ctx)?;
    let overrides = Overrides::from_env().merge(flags);
    config
        .resolve(&overrides)
        .context("Failed to resolve configuration")
}

pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    Config::load(ctx.config_path.as_deref()).context("Failed to load config")
}
