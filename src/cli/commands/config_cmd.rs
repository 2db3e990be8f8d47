//! config command - Show the effective configuration or its file location

use std::time::Duration;

use anyhow::{Context as _, Result};

use super::{load_config, Context};
use crate::core::config::{
    Config, DiscoveryConfig, FileConfig, Overrides, RemoteConfig, RetryConfig, DEFAULT_OUTPUT,
};
use crate::engine::DiscoveryOptions;
use crate::remote::RetryPolicy;
use crate::ui::output;

/// Placeholder printed instead of the API token.
const REDACTED: &str = "<redacted>";

/// Print the effective configuration as TOML, with the token redacted.
///
/// Environment overrides are applied; values not set anywhere are shown
/// with their defaults where one exists and omitted otherwise.
pub fn show(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let effective = effective(&config, &Overrides::from_env());
    let text = toml::to_string_pretty(&effective).context("Failed to render config")?;

    match config.path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file found; showing defaults and environment"),
    }
    print!("{}", text);
    Ok(())
}

/// Print the path of the config file in use, or where one would be created.
pub fn path(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let path = match config.path() {
        Some(p) => p.to_path_buf(),
        None => {
            output::debug("no config file found; printing default location", ctx.verbosity);
            Config::default_config_path()?
        }
    };
    println!("{}", path.display());
    Ok(())
}

/// Layer environment overrides and defaults onto the file contents.
fn effective(config: &Config, overrides: &Overrides) -> FileConfig {
    let file = &config.file;
    let remote = file.remote.clone().unwrap_or_default();
    let retry = file.retry.clone().unwrap_or_default();
    let discovery = file.discovery.clone().unwrap_or_default();
    let defaults = RetryPolicy::default();
    let options = DiscoveryOptions::default();

    FileConfig {
        remote: Some(RemoteConfig {
            base_url: overrides.base_url.clone().or(remote.base_url),
            account_id: overrides.account_id.clone().or(remote.account_id),
            api_token: overrides
                .api_token
                .clone()
                .or(remote.api_token)
                .map(|_| REDACTED.to_string()),
        }),
        retry: Some(RetryConfig {
            max_attempts: retry.max_attempts.or(Some(defaults.max_attempts)),
            base_delay_ms: retry.base_delay_ms.or(Some(millis(defaults.base_delay))),
            max_jitter_ms: retry.max_jitter_ms.or(Some(millis(defaults.max_jitter))),
        }),
        discovery: Some(DiscoveryConfig {
            root_id: discovery.root_id,
            max_in_flight: discovery.max_in_flight.or(Some(options.max_in_flight)),
            output: discovery.output.or_else(|| Some(DEFAULT_OUTPUT.into())),
            on_node_error: discovery.on_node_error.or(Some(options.on_node_error)),
        }),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::NodeErrorPolicy;

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_secs(1)), 1000);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn effective_redacts_token_and_fills_defaults() {
        let config = Config::from_file(FileConfig {
            remote: Some(RemoteConfig {
                base_url: Some("https://api.example.com".into()),
                account_id: Some("acct".into()),
                api_token: Some("secret".into()),
            }),
            ..Default::default()
        })
        .unwrap();

        let eff = effective(&config, &Overrides::default());
        let text = toml::to_string_pretty(&eff).unwrap();

        assert!(!text.contains("secret"));
        assert!(text.contains(REDACTED));
        let discovery = eff.discovery.unwrap();
        assert_eq!(discovery.max_in_flight, Some(8));
        assert_eq!(discovery.on_node_error, Some(NodeErrorPolicy::Skip));
        let retry = eff.retry.unwrap();
        assert_eq!(retry.max_attempts, Some(5));
        assert_eq!(retry.base_delay_ms, Some(1000));
        assert_eq!(retry.max_jitter_ms, Some(1000));
    }

    #[test]
    fn effective_applies_environment_overrides() {
        let config = Config::default();
        let overrides = Overrides {
            account_id: Some("from-env".into()),
            api_token: Some("tok".into()),
            ..Default::default()
        };

        let eff = effective(&config, &overrides);
        let remote = eff.remote.unwrap();

        assert_eq!(remote.account_id.as_deref(), Some("from-env"));
        assert_eq!(remote.api_token.as_deref(), Some(REDACTED));
        assert_eq!(remote.base_url, None);
    }
}
