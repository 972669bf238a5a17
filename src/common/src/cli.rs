use clap::Args;
use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Common CLI arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Cluster identity, credentials and the auto-confirm switch.
///
/// Every value may come from a flag or from its environment variable. Nothing is
/// required at parse time so that [`TargetArgs::validate`] can report the missing
/// value with a message naming both sources.
#[derive(Args, Clone, Default)]
pub struct TargetArgs {
    /// Environment id (env-xxxxx)
    #[arg(long, env = "ENVIRONMENT", global = true)]
    pub environment: Option<String>,

    /// Cluster id (lkc-xxxxx)
    #[arg(long, env = "CLUSTER", global = true)]
    pub cluster: Option<String>,

    /// Cluster API key
    #[arg(long = "cluster_api_key", env = "CLUSTER_API_KEY", global = true)]
    pub cluster_api_key: Option<String>,

    /// Cluster API secret
    #[arg(
        long = "cluster_api_secret",
        env = "CLUSTER_API_SECRET",
        hide_env_values = true,
        global = true
    )]
    pub cluster_api_secret: Option<String>,

    /// Cloud API key with Metrics API access
    #[arg(long = "cloud_api_key", env = "CLOUD_API_KEY", global = true)]
    pub cloud_api_key: Option<String>,

    /// Cloud API secret
    #[arg(
        long = "cloud_api_secret",
        env = "CLOUD_API_SECRET",
        hide_env_values = true,
        global = true
    )]
    pub cloud_api_secret: Option<String>,

    /// Confirm deletion without prompting
    #[arg(short = 'y', long = "yes", global = true)]
    pub yes: bool,
}

impl fmt::Debug for TargetArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetArgs")
            .field("environment", &self.environment)
            .field("cluster", &self.cluster)
            .field("cluster_api_key", &self.cluster_api_key)
            .field("cluster_api_secret", &self.cluster_api_secret.as_ref().map(|_| "***"))
            .field("cloud_api_key", &self.cloud_api_key)
            .field("cloud_api_secret", &self.cloud_api_secret.as_ref().map(|_| "***"))
            .field("yes", &self.yes)
            .finish()
    }
}

/// A key/secret pair
#[derive(Clone)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

/// Validated, immutable identity of a single run
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub environment: String,
    pub cluster: String,
    pub cluster_credentials: ApiCredentials,
    pub cloud_credentials: ApiCredentials,
    pub auto_confirm: bool,
}

impl TargetArgs {
    /// Check that every identifier and credential is present, in the order the user
    /// would naturally supply them.
    pub fn validate(self) -> Result<RunTarget, ConfigError> {
        let environment = required(self.environment, "Environment", "environment", "ENVIRONMENT")?;
        let cluster = required(self.cluster, "Cluster", "cluster", "CLUSTER")?;
        let cluster_key = required(
            self.cluster_api_key,
            "Cluster API KEY",
            "cluster_api_key",
            "CLUSTER_API_KEY",
        )?;
        let cluster_secret = required(
            self.cluster_api_secret,
            "Cluster API SECRET",
            "cluster_api_secret",
            "CLUSTER_API_SECRET",
        )?;
        let cloud_key = required(
            self.cloud_api_key,
            "Cloud API KEY",
            "cloud_api_key",
            "CLOUD_API_KEY",
        )?;
        let cloud_secret = required(
            self.cloud_api_secret,
            "Cloud API SECRET",
            "cloud_api_secret",
            "CLOUD_API_SECRET",
        )?;

        Ok(RunTarget {
            environment,
            cluster,
            cluster_credentials: ApiCredentials {
                key: cluster_key,
                secret: cluster_secret,
            },
            cloud_credentials: ApiCredentials {
                key: cloud_key,
                secret: cloud_secret,
            },
            auto_confirm: self.yes,
        })
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { field, flag, env }),
    }
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Initialize logging based on CLI arguments. An explicit `RUST_LOG` wins.
    pub fn init_logging(args: &CommonArgs) {
        let level = if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }
}
