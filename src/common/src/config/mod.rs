use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Errors raised while assembling the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required identifier or credential was not supplied
    #[error(
        "{field} required. Please provide it using the --{flag} flag or the {env} environment variable"
    )]
    Missing {
        field: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    /// The layered configuration could not be extracted
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Base URLs of the control-plane and telemetry APIs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub cloud_api_url: String,
    pub telemetry_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            cloud_api_url: String::from("https://api.confluent.cloud"),
            telemetry_url: String::from("https://api.telemetry.confluent.cloud"),
        }
    }
}

/// Shape of the usage-metrics queries that decide whether a resource is active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Trailing window over which activity is observed
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// ISO-8601 bucket size passed to the metrics API
    pub granularity: String,
    /// Maximum number of grouped rows per page
    pub limit: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(7 * 24 * 60 * 60),
            granularity: String::from("P1D"),
            limit: 1000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeletionConfig {
    /// Time budget for a whole batch deletion against the cluster
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// Reserved naming prefixes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Topics starting with this prefix are never swept
    pub internal_topic_prefix: String,
    /// Principals starting with this prefix are service accounts
    pub service_account_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            internal_topic_prefix: String::from("__"),
            service_account_prefix: String::from("sa-"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout enforced by the transport
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    pub endpoints: EndpointsConfig,
    pub activity: ActivityConfig,
    pub deletion: DeletionConfig,
    pub naming: NamingConfig,
    pub http: HttpConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(Toml::file("streamsweep.toml"))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::figment(Toml::file(path))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Result<Self, ConfigError> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed("STREAMSWEEP__").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
