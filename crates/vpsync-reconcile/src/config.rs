//! Configuration for the reconciler.

use serde::Deserialize;
use vpsync_registry::RegistryConfig;

/// Target slice of the measurement platform.
const DEFAULT_SLICE_ID: i64 = 22129;

/// Top-level reconciler configuration.
///
/// Loaded from `vpsync.toml` or `VPSYNC__` environment variables
/// (`VPSYNC__REGISTRY__USERNAME`, `VPSYNC__SLICE_ID`, ...). Store
/// connection parameters are command-line arguments, not config.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// Registry endpoint and credentials.
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Slice every node should end up enrolled in.
    #[serde(default = "default_slice_id")]
    pub slice_id: i64,
}

/// Registry connection settings. Credentials have no default: they come
/// from the operator's config file or environment, never from the binary.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RegistrySettings {
    pub fn to_client_config(&self) -> RegistryConfig {
        RegistryConfig {
            api_url: self.api_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

fn default_api_url() -> String {
    "https://www.planet-lab.org/PLCAPI/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_slice_id() -> i64 {
    DEFAULT_SLICE_ID
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            slice_id: default_slice_id(),
        }
    }
}
