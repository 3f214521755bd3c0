use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::engine::engine::EngineSettings;
use crate::platform::descriptor::PlatformDescriptor;
use crate::platform::registry::{PlatformRegistry, RegistryError};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "linkogenei-agent",
    version,
    about = "Detect social media posts in captured pages and save them to Linkogenei"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Save service base URL (overrides the config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Path to config file (default: linkogenei.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the supported platforms
    Platforms,

    /// Report which platform, if any, serves an origin
    Detect {
        /// Page URL or bare host name
        #[arg(long)]
        origin: String,
    },

    /// Annotate a captured page and list the posts found
    Scan {
        /// Path to a JSON page snapshot
        #[arg(long)]
        page: String,

        /// Treat the page as served from this URL instead of the captured one
        #[arg(long)]
        origin: Option<String>,

        /// Print the extracted posts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save one post from a captured page
    Save {
        /// Path to a JSON page snapshot
        #[arg(long)]
        page: String,

        /// Authentication token issued by the dashboard
        #[arg(long)]
        token: String,

        /// Which post to save, counting from 1 in page order
        #[arg(long, default_value_t = 1)]
        post: usize,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `linkogenei.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Extra descriptors; an id matching a built-in replaces it.
    #[serde(default)]
    pub platforms: Vec<PlatformDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Quiet period before re-scanning; 0 re-scans on every batch.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Upper bound on how long a mutation burst can delay a re-scan.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display_ms(),
        }
    }
}

// Serde default helpers
fn default_base_url() -> String { "http://localhost:5001/api/linkogenei".to_string() }
fn default_timeout_secs() -> u64 { 15 }
fn default_debounce_ms() -> u64 { 150 }
fn default_max_wait_ms() -> u64 { 1000 }
fn default_display_ms() -> u64 { 3000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("linkogenei.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

impl AppConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            debounce: Duration::from_millis(self.scan.debounce_ms),
            max_wait: Duration::from_millis(self.scan.max_wait_ms),
            notification: Duration::from_millis(self.notifications.display_ms),
            request_timeout: Duration::from_secs(self.endpoint.timeout_secs),
        }
    }

    /// Built-in platforms with this file's descriptors layered on top.
    pub fn registry(&self) -> Result<PlatformRegistry, RegistryError> {
        PlatformRegistry::builtin()?.with_overrides(self.platforms.clone())
    }

    /// The save service base URL, preferring the command-line flag.
    pub fn endpoint_url<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.unwrap_or(&self.endpoint.base_url)
    }
}
