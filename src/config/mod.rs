/// Configuration management for gke-census
use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "gke-census.yaml";

/// Environment variable overriding the gcloud binary
pub const GCLOUD_BINARY_ENV: &str = "GKE_CENSUS_GCLOUD";

/// Main scan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CensusConfig {
    /// gcloud invocation settings
    #[serde(default)]
    pub gcloud: GcloudConfig,

    /// How cluster listings are acquired
    #[serde(default)]
    pub strategy: Strategy,

    /// Output format requested from `gcloud projects list`
    #[serde(default)]
    pub project_format: ProjectFormat,

    /// Report rendering
    #[serde(default)]
    pub output: OutputFormat,
}

/// gcloud binary and per-call limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcloudConfig {
    /// Path or name of the gcloud binary (can also be set via GKE_CENSUS_GCLOUD env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Seconds to wait for a single gcloud call, 0 waits forever
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GcloudConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Cluster listing acquisition strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// `clusters list --format=json`, mode read from the autopilot field
    #[default]
    Structured,
    /// `KEY: value` listing plus a node-pool query per cluster
    Tabular,
}

/// Project listing output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProjectFormat {
    #[default]
    Json,
    Text,
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn default_timeout_secs() -> u64 {
    120
}

impl CensusConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CensusConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display())),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path).with_context(|| {
                        format!("Failed to load configuration {}", default_path.display())
                    })
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(binary) = &self.gcloud.binary {
            if binary.trim().is_empty() {
                anyhow::bail!("gcloud.binary cannot be empty");
            }
        }
        Ok(())
    }

    /// Get the gcloud binary from config or environment
    pub fn gcloud_binary(&self) -> String {
        self.gcloud
            .binary
            .clone()
            .or_else(|| std::env::var(GCLOUD_BINARY_ENV).ok())
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| "gcloud".to_string())
    }

    /// Per-call timeout, `None` when disabled
    pub fn command_timeout(&self) -> Option<Duration> {
        match self.gcloud.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            gcloud: GcloudConfig {
                binary: Some("gcloud".to_string()),
                timeout_secs: default_timeout_secs(),
            },
            strategy: Strategy::Structured,
            project_format: ProjectFormat::Json,
            output: OutputFormat::Text,
        }
    }
}
