// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration schema for an AssetGate node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Volume definitions (URL prefix, root directory, permission identifiers)
// - Static user directory for bearer-token callers
// - Network, streaming and observability settings

use crate::domain::volume::{normalize_url_path, Volume, VolumeError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "assetgate/v1";
pub const KIND: &str = "GatewayConfig";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "assetgate/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GatewayConfig")
    pub kind: String,

    /// Node metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Gateway configuration specification
    pub spec: GatewayConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Gateway configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    /// Volumes, in matching order
    #[serde(default)]
    pub volumes: Vec<VolumeConfig>,

    /// Caller identities for the HTTP surface
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Observability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Volume handle (logs and audit events)
    pub name: String,

    /// Public URL prefix (e.g. "/assets")
    pub url: String,

    /// Absolute root directory
    pub path: PathBuf,

    /// Primary permission identifier (e.g. a UID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_id: Option<String>,

    /// Legacy permission identifier (e.g. a numeric ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_permission_id: Option<String>,
}

impl VolumeConfig {
    /// Build the domain volume
    pub fn to_volume(&self) -> Result<Volume, VolumeError> {
        let mut volume = Volume::new(self.name.clone(), &self.url, self.path.clone())?;
        if let Some(id) = &self.permission_id {
            volume = volume.with_permission_id(id.clone())?;
        }
        if let Some(id) = &self.legacy_permission_id {
            volume = volume.with_legacy_permission_id(id.clone())?;
        }
        Ok(volume)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where unauthenticated callers are redirected; 401 when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// User handle for audit logs
    pub name: String,

    /// Bearer token (supports "env:VAR_NAME" for environment variables)
    pub token: String,

    #[serde(default)]
    pub admin: bool,

    /// Granted permission keys (e.g. "viewvolume:0f8c...")
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserConfig {
    /// Resolve the token, reading `env:VAR_NAME` references
    pub fn resolve_token(&self) -> anyhow::Result<String> {
        match self.token.strip_prefix("env:") {
            Some(var) => std::env::var(var).map_err(|_| {
                anyhow::anyhow!(
                    "Environment variable '{}' for user '{}' token is not set",
                    var,
                    self.name
                )
            }),
            None => Ok(self.token.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Read buffer size per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,

    /// Longest accepted volume-relative path
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
            max_path_length: default_max_path_length(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Metrics configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus exposition
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_max_path_length() -> usize {
    4096
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "assetgate-node".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ASSETGATE_CONFIG_PATH environment variable
    /// 2. ./assetgate.yaml (working directory)
    /// 3. ~/.assetgate/config.yaml (user home)
    /// 4. /etc/assetgate/config.yaml (system, Unix) or C:\ProgramData\AssetGate\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ASSETGATE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./assetgate.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".assetgate").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/assetgate/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\AssetGate\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default.
    ///
    /// Returns the manifest and the file it came from, if any.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok((config, Some(path)));
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(&config_path)?;
            config.apply_env_overrides();
            Ok((config, Some(config_path)))
        } else {
            tracing::warn!("No configuration file found in standard locations. Using empty defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok((config, None))
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("ASSETGATE_BIND_ADDRESS") {
            tracing::info!("Environment override: ASSETGATE_BIND_ADDRESS={}", val);
            self.spec.network.bind_address = val;
        }

        if let Some(val) = lookup("ASSETGATE_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: ASSETGATE_PORT={}", port);
                    self.spec.network.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for ASSETGATE_PORT: '{}'. Expected a port number. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup("ASSETGATE_LOGIN_URL") {
            tracing::info!("Environment override: ASSETGATE_LOGIN_URL={}", val);
            self.spec.auth.login_url = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Build the ordered domain volume list
    pub fn volumes(&self) -> Result<Vec<Volume>, VolumeError> {
        self.spec.volumes.iter().map(VolumeConfig::to_volume).collect()
    }

    /// Logging settings, with defaults when absent
    pub fn logging(&self) -> LoggingConfig {
        self.spec
            .observability
            .as_ref()
            .and_then(|o| o.logging.clone())
            .unwrap_or_else(|| LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        // Volumes
        let mut prefixes = HashSet::new();
        for volume in &self.spec.volumes {
            if volume.name.is_empty() {
                anyhow::bail!("Volume name cannot be empty (url: '{}')", volume.url);
            }
            volume.to_volume()?;

            let prefix = normalize_url_path(&volume.url);
            if !prefixes.insert(prefix) {
                anyhow::bail!("Duplicate volume URL prefix: '{}'", prefix);
            }
        }

        // Users
        let mut tokens = HashSet::new();
        for user in &self.spec.auth.users {
            if user.name.is_empty() {
                anyhow::bail!("User name cannot be empty");
            }
            if user.token.is_empty() {
                anyhow::bail!("Token cannot be empty for user: {}", user.name);
            }
            if !tokens.insert(user.token.as_str()) {
                anyhow::bail!("Duplicate token for user: {}", user.name);
            }
        }

        if let Some(login_url) = &self.spec.auth.login_url {
            if login_url.is_empty() {
                anyhow::bail!("spec.auth.login_url cannot be empty when set");
            }
        }

        if self.spec.streaming.chunk_size_bytes == 0 {
            anyhow::bail!("spec.streaming.chunk_size_bytes must be greater than zero");
        }

        let format = self.logging().format;
        if format != "json" && format != "text" {
            anyhow::bail!("Invalid log format: '{}'. Must be 'json' or 'text'", format);
        }

        Ok(())
    }
}
