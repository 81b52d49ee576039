//! BucketView Configuration
//!
//! Configuration is read from a TOML file and then overridden by the
//! environment variables the S3 tooling conventionally uses
//! (`AWS_ACCESS_KEY_ID`, `AWS_S3_URL`, `PORT`, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::storage::MAX_PRESIGN_EXPIRY;

/// Largest accepted upload request (5 GiB, the S3 single PUT limit)
pub const MAX_UPLOAD_MB: usize = 5 * 1024;

/// Template written by `bucketview init`
pub const CONFIG_TEMPLATE: &str = r#"# BucketView Configuration
# Credentials may also come from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY,
# the endpoint from AWS_S3_URL and the port from PORT.

[storage]
endpoint = "http://localhost:9000"
region = "us-east-1"
access_key = "changeme"
secret_key = "changeme"
path_style = true

[api]
# json, html or browser
variant = "browser"
bind_address = "0.0.0.0:8080"
cors_enabled = true
max_upload_mb = 512

[links]
link_expiry_secs = 60
share_expiry_secs = 86400

[logging]
level = "info"
"#;

/// Main BucketView configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketViewConfig {
    /// Object storage connection
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Presigned link lifetimes
    #[serde(default)]
    pub links: LinkConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Object storage connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Endpoint URL for S3-compatible services (MinIO, Ceph, ...).
    /// Leave unset to use the AWS endpoint for `region`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Signing region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`
    #[serde(default = "default_true")]
    pub path_style: bool,
}

/// Which front-end the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// JSON API
    Json,
    /// Minimal HTML pages
    Html,
    /// HTML browser with folder view, previews and uploader
    #[default]
    Browser,
}

impl FromStr for Variant {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Variant::Json),
            "html" => Ok(Variant::Html),
            "browser" => Ok(Variant::Browser),
            other => Err(crate::Error::Config(format!(
                "unknown variant '{}' (expected json, html or browser)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Json => write!(f, "json"),
            Variant::Html => write!(f, "html"),
            Variant::Browser => write!(f, "browser"),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Front-end to serve
    #[serde(default)]
    pub variant: Variant,

    /// HTTP API bind address
    #[serde(default = "default_api_address")]
    pub bind_address: String,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Maximum upload request size in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

/// Presigned link lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Lifetime of `/bucket/:name/:key/link` URLs in seconds
    #[serde(default = "default_link_expiry_secs")]
    pub link_expiry_secs: u64,

    /// Lifetime of `/share/:bucket/:key` URLs in seconds
    #[serde(default = "default_share_expiry_secs")]
    pub share_expiry_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_upload_mb() -> usize {
    512
}

fn default_link_expiry_secs() -> u64 {
    60
}

fn default_share_expiry_secs() -> u64 {
    24 * 60 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            path_style: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            bind_address: default_api_address(),
            cors_enabled: true,
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl ApiConfig {
    /// Upload body limit in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            link_expiry_secs: default_link_expiry_secs(),
            share_expiry_secs: default_share_expiry_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LinkConfig {
    /// Lifetime of download links
    pub fn link_expiry(&self) -> Duration {
        Duration::from_secs(self.link_expiry_secs)
    }

    /// Lifetime of share links
    pub fn share_expiry(&self) -> Duration {
        Duration::from_secs(self.share_expiry_secs)
    }
}

impl BucketViewConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BucketViewConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: BucketViewConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, apply process environment overrides and validate.
    ///
    /// A missing file is not an error: everything can come from the environment.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("No configuration file at {:?}, using defaults", path);
            Self::default()
        };

        let env: HashMap<String, String> = std::env::vars().collect();
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides from `vars`
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> crate::Result<()> {
        let non_empty = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();

        if let Some(v) = non_empty("AWS_ACCESS_KEY_ID") {
            self.storage.access_key = Some(v);
        }
        if let Some(v) = non_empty("AWS_SECRET_ACCESS_KEY") {
            self.storage.secret_key = Some(v);
        }
        if let Some(v) = non_empty("AWS_REGION") {
            self.storage.region = v;
        }
        if let Some(v) = non_empty("AWS_S3_URL") {
            self.storage.endpoint = Some(v);
        }
        if let Some(v) = non_empty("AWS_S3_FORCE_PATH_STYLE") {
            self.storage.path_style = parse_flag("AWS_S3_FORCE_PATH_STYLE", &v)?;
        }
        if let Some(port) = non_empty("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| crate::Error::Config(format!("PORT is not a valid port: {}", port)))?;
            self.api.bind_address = with_port(&self.api.bind_address, port);
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.bind_address.is_empty() {
            return Err(crate::Error::Config("api.bind_address cannot be empty".into()));
        }

        if self.storage.region.is_empty() {
            return Err(crate::Error::Config("storage.region cannot be empty".into()));
        }

        if self.storage.access_key.is_some() != self.storage.secret_key.is_some() {
            return Err(crate::Error::Config(
                "storage.access_key and storage.secret_key must be set together".into(),
            ));
        }

        if self.api.max_upload_mb == 0 || self.api.max_upload_mb > MAX_UPLOAD_MB {
            return Err(crate::Error::Config(format!(
                "api.max_upload_mb must be between 1 and {}",
                MAX_UPLOAD_MB
            )));
        }

        for (name, secs) in [
            ("links.link_expiry_secs", self.links.link_expiry_secs),
            ("links.share_expiry_secs", self.links.share_expiry_secs),
        ] {
            if secs == 0 || secs > MAX_PRESIGN_EXPIRY.as_secs() {
                return Err(crate::Error::Config(format!(
                    "{} must be between 1 and {}",
                    name,
                    MAX_PRESIGN_EXPIRY.as_secs()
                )));
            }
        }

        Ok(())
    }

}

fn parse_flag(name: &str, value: &str) -> crate::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(crate::Error::Config(format!("{} is not a boolean: {}", name, value))),
    }
}

/// Replace the port of a `host:port` address
fn with_port(address: &str, port: u16) -> String {
    let host = address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(address);
    format!("{}:{}", host, port)
}
