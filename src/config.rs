//! Proxy Configuration
//!
//! Configuration is resolved once at startup from an optional TOML file
//! overlaid with environment variables. Resolution is pure: it reports every
//! missing required key and leaves the decision to exit to the caller.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Error, Result};

pub const ENV_PORT: &str = "PORT";
pub const ENV_REGION: &str = "MINIO_REGION";
pub const ENV_ENDPOINT: &str = "MINIO_ENDPOINT";
pub const ENV_BUCKET: &str = "MINIO_BUCKET";
pub const ENV_ACCESS_KEY: &str = "MINIO_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "MINIO_SECRET_ACCESS_KEY";
pub const ENV_PATH_STYLE: &str = "MINIO_PATH_STYLE";
pub const ENV_HEALTH_PATH: &str = "HEALTH_PATH";
pub const ENV_HEALTH_FILE: &str = "HEALTH_FILE";
pub const ENV_HEALTH_CACHE_INTERVAL: &str = "HEALTH_CACHE_INTERVAL";

const REDACTED: &str = "<redacted>";

/// Fully resolved proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyConfig {
    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Object store connection configuration
    pub store: StoreConfig,

    /// Health endpoint configuration
    pub health: HealthConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Port to listen on (all interfaces)
    pub port: u16,
}

/// Object store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Endpoint URL of the S3-compatible service
    pub endpoint: String,

    /// Region name sent when signing requests
    pub region: String,

    /// Bucket every object is served from
    pub bucket: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Use path-style addressing (required by MinIO)
    pub path_style: bool,
}

/// Health endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthConfig {
    /// Reserved request path (without the leading slash)
    pub path: String,

    /// Sentinel object fetched to verify the backend
    pub file: String,

    /// Minimum seconds between live backend probes
    pub cache_interval_secs: u64,
}

/// Configuration values gathered from one source, before defaults apply
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PartialConfig {
    pub port: Option<u16>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: Option<bool>,
    pub health_path: Option<String>,
    pub health_file: Option<String>,
    pub health_cache_interval: Option<u64>,
}

// Default value functions
fn default_port() -> u16 {
    8000
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_endpoint() -> String {
    "http://minio:9000".to_string()
}

fn default_path_style() -> bool {
    true
}

fn default_health_path() -> String {
    "healthz".to_string()
}

fn default_health_file() -> String {
    ".rest-minio-proxy".to_string()
}

fn default_health_cache_interval() -> u64 {
    120
}

impl PartialConfig {
    /// Load values from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load values from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read values from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read values through a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        Ok(Self {
            port: parse_var(ENV_PORT, get(ENV_PORT))?,
            region: get(ENV_REGION),
            endpoint: get(ENV_ENDPOINT),
            bucket: get(ENV_BUCKET),
            access_key: get(ENV_ACCESS_KEY),
            secret_key: get(ENV_SECRET_KEY),
            path_style: parse_var(ENV_PATH_STYLE, get(ENV_PATH_STYLE))?,
            health_path: get(ENV_HEALTH_PATH),
            health_file: get(ENV_HEALTH_FILE),
            health_cache_interval: parse_var(
                ENV_HEALTH_CACHE_INTERVAL,
                get(ENV_HEALTH_CACHE_INTERVAL),
            )?,
        })
    }

    /// Layer `other` on top of `self`; values set in `other` win
    pub fn overlay(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            port: other.port.or(self.port),
            region: other.region.or(self.region),
            endpoint: other.endpoint.or(self.endpoint),
            bucket: other.bucket.or(self.bucket),
            access_key: other.access_key.or(self.access_key),
            secret_key: other.secret_key.or(self.secret_key),
            path_style: other.path_style.or(self.path_style),
            health_path: other.health_path.or(self.health_path),
            health_file: other.health_file.or(self.health_file),
            health_cache_interval: other.health_cache_interval.or(self.health_cache_interval),
        }
    }

    /// Apply defaults and check required values.
    ///
    /// Every resolved value is logged. Fails with [`Error::MissingConfig`]
    /// listing all absent required keys at once.
    pub fn resolve(self) -> Result<ProxyConfig> {
        let mut missing = Vec::new();

        let port = or_default(ENV_PORT, self.port, default_port);
        let region = or_default(ENV_REGION, non_empty(self.region), default_region);
        let endpoint = or_default(ENV_ENDPOINT, non_empty(self.endpoint), default_endpoint);
        let bucket = required(ENV_BUCKET, non_empty(self.bucket), false, &mut missing);
        let access_key = required(ENV_ACCESS_KEY, non_empty(self.access_key), false, &mut missing);
        let secret_key = required(ENV_SECRET_KEY, non_empty(self.secret_key), true, &mut missing);
        let path_style = or_default(ENV_PATH_STYLE, self.path_style, default_path_style);
        let health_path = or_default(
            ENV_HEALTH_PATH,
            non_empty(self.health_path.map(|p| p.trim_start_matches('/').to_string())),
            default_health_path,
        );
        let health_file = or_default(ENV_HEALTH_FILE, non_empty(self.health_file), default_health_file);
        let cache_interval_secs = or_default(
            ENV_HEALTH_CACHE_INTERVAL,
            self.health_cache_interval,
            default_health_cache_interval,
        );

        if !missing.is_empty() {
            return Err(Error::MissingConfig(missing));
        }

        let config = ProxyConfig {
            server: ServerConfig { port },
            store: StoreConfig {
                endpoint,
                region,
                bucket,
                access_key,
                secret_key,
                path_style,
            },
            health: HealthConfig {
                path: health_path,
                file: health_file,
                cache_interval_secs,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl ProxyConfig {
    /// Load configuration from an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => PartialConfig::from_file(path)?,
            None => PartialConfig::default(),
        };
        file.overlay(PartialConfig::from_env()?).resolve()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config(format!("{} cannot be 0", ENV_PORT)));
        }

        if !self.store.endpoint.starts_with("http://") && !self.store.endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "{} must be an http(s) URL: {}",
                ENV_ENDPOINT, self.store.endpoint
            )));
        }

        Ok(())
    }

    /// Address the HTTP listener binds to
    pub fn listen_address(&self) -> String {
        format!("0.0.0.0:{}", self.server.port)
    }

    /// Get the health cache interval as Duration
    pub fn health_cache_interval(&self) -> Duration {
        Duration::from_secs(self.health.cache_interval_secs)
    }

    /// Copy of this configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.store.secret_key = REDACTED.to_string();
        copy
    }

    /// Render the configuration as TOML with secrets hidden
    pub fn to_redacted_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| Error::Config(e.to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, value: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("invalid value for {}: '{}' ({})", name, raw, e)))
        })
        .transpose()
}

fn or_default<T, F>(name: &str, value: Option<T>, default: F) -> T
where
    T: std::fmt::Display,
    F: FnOnce() -> T,
{
    match value {
        Some(v) => {
            info!("{}: {}", name, v);
            v
        }
        None => {
            let v = default();
            info!("Using default {}: {}", name, v);
            v
        }
    }
}

fn required(name: &str, value: Option<String>, secret: bool, missing: &mut Vec<String>) -> String {
    match value {
        Some(v) => {
            info!("{}: {}", name, if secret { REDACTED } else { v.as_str() });
            v
        }
        None => {
            missing.push(name.to_string());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        (ENV_BUCKET, "photos"),
        (ENV_ACCESS_KEY, "AKIAEXAMPLE"),
        (ENV_SECRET_KEY, "s3cr3t"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = PartialConfig::from_lookup(lookup(&REQUIRED))
            .unwrap()
            .resolve()
            .unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.store.region, "us-east-1");
        assert_eq!(config.store.endpoint, "http://minio:9000");
        assert_eq!(config.store.bucket, "photos");
        assert!(config.store.path_style);
        assert_eq!(config.health.path, "healthz");
        assert_eq!(config.health.file, ".rest-minio-proxy");
        assert_eq!(config.health.cache_interval_secs, 120);
        assert_eq!(config.listen_address(), "0.0.0.0:8000");
        assert_eq!(config.health_cache_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_all_missing_keys_reported() {
        let err = PartialConfig::from_lookup(lookup(&[(ENV_BUCKET, "")]))
            .unwrap()
            .resolve()
            .unwrap_err();

        match err {
            Error::MissingConfig(keys) => assert_eq!(
                keys,
                vec![ENV_BUCKET, ENV_ACCESS_KEY, ENV_SECRET_KEY]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push((ENV_HEALTH_CACHE_INTERVAL, "two minutes"));
        let err = PartialConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(ENV_HEALTH_CACHE_INTERVAL));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = PartialConfig::from_str(
            r#"
port = 9000
bucket = "from-file"
access_key = "file-key"
secret_key = "file-secret"
health_file = ".probe"
health_cache_interval = 30
"#,
        )
        .unwrap();
        let env = PartialConfig::from_lookup(lookup(&[
            (ENV_BUCKET, "from-env"),
            (ENV_HEALTH_PATH, "/ready"),
        ]))
        .unwrap();

        let config = file.overlay(env).resolve().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.store.bucket, "from-env");
        assert_eq!(config.store.access_key, "file-key");
        assert_eq!(config.health.path, "ready");
        assert_eq!(config.health.file, ".probe");
        assert_eq!(config.health.cache_interval_secs, 30);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bucket = \"photos\"\nregion = \"eu-west-1\"").unwrap();

        let partial = PartialConfig::from_file(file.path()).unwrap();
        assert_eq!(partial.bucket.as_deref(), Some("photos"));
        assert_eq!(partial.region.as_deref(), Some("eu-west-1"));
        assert!(partial.access_key.is_none());
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push((ENV_ENDPOINT, "minio:9000"));
        let err = PartialConfig::from_lookup(lookup(&vars))
            .unwrap()
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_redacted_toml_hides_secret() {
        let config = PartialConfig::from_lookup(lookup(&REQUIRED))
            .unwrap()
            .resolve()
            .unwrap();
        let rendered = config.to_redacted_toml().unwrap();
        assert!(rendered.contains("bucket = \"photos\""));
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains(REDACTED));
    }
}
