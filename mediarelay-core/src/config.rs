use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
///
/// Built once at startup and shared read-only with every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub emby: EmbyConfig,
    pub alist: AlistConfig,
    pub redirect: RedirectConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9096,
        }
    }
}

/// Media library (Emby/Jellyfin) connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbyConfig {
    /// Base URL every unmatched request is forwarded to
    pub url: String,
    /// Used for item lookups when the client request carries no token
    pub api_key: String,
}

impl Default for EmbyConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8096".to_string(),
            api_key: String::new(),
        }
    }
}

/// How non-direct clients get their final URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Follow one redirect hop on the signed `/d` link
    #[default]
    Redirect,
    /// Ask `/api/fs/get` for the provider's `raw_url`
    RawUrl,
}

/// Storage backend (Alist) connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlistConfig {
    /// Internal address, reachable from this proxy
    pub url: String,
    /// Public address handed to direct-capable clients
    pub public_url: Option<String>,
    /// Signing secret, also sent as `Authorization`
    pub token: String,
    pub resolve_mode: ResolveMode,
}

impl Default for AlistConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5244".to_string(),
            public_url: None,
            token: String::new(),
            resolve_mode: ResolveMode::Redirect,
        }
    }
}

impl AlistConfig {
    /// Public base URL, ignoring an empty setting
    #[must_use]
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Redirect pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Path prefix under which the library sees storage-backed files
    pub mount_path: String,
    /// Case-insensitive User-Agent fragments of clients that may use the public URL
    pub direct_clients: Vec<String>,
    pub cache_ttl_seconds: u64,
    pub cache_capacity: u64,
    pub connect_timeout_seconds: u64,
    /// Total deadline for each library or storage API call
    pub upstream_timeout_seconds: u64,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            mount_path: String::new(),
            direct_clients: vec!["infuse".to_string()],
            cache_ttl_seconds: 60,
            cache_capacity: 10_000,
            connect_timeout_seconds: 10,
            upstream_timeout_seconds: 30,
        }
    }
}

impl RedirectConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    /// Daily-rolled log file; the date is appended to the file name
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // MEDIARELAY_EMBY__API_KEY, MEDIARELAY_REDIRECT__MOUNT_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("MEDIARELAY")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("redirect.direct_clients")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get listen address
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check the configuration, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_base_url("emby.url", &self.emby.url, &mut errors);
        check_base_url("alist.url", &self.alist.url, &mut errors);
        if let Some(public_url) = self.alist.public_url() {
            check_base_url("alist.public_url", public_url, &mut errors);
        }

        if self.alist.token.is_empty() {
            errors.push("alist.token must be set (it is the signing secret)".to_string());
        }
        if self.redirect.mount_path.is_empty() {
            errors.push("redirect.mount_path must be set".to_string());
        }
        if self.redirect.cache_ttl_seconds == 0 {
            errors.push("redirect.cache_ttl_seconds must be greater than 0".to_string());
        }
        if self.redirect.upstream_timeout_seconds == 0 {
            errors.push("redirect.upstream_timeout_seconds must be greater than 0".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_base_url(key: &str, value: &str, errors: &mut Vec<String>) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(format!("{key} must use http or https, got {}", url.scheme())),
        Err(e) => errors.push(format!("{key} is not a valid URL ({value}): {e}")),
    }
}
