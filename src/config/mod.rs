//! # Configuration
//!
//! Every setting comes from a `SOCIAL_METADATA_*` variable, read from layered
//! `.env` files under the working directory and then the process environment:
//!
//! | layer                   | wins over          |
//! |-------------------------|--------------------|
//! | `.env`                  |                    |
//! | `.env.local`            | `.env`             |
//! | `.env.{profile}`        | both above         |
//! | `.env.{profile}.local`  | all files          |
//! | process environment     | everything         |

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, str::FromStr};

use serde::Serialize;
use thiserror::Error;
use url::Url;

const ENV_PREFIX: &str = "SOCIAL_METADATA_";

/// Upper bound for cached Graph API responses, in seconds.
pub const MAX_CACHE_TTL_SECONDS: u64 = 300;

const DEFAULT_PROFILE: &str = "local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://social-metadata.db?mode=rwc";
const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/";
const DEFAULT_FACEBOOK_BASE: &str = "https://facebook.com/";
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Profiles allowed to run without operator tokens.
const DEVELOPMENT_PROFILES: [&str; 2] = ["local", "test"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    pub profile: String,
    pub api_bind_addr: String,
    pub log_level: String,
    /// `json` or `pretty`
    pub log_format: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operator_tokens: Vec<String>,
    /// Base URL of the Graph API; every request path is appended to it.
    pub graph_api_base: String,
    /// Public site base used for event links.
    pub facebook_base: String,
    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,
    /// Offset applied to "now" when highlighting today's business hours.
    pub display_utc_offset_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            api_bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: 10,
            db_acquire_timeout_ms: 5000,
            operator_tokens: Vec::new(),
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            facebook_base: DEFAULT_FACEBOOK_BASE.to_string(),
            cache_ttl_seconds: MAX_CACHE_TTL_SECONDS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            display_utc_offset_minutes: 0,
        }
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// JSON dump for startup logs, with operator tokens replaced.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if !config.operator_tokens.is_empty() {
            config.operator_tokens = vec!["[REDACTED]".to_string()];
        }
        serde_json::to_string(&config)
    }

    fn check_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
        let usable = value.ends_with('/')
            && Url::parse(value).is_ok_and(|url| !url.cannot_be_a_base());
        if usable {
            Ok(())
        } else {
            Err(ConfigError::InvalidBaseUrl {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Cross-field and range checks run after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
                source,
            })?;

        if self.operator_tokens.is_empty()
            && !DEVELOPMENT_PROFILES.contains(&self.profile.as_str())
        {
            return Err(ConfigError::MissingOperatorTokens);
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        Self::check_base_url("GRAPH_API_BASE", &self.graph_api_base)?;
        Self::check_base_url("FACEBOOK_BASE", &self.facebook_base)?;

        if !(1..=MAX_CACHE_TTL_SECONDS).contains(&self.cache_ttl_seconds) {
            return Err(ConfigError::InvalidCacheTtl {
                value: self.cache_ttl_seconds,
            });
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity);
        }

        // chrono's FixedOffset accepts strictly less than one day
        if self.display_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidUtcOffset {
                value: self.display_utc_offset_minutes,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error(
        "no operator tokens configured; set SOCIAL_METADATA_OPERATOR_TOKEN or SOCIAL_METADATA_OPERATOR_TOKENS"
    )]
    MissingOperatorTokens,
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("{field} must be an absolute URL ending with '/', got '{value}'")]
    InvalidBaseUrl { field: String, value: String },
    #[error("cache ttl must be between 1 and 300 seconds, got {value}")]
    InvalidCacheTtl { value: u64 },
    #[error("cache capacity must be greater than zero")]
    InvalidCacheCapacity,
    #[error("display utc offset must be within +/- 1439 minutes, got {value}")]
    InvalidUtcOffset { value: i32 },
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber { key: String, value: String },
}

/// Prefix-stripped settings collected from every layer; later inserts win.
#[derive(Debug, Default)]
struct Layers(BTreeMap<String, String>);

impl Layers {
    fn absorb<I: IntoIterator<Item = (String, String)>>(&mut self, pairs: I) {
        for (key, value) in pairs {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                self.0.insert(name.to_string(), value);
            }
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    fn number_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.text(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
                key: format!("{ENV_PREFIX}{key}"),
                value: raw,
            }),
        }
    }

    /// `OPERATOR_TOKENS` (comma separated) takes precedence over `OPERATOR_TOKEN`.
    fn operator_tokens(&self) -> Vec<String> {
        match (self.text("OPERATOR_TOKENS"), self.text("OPERATOR_TOKEN")) {
            (Some(list), _) => list
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        }
    }
}

/// Builds [`AppConfig`] from env files and the process environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader reading env files from the working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut layers = Layers::default();
        self.read_file(".env", &mut layers)?;
        self.read_file(".env.local", &mut layers)?;

        // The profile picks the next files, so the environment is consulted early.
        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| layers.text("PROFILE"))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        self.read_file(&format!(".env.{profile}"), &mut layers)?;
        self.read_file(&format!(".env.{profile}.local"), &mut layers)?;

        layers.absorb(env::vars());

        let defaults = AppConfig::default();
        let config = AppConfig {
            profile: layers.text("PROFILE").unwrap_or(profile),
            api_bind_addr: layers.text_or("API_BIND_ADDR", &defaults.api_bind_addr),
            log_level: layers.text_or("LOG_LEVEL", &defaults.log_level),
            log_format: layers.text_or("LOG_FORMAT", &defaults.log_format),
            database_url: layers.text_or("DATABASE_URL", &defaults.database_url),
            db_max_connections: layers
                .number_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout_ms: layers
                .number_or("DB_ACQUIRE_TIMEOUT_MS", defaults.db_acquire_timeout_ms)?,
            operator_tokens: layers.operator_tokens(),
            graph_api_base: layers.text_or("GRAPH_API_BASE", &defaults.graph_api_base),
            facebook_base: layers.text_or("FACEBOOK_BASE", &defaults.facebook_base),
            cache_ttl_seconds: layers.number_or("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
            cache_capacity: layers.number_or("CACHE_CAPACITY", defaults.cache_capacity)?,
            display_utc_offset_minutes: layers.number_or(
                "DISPLAY_UTC_OFFSET_MINUTES",
                defaults.display_utc_offset_minutes,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Merges one env file; a missing file is an empty layer.
    fn read_file(&self, name: &str, layers: &mut Layers) -> Result<(), ConfigError> {
        let path = self.base_dir.join(name);
        let entries = match dotenvy::from_path_iter(&path) {
            Ok(entries) => entries,
            Err(dotenvy::Error::Io(ref io)) if io.kind() == std::io::ErrorKind::NotFound => {
                return Ok(());
            }
            Err(source) => return Err(ConfigError::EnvFile { path, source }),
        };

        let pairs = entries
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::EnvFile {
                path: path.clone(),
                source,
            })?;
        layers.absorb(pairs);
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
