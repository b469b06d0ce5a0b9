//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `tutorhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Token signing settings.
    pub auth: AuthConfig,
    /// Cross-origin settings.
    pub cors: CorsConfig,
    /// Avatar storage settings.
    pub uploads: UploadsConfig,
    /// Postal code directory settings.
    pub postal: PostalConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Bearer token lifetime.
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` or an empty list allows any.
    pub origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Directory avatars are written to and served from.
    pub root: PathBuf,
    /// Prefix for avatar URLs; the request `Host` is used when unset.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PostalConfig {
    /// ViaCEP-compatible base URL; `<base>/<cep>/json/` is queried.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from `tutorhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting settings are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("tutorhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("TUTORHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("TUTORHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("TUTORHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("TUTORHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("TUTORHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("TUTORHUB_JWT_SECRET") {
            self.auth.jwt_secret = val;
        }
        if let Some(hours) = var("TUTORHUB_TOKEN_TTL_HOURS").and_then(|val| val.parse().ok()) {
            self.auth.token_ttl_hours = hours;
        }
        if let Some(val) = var("TUTORHUB_CORS_ORIGINS") {
            self.cors.origins = val
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(val) = var("TUTORHUB_UPLOAD_ROOT") {
            self.uploads.root = PathBuf::from(val);
        }
        if let Some(val) = var("TUTORHUB_PUBLIC_BASE_URL") {
            self.uploads.public_base_url = Some(val).filter(|url| !url.trim().is_empty());
        }
        if let Some(val) = var("TUTORHUB_POSTAL_URL") {
            self.postal.base_url = val;
        }
        if let Some(secs) = var("TUTORHUB_POSTAL_TIMEOUT_SECS").and_then(|val| val.parse().ok()) {
            self.postal.timeout_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Validation(
                "jwt secret must not be empty".to_string(),
            ));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Validation(
                "token ttl must be positive".to_string(),
            ));
        }
        if self.postal.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "postal base url must not be empty".to_string(),
            ));
        }
        if self.postal.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "postal timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn token_ttl(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::hours(self.auth.token_ttl_hours)
    }

    #[must_use]
    pub fn postal_timeout(&self) -> Duration {
        Duration::from_secs(self.postal.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:tutorhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tutorhubd=info,tutorhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            token_ttl_hours: 168,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            public_base_url: None,
        }
    }
}

impl Default for PostalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://viacep.com.br/ws".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
