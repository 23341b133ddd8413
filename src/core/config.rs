//! Configuration management

use clap::Parser;
use config::{Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError as BuilderError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the token signing secret
pub const JWT_SECRET_ENV: &str = "JWT_SECRET_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid auth configuration: {0}")]
    InvalidAuth(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();

        let mut builder = with_defaults(ConfigBuilder::builder())?;

        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string()
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // Environment variables are prefixed with BOOKSHELF_ and use __ for nesting
        // Example: BOOKSHELF_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("BOOKSHELF")
                .separator("__")
                .try_parsing(true)
        );
        builder = with_secret_override(builder)?;

        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    ///
    /// Missing keys fall back to defaults; `JWT_SECRET_KEY` still overrides the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let builder = with_defaults(ConfigBuilder::builder())?
            .add_source(File::from(path));
        let config: Config = with_secret_override(builder)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.auth.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

fn with_defaults(builder: Builder<DefaultState>) -> Result<Builder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.request_timeout", 30)?
        .set_default("database.path", "./data/bookshelf.db")?
        .set_default("database.connection_pool_size", 10)?
        .set_default("database.busy_timeout", 5000)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "json")?
        .set_default("logging.output", "stdout")?
        .set_default("logging.max_file_size", 10485760)? // 10 MB
        .set_default("logging.max_backups", 5)?
        .set_default("auth.issuer", "bookshelf")?
        .set_default("auth.token_lifetime_secs", 31536000)? // 365 days
        .set_default("auth.bcrypt_cost", bcrypt::DEFAULT_COST)?
        .set_default("security.allowed_origins", vec!["*"])?)
}

fn with_secret_override(builder: Builder<DefaultState>) -> Result<Builder<DefaultState>, ConfigError> {
    match std::env::var(JWT_SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => Ok(builder.set_override("auth.jwt_secret", secret)?),
        _ => Ok(builder),
    }
}

/// Command-line arguments for configuration override
#[derive(Debug, Parser)]
#[command(name = "bookshelf")]
#[command(about = "Bookshelf REST API Server", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64, // seconds
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidServer("request_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: usize,
    pub busy_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase("connection_pool_size must be greater than 0".to_string()));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase("busy_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub max_file_size: usize, // bytes
    pub max_backups: usize,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string()
            ));
        }

        if self.max_file_size == 0 {
            return Err(ConfigError::InvalidLogging("max_file_size must be greater than 0".to_string()));
        }

        if self.max_backups == 0 {
            return Err(ConfigError::InvalidLogging("max_backups must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret; there is deliberately no default
    pub jwt_secret: Option<String>,
    pub issuer: String,
    pub token_lifetime_secs: i64,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.jwt_secret.as_deref() {
            None | Some("") => {
                return Err(ConfigError::InvalidAuth(format!(
                    "jwt_secret must be set (via {} or auth.jwt_secret)",
                    JWT_SECRET_ENV
                )));
            }
            Some(_) => {}
        }

        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidAuth("issuer cannot be empty".to_string()));
        }

        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidAuth("token_lifetime_secs must be greater than 0".to_string()));
        }

        let expiry = chrono::Duration::try_seconds(self.token_lifetime_secs)
            .and_then(|lifetime| chrono::Utc::now().checked_add_signed(lifetime));
        if expiry.is_none() {
            return Err(ConfigError::InvalidAuth("token_lifetime_secs is too large".to_string()));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidAuth("bcrypt_cost must be between 4 and 31".to_string()));
        }

        Ok(())
    }

    /// The validated signing secret
    pub fn secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity("allowed_origins cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn auth_config(secret: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.map(|s| s.to_string()),
            issuer: "bookshelf".to_string(),
            token_lifetime_secs: 3600,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        assert!(matches!(
            auth_config(None).validate(),
            Err(ConfigError::InvalidAuth(_))
        ));
        assert!(matches!(
            auth_config(Some("")).validate(),
            Err(ConfigError::InvalidAuth(_))
        ));
        assert!(auth_config(Some("a-real-secret")).validate().is_ok());
    }

    #[test]
    fn test_bcrypt_cost_range() {
        let mut config = auth_config(Some("s3cret"));
        config.bcrypt_cost = 3;
        assert!(config.validate().is_err());
        config.bcrypt_cost = 32;
        assert!(config.validate().is_err());
        config.bcrypt_cost = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_lifetime_must_be_positive() {
        let mut config = auth_config(Some("s3cret"));
        config.token_lifetime_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_lifetime_must_fit_a_timestamp() {
        let mut config = auth_config(Some("s3cret"));
        config.token_lifetime_secs = i64::MAX / 100;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAuth(_))));

        config.token_lifetime_secs = 31536000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_applies_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[auth]\njwt_secret = \"file-secret\"\nbcrypt_cost = 4"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.issuer, "bookshelf");
        assert_eq!(config.auth.token_lifetime_secs, 31536000);
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert!(!config.auth.secret().is_empty());
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(Path::new("/nonexistent/bookshelf.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_logging_file_output_requires_path() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
            output: "file".to_string(),
            log_file: None,
            max_file_size: 1024,
            max_backups: 1,
        };
        assert!(config.validate().is_err());
    }
}
