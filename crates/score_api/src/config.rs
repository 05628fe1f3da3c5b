//! Service configuration management
//!
//! Settings come from `config/<environment>.toml` when that file exists and
//! from built-in defaults otherwise; environment variables override both.

use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
    Testing,
}

impl Environment {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" | "stage" => Ok(Self::Staging),
            "testing" | "test" => Ok(Self::Testing),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(ServiceError::ConfigError(format!(
                "Unknown environment: {value}"
            ))),
        }
    }

    fn config_file(&self) -> &'static str {
        match self {
            Self::Production => "config/production.toml",
            Self::Staging => "config/staging.toml",
            Self::Testing => "config/testing.toml",
            Self::Development => "config/development.toml",
        }
    }
}

/// Listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locations of the files loaded at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub metadata_path: PathBuf,
    pub feature_mapping_path: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.json"),
            scaler_path: PathBuf::from("models/scaler.json"),
            metadata_path: PathBuf::from("models/model_metadata.json"),
            feature_mapping_path: PathBuf::from("models/feature_mapping.json"),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactPaths,
}

impl ServiceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ServiceError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Io(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides looked up by variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ServiceError::ConfigError(format!("Invalid PORT: {port}")))?;
        }
        if let Some(limit) = lookup("MAX_BODY_BYTES") {
            self.server.max_body_bytes = limit.trim().parse().map_err(|_| {
                ServiceError::ConfigError(format!("Invalid MAX_BODY_BYTES: {limit}"))
            })?;
        }
        for (key, slot) in [
            ("MODEL_PATH", &mut self.artifacts.model_path),
            ("SCALER_PATH", &mut self.artifacts.scaler_path),
            ("METADATA_PATH", &mut self.artifacts.metadata_path),
            ("FEATURE_MAPPING_PATH", &mut self.artifacts.feature_mapping_path),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = PathBuf::from(value);
            }
        }
        Ok(())
    }
}

/// Resolves the environment and the effective configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ServiceConfig,
    environment: Environment,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ServiceError> {
        let environment = Self::detect_environment()?;
        let mut config = match env::var("SCORING_CONFIG") {
            Ok(path) => ServiceConfig::load_from_file(path)?,
            Err(_) => Self::load_config(&environment)?,
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(Self {
            config,
            environment,
        })
    }

    pub fn get_config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn get_environment(&self) -> Environment {
        self.environment
    }

    fn detect_environment() -> Result<Environment, ServiceError> {
        let env_str = env::var("SCORING_ENV")
            .or_else(|_| env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "development".to_string());
        Environment::parse(&env_str)
    }

    fn load_config(environment: &Environment) -> Result<ServiceConfig, ServiceError> {
        let config_path = environment.config_file();
        if Path::new(config_path).exists() {
            ServiceConfig::load_from_file(config_path)
        } else {
            Ok(ServiceConfig::default())
        }
    }
}
