use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    InvalidVar {
        var: &'static str,
        message: String,
    },
}

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Base URL of the external pedigree verifier.
    pub verifier_base_url: String,
    /// Source tag stamped onto externally verified records.
    pub verifier_name: String,
    pub storage_base_url: String,
    pub storage_bucket: String,
    pub storage_service_key: Option<String>,
    /// Optional JSON file overriding the built-in test registry.
    pub registry_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidVar {
                var: "PORT",
                message: e.to_string(),
            })?,
            Err(_) => 3000,
        };

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            port,
            verifier_base_url: required("PEDIGREE_VERIFIER_URL")?,
            verifier_name: env::var("PEDIGREE_VERIFIER_NAME")
                .unwrap_or_else(|_| "kennel-registry".to_string()),
            storage_base_url: required("STORAGE_URL")?,
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "health-documents".to_string()),
            storage_service_key: env::var("STORAGE_SERVICE_KEY").ok(),
            registry_path: env::var("REGISTRY_PATH").ok().map(PathBuf::from),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
