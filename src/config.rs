//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use chrono::Weekday;
use std::env;

/// Which storage backend the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Google Cloud Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    Firestore,
    /// Process-local store. Data is lost on restart.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Storage backend selection
    pub storage: StorageBackend,
    /// First weekday of a heatmap column
    pub heatmap_week_start: Weekday,

    // --- Secrets ---
    /// Shared HS256 key used by the identity provider to sign session tokens
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests: memory storage and a fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
            heatmap_week_start: Weekday::Tue,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StorageBackend::Firestore,
        };

        let heatmap_week_start = match env::var("HEATMAP_WEEK_START") {
            Ok(raw) => raw
                .trim()
                .parse::<Weekday>()
                .map_err(|_| ConfigError::Invalid("HEATMAP_WEEK_START", raw.clone()))?,
            Err(_) => Weekday::Tue,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage,
            heatmap_week_start,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("STORAGE_BACKEND", "memory");
        env::set_var("HEATMAP_WEEK_START", "sun");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.heatmap_week_start, Weekday::Sun);
    }

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(
            "Firestore".parse::<StorageBackend>().unwrap(),
            StorageBackend::Firestore
        );
        assert!("postgres".parse::<StorageBackend>().is_err());
    }
}
