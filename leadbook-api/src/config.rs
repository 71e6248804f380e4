//! API Configuration Module
//!
//! Server binding, CORS, store backend selection and assignment limits.
//! Configuration is loaded from environment variables with sensible
//! defaults for development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use leadbook_core::AssignmentConfig;
use leadbook_storage::{InMemoryStore, LeadbookStore, LmdbStore};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// STORE BACKEND
// ============================================================================

/// Which `LeadbookStore` implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local maps; contents are lost on restart.
    #[default]
    Memory,
    /// Memory-mapped LMDB environment at `lmdb_path`.
    Lmdb,
}

impl FromStr for StoreBackend {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "lmdb" => Ok(StoreBackend::Lmdb),
            other => Err(ApiError::invalid_input(format!(
                "Unknown store backend '{}', expected memory or lmdb",
                other
            ))),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for binding, CORS and storage.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    pub store: StoreBackend,

    /// Directory of the LMDB environment.
    pub lmdb_path: PathBuf,

    /// LMDB map size in megabytes.
    pub lmdb_map_size_mb: usize,

    /// Limits handed to the engine.
    pub assignment: AssignmentConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            store: StoreBackend::Memory,
            lmdb_path: PathBuf::from("./data/leadbook"),
            lmdb_map_size_mb: 1024,
            assignment: AssignmentConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `LEADBOOK_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `LEADBOOK_API_PORT`: Listen port (default: 3000)
    /// - `LEADBOOK_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `LEADBOOK_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `LEADBOOK_STORE`: `memory` or `lmdb` (default: memory)
    /// - `LEADBOOK_LMDB_PATH`: LMDB directory (default: ./data/leadbook)
    /// - `LEADBOOK_LMDB_MAP_SIZE_MB`: LMDB map size (default: 1024)
    /// - `LEADBOOK_MAX_RANDOM_COUNT`: Largest random assignment (default: 1000)
    /// - `LEADBOOK_MAX_SPECIFIC_BATCH`: Largest specific assignment (default: 5000)
    ///
    /// Unparseable numbers fall back to their defaults; an unknown store
    /// backend or a bad port is an error.
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let bind_host =
            std::env::var("LEADBOOK_API_BIND").unwrap_or_else(|_| defaults.bind_host.clone());

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("LEADBOOK_API_PORT").ok())
        {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        let cors_origins = std::env::var("LEADBOOK_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = env_parse("LEADBOOK_CORS_MAX_AGE_SECS", defaults.cors_max_age_secs);

        let store = match std::env::var("LEADBOOK_STORE") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.store,
        };

        let lmdb_path = std::env::var("LEADBOOK_LMDB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.lmdb_path);

        let lmdb_map_size_mb = env_parse("LEADBOOK_LMDB_MAP_SIZE_MB", defaults.lmdb_map_size_mb);

        let assignment = AssignmentConfig {
            max_random_count: env_parse(
                "LEADBOOK_MAX_RANDOM_COUNT",
                defaults.assignment.max_random_count,
            ),
            max_specific_batch: env_parse(
                "LEADBOOK_MAX_SPECIFIC_BATCH",
                defaults.assignment.max_specific_batch,
            ),
        };

        Ok(Self {
            bind_host,
            port,
            cors_origins,
            cors_max_age_secs,
            store,
            lmdb_path,
            lmdb_map_size_mb,
            assignment,
        })
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Socket address built from `bind_host` and `port`.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Open the configured store backend.
    pub fn open_store(&self) -> ApiResult<Arc<dyn LeadbookStore>> {
        self.assignment.validate().map_err(|e| {
            ApiError::internal_error(format!("Invalid assignment limits: {}", e))
        })?;

        match self.store {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Arc::new(InMemoryStore::new()))
            }
            StoreBackend::Lmdb => {
                std::fs::create_dir_all(&self.lmdb_path).map_err(|e| {
                    ApiError::internal_error(format!(
                        "Failed to create LMDB directory {}: {}",
                        self.lmdb_path.display(),
                        e
                    ))
                })?;
                let store = LmdbStore::open(&self.lmdb_path, self.lmdb_map_size_mb)
                    .map_err(|e| ApiError::internal_error(format!("Failed to open LMDB: {}", e)))?;
                tracing::info!(path = %self.lmdb_path.display(), "Opened LMDB store");
                Ok(Arc::new(store))
            }
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
