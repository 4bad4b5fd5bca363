use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::ServiceType;

pub const GEOCODE_API_KEY_ENV: &str = "YANDEX_GEOCODING_API_KEY";
pub const SUGGEST_API_KEY_ENV: &str = "YANDEX_SUGGEST_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub upstream: UpstreamConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Number of tokio worker threads (default: 0)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:geocache.db".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 0,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
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
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub geocode_url: String,

    pub suggest_url: String,

    pub request_timeout_seconds: u64,

    pub user_agent: String,

    /// Usually supplied through `YANDEX_GEOCODING_API_KEY` rather than the file.
    pub geocode_api_key: Option<String>,

    /// Usually supplied through `YANDEX_SUGGEST_API_KEY` rather than the file.
    pub suggest_api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geocode_url: "https://geocode-maps.yandex.ru/1.x/".to_string(),
            suggest_url: "https://suggest-maps.yandex.ru/v1/suggest".to_string(),
            request_timeout_seconds: 30,
            user_agent: format!("geocache/{}", env!("CARGO_PKG_VERSION")),
            geocode_api_key: None,
            suggest_api_key: None,
        }
    }
}

impl UpstreamConfig {
    /// Credential for a service; blank keys count as missing.
    #[must_use]
    pub fn api_key(&self, service: ServiceType) -> Option<&str> {
        let key = match service {
            ServiceType::Geocode => self.geocode_api_key.as_deref(),
            ServiceType::Suggest => self.suggest_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    #[must_use]
    pub fn endpoint(&self, service: ServiceType) -> &str {
        match service {
            ServiceType::Geocode => &self.geocode_url,
            ServiceType::Suggest => &self.suggest_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads the config file (explicit path or the first one found), then
    /// overlays credentials from the process environment and `.env`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = if let Some(path) = explicit {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(path)?
        } else {
            Self::load_first_existing()?
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_first_existing() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment credentials win over the ones from the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(GEOCODE_API_KEY_ENV) {
            self.upstream.geocode_api_key = Some(key);
        }
        if let Some(key) = lookup(SUGGEST_API_KEY_ENV) {
            self.upstream.suggest_api_key = Some(key);
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("geocache").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".geocache").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.geocode_url.is_empty() || self.upstream.suggest_url.is_empty() {
            anyhow::bail!("Upstream endpoint URLs cannot be empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!(
                "min_db_connections ({}) cannot exceed max_db_connections ({})",
                self.general.min_db_connections,
                self.general.max_db_connections
            );
        }

        Ok(())
    }
}
