//! # tide-config
//!
//! Layered configuration loading for Tidings using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TIDINGS_*` prefix, `__` as separator)
//! 2. Project-level `.tidings/config.toml`
//! 3. User-level `~/.config/tidings/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TIDINGS_LLM__API_KEY` -> `llm.api_key`,
//! `TIDINGS_PIPELINE__MAP_BATCH_SIZE` -> `pipeline.map_batch_size`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use tide_config::TidingsConfig;
//!
//! let config = TidingsConfig::load_with_dotenv().expect("config");
//! if config.llm.is_configured() {
//!     println!("synthesis model: {}", config.llm.synthesis_model);
//! }
//! ```

mod error;
mod llm;
mod pipeline;
mod store;

pub use error::ConfigError;
pub use llm::LlmConfig;
pub use pipeline::PipelineConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TidingsConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl TidingsConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a pipeline value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a pipeline value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".tidings/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("TIDINGS_").split("__"))
    }

    /// Reject configurations that would make the pipeline loop or never run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first zero-valued field,
    /// or `pipeline.lease_ttl_secs` when a run could lose its lease between
    /// two renewals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(field) = self.pipeline.zero_fields().first() {
            return Err(ConfigError::InvalidValue {
                field: (*field).to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let floor = self.pipeline.min_lease_ttl_secs();
        if self.pipeline.lease_ttl_secs < floor {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.lease_ttl_secs".to_string(),
                reason: format!(
                    "must be at least {floor} (slowest model timeout plus three store timeouts)"
                ),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tidings").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or falls back to the
    /// current dir. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}
