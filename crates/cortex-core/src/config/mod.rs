mod cost_config;
mod embedding_config;
mod server_config;
mod storage_config;

pub use cost_config::CostConfig;
pub use embedding_config::EmbeddingConfig;
pub use server_config::ServerConfig;
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

use crate::errors::CortexError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CortexConfig {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub cost: CostConfig,
    pub server: ServerConfig,
}

impl CortexConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Overlays `CORTEX_`-prefixed environment variables (§6) onto defaults.
    /// Unset variables fall back to whatever the struct already carries.
    pub fn from_env() -> Result<Self, CortexError> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CORTEX_DATABASE_URL") {
            config.storage.database_url = v;
        }
        if let Ok(v) = std::env::var("CORTEX_EMBEDDING_MODEL") {
            config.embedding.model = v;
        }
        if let Ok(v) = std::env::var("CORTEX_EMBEDDING_DIM") {
            config.embedding.dimensions = v
                .parse()
                .map_err(|_| CortexError::ConfigError(format!("invalid CORTEX_EMBEDDING_DIM: {v}")))?;
        }
        if let Ok(v) = std::env::var("CORTEX_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = std::env::var("CORTEX_PORT") {
            config.server.port = v
                .parse()
                .map_err(|_| CortexError::ConfigError(format!("invalid CORTEX_PORT: {v}")))?;
        }
        if let Ok(v) = std::env::var("CORTEX_DEFAULT_INPUT_TOKEN_COST") {
            config.cost.default_input_token_cost = v
                .parse()
                .map_err(|_| CortexError::ConfigError("invalid CORTEX_DEFAULT_INPUT_TOKEN_COST".into()))?;
        }
        if let Ok(v) = std::env::var("CORTEX_DEFAULT_OUTPUT_TOKEN_COST") {
            config.cost.default_output_token_cost = v
                .parse()
                .map_err(|_| CortexError::ConfigError("invalid CORTEX_DEFAULT_OUTPUT_TOKEN_COST".into()))?;
        }
        if let Ok(v) = std::env::var("CORTEX_CORS_ORIGINS") {
            config.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(config)
    }
}
