use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
    pub pool_min_size: u32,
    pub pool_max_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "cortex.db".to_string(),
            pool_min_size: 5,
            pool_max_size: 32,
        }
    }
}
