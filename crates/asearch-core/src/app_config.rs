use std::path::PathBuf;

use crate::regions::RegionCatalog;
use crate::types::{Region, RegionCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub api_base_url: String,
    pub log_level: String,
    pub default_region: RegionCode,
    pub regions: RegionCatalog,
    pub preferences_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub page_size: usize,
}

impl AppConfig {
    /// The region used when nothing has been persisted yet.
    #[must_use]
    pub fn default_region(&self) -> Region {
        self.regions.resolve(&self.default_region)
    }
}
