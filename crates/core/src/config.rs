use crate::types::{DashboardVariant, MarginFormula};
use serde::Deserialize;

/// Root application configuration. Loaded from an optional
/// `sales-dashboard.toml` file and environment variables with the prefix
/// `SALES_DASHBOARD__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub variant: DashboardVariant,
    #[serde(default)]
    pub margin_formula: MarginFormula,
    /// Number of most frequent categories (or brands) pre-selected.
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_top_products")]
    pub top_products: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Rejected rows kept with their reasons; the count is always exact.
    #[serde(default = "default_max_rejection_samples")]
    pub max_rejection_samples: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

// Default functions
fn default_top_n() -> usize {
    250
}
fn default_top_products() -> usize {
    10
}
fn default_delimiter() -> char {
    ','
}
fn default_max_rejection_samples() -> usize {
    50
}
fn default_cache_enabled() -> bool {
    true
}
fn default_max_entries() -> usize {
    256
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            variant: DashboardVariant::default(),
            margin_formula: MarginFormula::default(),
            default_top_n: default_top_n(),
            top_products: default_top_products(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            max_rejection_samples: default_max_rejection_samples(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_max_entries(),
        }
    }
}

impl IngestConfig {
    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }
}

impl AppConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("sales-dashboard").required(false))
            .add_source(
                config::Environment::with_prefix("SALES_DASHBOARD")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
