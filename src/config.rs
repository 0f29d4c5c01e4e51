//! Configuration for the DepScanner core

use serde::Deserialize;

/// Default canvas size used by the dependency-graph view
const DEFAULT_CANVAS_WIDTH: f64 = 3800.0;
const DEFAULT_CANVAS_HEIGHT: f64 = 1800.0;

/// Core configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Graph layout configuration
    pub graph: GraphConfig,
    /// Table listing configuration
    pub table: TableConfig,
    /// External API endpoints
    pub api: ApiConfig,
}

/// Graph layout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Canvas width in layout units
    pub width: f64,
    /// Canvas height in layout units
    pub height: f64,
    /// Pairwise charge strength (negative = repulsive)
    pub charge_strength: f64,
    /// Spring rest length along edges
    pub link_distance: f64,
    /// Minimum zoom scale
    pub scale_min: f64,
    /// Maximum zoom scale
    pub scale_max: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            charge_strength: -1000.0,
            link_distance: 250.0,
            scale_min: 0.5,
            scale_max: 10.0,
        }
    }
}

/// Table listing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Records per page
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

/// External API endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scanner backend base URL
    pub base_url: String,
    /// OSV.dev base URL
    pub osv_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            osv_base_url: "https://api.osv.dev/v1".to_string(),
        }
    }
}

impl ApiConfig {
    /// Both endpoints parse as URLs.
    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.base_url)?;
        url::Url::parse(&self.osv_base_url)?;
        Ok(())
    }
}

impl Config {
    /// Parse configuration from a JSON value, falling back to defaults on
    /// absent or unparseable input.
    pub fn from_json_value(value: Option<serde_json::Value>) -> Self {
        match value {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => Self::default(),
        }
    }
}
