pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// UI color scheme. Persisted across runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub theme: Theme,
    pub window_size: (f64, f64),
    pub window_position: (f64, f64),
    pub max_file_size_mb: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            window_size: (1100.0, 800.0),
            window_position: (100.0, 100.0),
            max_file_size_mb: 20,
        }
    }
}
