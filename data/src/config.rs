use serde::{Deserialize, Serialize};
use std::fs;

use crate::data_path;

const CONFIG_FILE: &str = "config.json";
const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Persisted settings. Unknown or absent fields fall back to defaults so
/// old config files keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
}

impl Config {
    /// A missing config file is not an error; it just yields defaults.
    pub fn load() -> Result<Self, Error> {
        let path = data_path(Some(CONFIG_FILE));

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The API key to use, with the environment taking precedence over
    /// the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}
