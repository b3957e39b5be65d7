//! Configuration de l'application.
//!
//! Le fichier `config.json` ne requiert que `token` et `app_id`, les autres
//! champs ont une valeur par défaut.
//!
//! ```json
//! {
//!     "token": "...",
//!     "app_id": 123456789,
//!     "data_dir": "./data",
//!     "auction": { "minimum_worth": 10000000, "max_bid_percent": 30 },
//!     "catalog": { "url": "https://api.gwapes.com/items", "refresh_interval_secs": 21600 }
//! }
//! ```

use std::{path::{Path, PathBuf}, time::Duration};

use serde::{Deserialize, Serialize};

use crate::components::auction::{
    lifecycle::{LifecycleSettings, MAX_CLOSE_DELAY_SECS},
    validator::AuctionRules,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("lecture de {0} impossible: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("format de {0} invalide: {1}")]
    Parse(PathBuf, serde_json::Error),
    #[error("champ `{0}` invalide: {1}")]
    Invalid(&'static str, &'static str),
}

/// Règles des enchères.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Valeur totale minimale d'un lot
    pub minimum_worth: i64,
    /// Part maximale (en %) de la valeur totale pour la mise de départ
    pub max_bid_percent: i64,
    pub close_delay_secs: u64,
    /// Score minimal de la recherche d'objet, entre 0 et 100
    pub match_threshold: f64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        let settings = LifecycleSettings::default();
        Self {
            minimum_worth: settings.rules.minimum_worth,
            max_bid_percent: settings.rules.max_bid_percent,
            close_delay_secs: settings.close_delay_secs,
            match_threshold: settings.match_threshold,
        }
    }
}

/// Source du cache des objets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub refresh_interval_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: "https://api.gwapes.com/items".to_string(),
            timeout_secs: 5,
            refresh_interval_secs: 6 * 3600,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub token: String,
    pub app_id: u64,
    /// Dossier des fichiers JSON du bot
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub auction: AuctionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Lit et vérifie le fichier de configuration.
    pub fn read_file<P: AsRef<Path>>(filepath: P) -> Result<Self, ConfigError> {
        let filepath = filepath.as_ref();
        let content = std::fs::read_to_string(filepath)
            .map_err(|e| ConfigError::Read(filepath.to_path_buf(), e))?;
        Self::from_json(&content)
            .map_err(|e| match e {
                ConfigError::Parse(_, e) => ConfigError::Parse(filepath.to_path_buf(), e),
                e => e,
            })
    }
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("token", "ne doit pas être vide"));
        }
        if self.auction.minimum_worth < 0 {
            return Err(ConfigError::Invalid("auction.minimum_worth", "doit être positif"));
        }
        if !(0..=100).contains(&self.auction.max_bid_percent) {
            return Err(ConfigError::Invalid("auction.max_bid_percent", "doit être entre 0 et 100"));
        }
        if !(0.0..=100.0).contains(&self.auction.match_threshold) {
            return Err(ConfigError::Invalid("auction.match_threshold", "doit être entre 0 et 100"));
        }
        if self.auction.close_delay_secs > MAX_CLOSE_DELAY_SECS {
            return Err(ConfigError::Invalid("auction.close_delay_secs", "ne doit pas dépasser un an"));
        }
        if self.catalog.url.is_empty() {
            return Err(ConfigError::Invalid("catalog.url", "ne doit pas être vide"));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid("catalog.timeout_secs", "doit être supérieur à 0"));
        }
        if self.catalog.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("catalog.refresh_interval_secs", "doit être supérieur à 0"));
        }
        Ok(())
    }
    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            rules: AuctionRules {
                minimum_worth: self.auction.minimum_worth,
                max_bid_percent: self.auction.max_bid_percent,
            },
            match_threshold: self.auction.match_threshold,
            close_delay_secs: self.auction.close_delay_secs,
        }
    }
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.catalog.refresh_interval_secs)
    }
}
