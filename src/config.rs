use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../config/config.toml");
const TCG_API_KEY_ENV: &str = "POKEMONTCG_API_KEY";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    pub pokemon: PokemonConfig,
    pub tcg: TcgConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub moves: MovesConfig,
    pub random: RandomConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PokemonConfig {
    pub api_url: String,
    pub timeout: u32,
    pub cache_enabled: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TcgConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    pub page_size: u32,
    pub max_workers: usize,
    pub max_retries: u32,
    pub timeout: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CatalogConfig {
    pub path: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CacheConfig {
    pub r#type: String,
    pub max_size: u32,
    pub expiration: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MovesConfig {
    pub page_size: usize,
    pub max_concurrent: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RandomConfig {
    pub max_id: u32,
}

impl Config {
    /// Loads the configuration from `path`, or the compiled-in defaults when
    /// no path is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config_str = match path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                tracing::error!("Failed to read config file {}: {}", path.display(), e);
                AppError::Config(format!("cannot read {}: {}", path.display(), e))
            })?,
            None => DEFAULT_CONFIG.to_string(),
        };

        let mut config = Self::parse(&config_str)?;
        if let Ok(key) = std::env::var(TCG_API_KEY_ENV) {
            if !key.is_empty() {
                tracing::debug!("Using TCG API key from {}", TCG_API_KEY_ENV);
                config.tcg.api_key = key;
            }
        }
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(config_str).map_err(|e| {
            tracing::error!("Failed to parse config: {}", e);
            AppError::from(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pokemon.api_url.is_empty() {
            return Err(AppError::Config("pokemon.api_url must not be empty".to_string()));
        }
        if self.moves.page_size == 0 {
            return Err(AppError::Config("moves.page_size must be positive".to_string()));
        }
        if self.moves.max_concurrent == 0 || self.tcg.max_workers == 0 {
            return Err(AppError::Config(
                "moves.max_concurrent and tcg.max_workers must be positive".to_string(),
            ));
        }
        if self.tcg.page_size == 0 || self.tcg.max_retries == 0 {
            return Err(AppError::Config(
                "tcg.page_size and tcg.max_retries must be positive".to_string(),
            ));
        }
        if self.random.max_id == 0 {
            return Err(AppError::Config("random.max_id must be positive".to_string()));
        }
        Ok(())
    }
}
