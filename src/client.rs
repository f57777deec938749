//! Access to the remote catalog services.
//!
//! [`Transport`] is the seam between record decoding and the network: the
//! production implementation is [`HttpTransport`] (reqwest plus the response
//! cache), tests substitute an in-memory map of canned documents.

use crate::cache::{CacheTrait, InmemoryCache};
use crate::config::{CacheConfig, PokemonConfig};
use crate::error::{AppError, Result};
use crate::pokemon::{LocationAreaEncounter, Pokemon, Species, TypeRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub trait Transport: Send + Sync {
    /// GET a JSON document.
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value>> + Send;

    /// GET a binary asset (cry audio).
    fn get_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

pub struct HttpTransport {
    client: reqwest::Client,
    cache: Option<Arc<dyn CacheTrait<Value>>>,
}

impl HttpTransport {
    pub fn new(config: &PokemonConfig, cache_config: &CacheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1) as u64))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;

        let cache: Option<Arc<dyn CacheTrait<Value>>> =
            if config.cache_enabled && cache_config.r#type == "memory" {
                Some(Arc::new(InmemoryCache::new(cache_config)))
            } else {
                tracing::debug!("Response cache disabled");
                None
            };

        Ok(Self { client, cache })
    }

    pub fn cache(&self) -> Option<&Arc<dyn CacheTrait<Value>>> {
        self.cache.as_ref()
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("HTTP request to {} failed: {}", url, e);
            if e.is_timeout() {
                AppError::Unavailable(format!("request to {} timed out", url))
            } else {
                AppError::from(e)
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Resource not found: {}", url);
            return Err(AppError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            tracing::warn!("Request to {} failed with status: {}", url, status);
            return Err(AppError::Unavailable(format!(
                "{} answered with status {}",
                url, status
            )));
        }
        Ok(response)
    }
}

impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(url)) {
            return Ok(cached);
        }

        tracing::debug!("Fetching {}", url);
        let value = self.send(url).await?.json::<Value>().await.map_err(|e| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, e);
            AppError::Malformed(format!("{}: {}", url, e))
        })?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.insert(url.to_string(), value.clone()) {
                tracing::warn!("Failed to cache response for {}: {}", url, e);
            }
        }
        Ok(value)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading asset {}", url);
        let bytes = self.send(url).await?.bytes().await.map_err(AppError::from)?;
        Ok(bytes.to_vec())
    }
}

/// A normalised user query: numeric id or lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Id(u32),
    Name(String),
}

impl QueryKey {
    pub fn parse(input: &str) -> Result<QueryKey> {
        let key = input.trim().to_lowercase();
        if key.is_empty() {
            return Err(AppError::NotFound("empty query".to_string()));
        }
        if key.chars().all(|c| c.is_ascii_digit()) {
            return match key.parse::<u32>() {
                Ok(id) if id > 0 => Ok(QueryKey::Id(id)),
                _ => Err(AppError::NotFound(format!("no Pokémon with id {}", key))),
            };
        }
        if !key.chars().all(is_name_char) {
            return Err(AppError::NotFound(format!("no Pokémon named {}", key)));
        }
        Ok(QueryKey::Name(key))
    }
}

/// Characters that occur in creature names. Anything else (notably `/`, `?`
/// and `#`) would change which resource the request path addresses.
fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '\'' | ' ' | '♀' | '♂')
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Id(id) => write!(f, "{}", id),
            QueryKey::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Typed view of the PokeAPI service.
pub struct PokeApiClient<T> {
    transport: Arc<T>,
    base_url: String,
}

impl<T> Clone for PokeApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
        }
    }
}

impl<T: Transport> PokeApiClient<T> {
    pub fn new(transport: Arc<T>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches and decodes the record at `url`.
    pub async fn resource<R: DeserializeOwned>(&self, url: &str) -> Result<R> {
        let value = self.transport.get_json(url).await?;
        serde_json::from_value(value).map_err(|e| {
            tracing::error!("Unexpected document shape at {}: {}", url, e);
            AppError::Malformed(format!("{}: {}", url, e))
        })
    }

    pub async fn pokemon(&self, key: &QueryKey) -> Result<Pokemon> {
        let url = format!("{}/pokemon/{}", self.base_url, key);
        self.resource(&url).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound(format!("no Pokémon named or numbered {}", key)),
            other => other,
        })
    }

    /// Species of `pokemon`, via its species reference when present.
    pub async fn species(&self, pokemon: &Pokemon) -> Result<Species> {
        let url = if pokemon.species.url.is_empty() {
            format!("{}/pokemon-species/{}", self.base_url, pokemon.id)
        } else {
            pokemon.species.url.clone()
        };
        self.resource(&url).await
    }

    pub async fn type_record(&self, name: &str) -> Result<TypeRecord> {
        self.resource(&format!("{}/type/{}", self.base_url, name)).await
    }

    pub async fn encounters(&self, pokemon_id: u32) -> Result<Vec<LocationAreaEncounter>> {
        self.resource(&format!("{}/pokemon/{}/encounters", self.base_url, pokemon_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_normalises_names() {
        assert_eq!(
            QueryKey::parse("  Pikachu ").unwrap(),
            QueryKey::Name("pikachu".to_string())
        );
        assert_eq!(QueryKey::parse("025").unwrap(), QueryKey::Id(25));
        assert_eq!(QueryKey::parse("mr-mime").unwrap().to_string(), "mr-mime");
    }

    #[test]
    fn test_query_key_rejects_path_and_query_characters() {
        for input in ["25/encounters", "pikachu?x=1", "pikachu#moves", "../type/fire", "pika%2fchu"] {
            let err = QueryKey::parse(input).unwrap_err();
            assert!(err.is_not_found(), "{} gave {:?}", input, err);
        }
        assert_eq!(
            QueryKey::parse("Nidoran♀").unwrap(),
            QueryKey::Name("nidoran♀".to_string())
        );
        assert_eq!(
            QueryKey::parse("farfetch'd").unwrap(),
            QueryKey::Name("farfetch'd".to_string())
        );
    }

    #[test]
    fn test_query_key_rejects_empty_and_zero() {
        assert!(QueryKey::parse("   ").unwrap_err().is_not_found());
        assert!(QueryKey::parse("0").unwrap_err().is_not_found());
        assert!(QueryKey::parse("99999999999").unwrap_err().is_not_found());
    }
}
