use crate::client::Transport;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-lifetime memo of downloaded audio (creature cries), keyed by URL.
///
/// Two concurrent misses for the same URL both download; the later insert
/// replaces an identical value.
pub struct AssetCache<T> {
    transport: Arc<T>,
    store: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl<T: Transport> AssetCache<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            store: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.store.lock().ok()?.get(url).cloned()
    }

    pub async fn get(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        if let Some(bytes) = self.cached(url) {
            tracing::debug!("Audio cache hit for {}", url);
            return Ok(bytes);
        }

        let bytes = Arc::new(self.transport.get_bytes(url).await?);
        match self.store.lock() {
            Ok(mut store) => {
                store.insert(url.to_string(), Arc::clone(&bytes));
            }
            Err(e) => tracing::warn!("Failed to cache audio for {}: {}", url, e),
        }
        Ok(bytes)
    }

    pub fn len(&self) -> usize {
        self.store.lock().map(|store| store.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
