//! Model Registry - lag -> loaded model cache
//!
//! Each lag is loaded at most once. Lookups, loads and evictions all happen
//! under one mutex, so concurrent first requests for a lag share one load.
//! Status reads never touch that mutex; they see a copy of the key order
//! refreshed after every cache access.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::models::artifact_path;
use crate::runtime::{Model, ModelRuntime};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("No model found for lag={lag} at {}", path.display())]
    NotFound { lag: i64, path: PathBuf },

    #[error("Error loading model for lag={lag} from {}: {message}", path.display())]
    Load {
        lag: i64,
        path: PathBuf,
        message: String,
    },
}

/// Point-in-time view of the cache
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    /// Most recently used first
    pub cached_lags: Vec<i64>,
    /// `None` when unbounded
    pub capacity: Option<usize>,
    pub loads: u64,
    pub hits: u64,
}

pub struct ModelRegistry {
    models_dir: PathBuf,
    extension: String,
    runtime: Arc<dyn ModelRuntime>,
    capacity: Option<NonZeroUsize>,
    cache: Mutex<LruCache<i64, Arc<dyn Model>>>,
    /// Cached lags, most recently used first
    cached_lags: RwLock<Vec<i64>>,
    loads: AtomicU64,
    hits: AtomicU64,
}

impl ModelRegistry {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        runtime: Arc<dyn ModelRuntime>,
        capacity: Option<NonZeroUsize>,
    ) -> Self {
        let cache = match capacity {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            models_dir: models_dir.into(),
            extension: extension.into(),
            runtime,
            capacity,
            cache: Mutex::new(cache),
            cached_lags: RwLock::new(Vec::new()),
            loads: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn runtime_name(&self) -> &'static str {
        self.runtime.name()
    }

    /// Where the artifact for `lag` is expected on disk
    pub fn artifact_path(&self, lag: i64) -> PathBuf {
        artifact_path(&self.models_dir, lag, &self.extension)
    }

    /// Return the model for `lag`, loading it on first use
    pub fn get_model(&self, lag: i64) -> Result<Arc<dyn Model>, RegistryError> {
        let mut cache = self.cache.lock();

        if let Some(model) = cache.get(&lag).map(Arc::clone) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.publish_order(&cache);
            tracing::debug!("Model cache hit for lag={}", lag);
            return Ok(model);
        }

        let path = self.artifact_path(lag);
        if !path.exists() {
            return Err(RegistryError::NotFound { lag, path });
        }

        let model = self
            .runtime
            .load(&path)
            .map_err(|e| RegistryError::Load {
                lag,
                path: path.clone(),
                message: e.to_string(),
            })?;

        if let Some((evicted, _)) = cache.push(lag, Arc::clone(&model)) {
            tracing::info!("Evicted model for lag={} (cache full)", evicted);
        }
        self.publish_order(&cache);
        self.loads.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Model for lag={} loaded from {}", lag, path.display());

        Ok(model)
    }

    fn publish_order(&self, cache: &LruCache<i64, Arc<dyn Model>>) {
        *self.cached_lags.write() = cache.iter().map(|(lag, _)| *lag).collect();
    }

    /// Does not wait for in-flight loads
    pub fn snapshot(&self) -> RegistryStatus {
        RegistryStatus {
            cached_lags: self.cached_lags.read().clone(),
            capacity: self.capacity.map(NonZeroUsize::get),
            loads: self.loads.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}
