//! Mapper cache: memory LRU backed by a directory of cache files.
//!
//! Lookup order is memory, then cache file, then a fresh build which is
//! persisted for the next run.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use tracing::{info, warn};

use crate::config::RegridConfig;
use crate::error::{RegridError, Result};
use crate::mapper::RegularGridMapper;

/// Cache key: grid id plus the bit pattern of the resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapperKey {
    grid_id: String,
    resolution_bits: u64,
}

impl MapperKey {
    pub fn new(grid_id: impl Into<String>, resolution: f64) -> Self {
        Self {
            grid_id: grid_id.into(),
            resolution_bits: resolution.to_bits(),
        }
    }

    pub fn grid_id(&self) -> &str {
        &self.grid_id
    }

    pub fn resolution(&self) -> f64 {
        f64::from_bits(self.resolution_bits)
    }

    /// Cache file name, `<grid id>_<resolution>.rgm`.
    pub fn file_name(&self) -> String {
        mapper_file_name(&self.grid_id, self.resolution())
    }
}

/// Cache file name for a grid id and resolution.
pub fn mapper_file_name(grid_id: &str, resolution: f64) -> String {
    format!("{}_{}.rgm", grid_id, resolution)
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperCacheStats {
    pub memory_hits: u64,
    pub file_loads: u64,
    pub builds: u64,
    pub entries: usize,
}

/// Caches mappers per (grid id, resolution).
pub struct MapperCache {
    memory: LruCache<MapperKey, Arc<RegularGridMapper>>,
    directory: Option<PathBuf>,
    zero_distance_weight: f64,
    memory_hits: u64,
    file_loads: u64,
    builds: u64,
}

impl MapperCache {
    pub fn new(config: &RegridConfig) -> Result<Self> {
        config.validate().map_err(RegridError::config)?;
        let capacity = NonZeroUsize::new(config.cache_capacity)
            .ok_or_else(|| RegridError::config("cache_capacity must be > 0"))?;
        Ok(Self {
            memory: LruCache::new(capacity),
            directory: config.cache_dir.clone(),
            zero_distance_weight: config.zero_distance_weight,
            memory_hits: 0,
            file_loads: 0,
            builds: 0,
        })
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Path of the cache file for `key`, when a directory is configured.
    pub fn file_path(&self, key: &MapperKey) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(key.file_name()))
    }

    /// Return the mapper for the grid, loading or building it on a miss.
    ///
    /// `latitude` and `longitude` are only read when the mapper has to be
    /// built. An unreadable cache file is rebuilt and overwritten.
    pub fn get_or_build(
        &mut self,
        grid_id: &str,
        resolution: f64,
        latitude: &[f64],
        longitude: &[f64],
    ) -> Result<Arc<RegularGridMapper>> {
        let key = MapperKey::new(grid_id, resolution);
        if let Some(mapper) = self.memory.get(&key) {
            self.memory_hits += 1;
            return Ok(Arc::clone(mapper));
        }

        let path = self.file_path(&key);
        if let Some(path) = path.as_deref().filter(|p| p.exists()) {
            match RegularGridMapper::load(path) {
                Ok(mapper) => {
                    self.file_loads += 1;
                    return Ok(self.remember(key, mapper));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable mapper cache file");
                }
            }
        }

        info!(grid_id, resolution, "Building regular grid mapper");
        let mapper = RegularGridMapper::build(latitude, longitude, resolution)?;
        self.builds += 1;

        if let Some(path) = path {
            if let Err(e) = self.persist(&path, &mapper) {
                warn!(path = %path.display(), error = %e, "Failed to persist mapper cache file");
            }
        }

        Ok(self.remember(key, mapper))
    }

    fn persist(&self, path: &Path, mapper: &RegularGridMapper) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        mapper.save(path)
    }

    fn remember(&mut self, key: MapperKey, mapper: RegularGridMapper) -> Arc<RegularGridMapper> {
        let mapper = Arc::new(mapper.with_zero_distance_weight(self.zero_distance_weight));
        self.memory.put(key, Arc::clone(&mapper));
        mapper
    }

    pub fn stats(&self) -> MapperCacheStats {
        MapperCacheStats {
            memory_hits: self.memory_hits,
            file_loads: self.file_loads,
            builds: self.builds,
            entries: self.memory.len(),
        }
    }
}
