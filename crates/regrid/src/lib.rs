//! Regular grid mapping for curvilinear ocean-model grids.
//!
//! A [`RegularGridMapper`] links each point of a regular lat/lon grid to the
//! (at most four) nearest cells of a curvilinear grid and reprojects data as
//! the inverse-distance weighted mean of those cells. Building a mapper is
//! expensive, so mappers are persisted as binary cache files and kept in a
//! [`MapperCache`].
//!
//! # Example
//!
//! ```ignore
//! use regrid::{MapperCache, RegridConfig};
//!
//! let mut cache = MapperCache::new(&RegridConfig::from_env())?;
//! let mapper = cache.get_or_build("gbr4", 0.03, &latitude, &longitude)?;
//! let (regular, shape) = mapper.curved_to_regular(&data, &[1, 4, rows, cols])?;
//! ```

pub mod cache;
pub mod cache_file;
pub mod config;
pub mod error;
pub mod index;
pub mod mapper;

// Re-export commonly used types at crate root
pub use cache::{mapper_file_name, MapperCache, MapperCacheStats, MapperKey};
pub use cache_file::CACHE_FORMAT_VERSION;
pub use config::{RegridConfig, DEFAULT_ZERO_DISTANCE_WEIGHT};
pub use error::{RegridError, Result};
pub use mapper::{IndexWithDistance, RegularGridMapper, MAX_CANDIDATES};
