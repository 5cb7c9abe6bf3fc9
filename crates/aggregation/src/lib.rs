//! Temporal aggregation of gridded ocean-model output.
//!
//! An [`Orchestrator`] walks the time instants of a [`Task`], the operators
//! of its [`ProductDefinition`] and the matching inputs. For each combination
//! time slices are streamed one depth chunk at a time into an [`Aggregator`]
//! and, when the product asks for summaries, into a zone or site
//! accumulator. Aggregated chunks are optionally reprojected onto a regular
//! grid and written to the output dataset.
//!
//! Input files, the gridded output and the summary writer are supplied by
//! the caller through the traits in [`io`].
//!
//! [`Task`]: aggregate_common::Task
//! [`ProductDefinition`]: aggregate_common::ProductDefinition

pub mod accumulation;
pub mod aggregator;
pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod gridding;
pub mod io;
pub mod summary;
pub mod write;

pub use accumulation::{DepthChunk, ReferenceLayout};
pub use aggregator::Aggregator;
pub use chain::{build_chain, Orchestrator, StageKind};
pub use config::{AggregationConfig, MAX_DEPTHS_PER_CHUNK};
pub use context::{ChunkOutput, Collaborators, PipelineContext};
pub use error::{AggregationError, Result};
pub use io::{
    DataType, InputDataset, InputDatasetCache, OutputDataset, OutputWriter, SummaryAccumulator,
    VariableMetadata,
};
pub use summary::{
    DepthBucket, Site, SiteAccumulator, SiteMap, SummaryStatistics, ZoneAccumulator,
};
