//! Harvest module - DKAN enumerate/fetch/normalize pipeline.
//!
//! This module provides the core of the harvester:
//! - **Traits**: [`HarvestStage`] for composable stages
//! - **Formats**: MIME type → format code inference
//! - **Normalization**: DKAN record → CKAN package via [`PackageNormalizer`]
//! - **Errors**: [`NormalizeError`] and the per-identifier [`ItemFailure`]
//! - **Pipeline**: Async stage driver via [`pipeline::HarvestPipeline`]

pub mod formats;
pub mod normalize;
pub mod pipeline;
pub mod traits;

// Re-export commonly used types
pub use traits::{FailureStage, HarvestStage, ItemFailure, NormalizeError};

pub use normalize::{normalize, PackageNormalizer};

pub use pipeline::{HarvestPipeline, HarvestStats, SourceRunReport};
