pub mod client;
pub mod config;
pub mod executor;
pub mod harvest;
pub mod license;
pub mod model;
pub mod sink;
pub mod slug;
pub mod traits;

// Re-export common types for convenience
pub use client::{DkanClient, HttpContentSource};
pub use config::{ConfigError, HarvesterConfig};
pub use executor::HarvesterExecutor;
pub use harvest::{
    FailureStage, HarvestPipeline, HarvestStage, HarvestStats, ItemFailure, NormalizeError,
    PackageNormalizer, SourceRunReport,
};
pub use license::{License, LicenseError, StaticLicenseRegistry};
pub use model::*;
pub use sink::{JsonLinesSink, MemorySink};
pub use traits::*;
