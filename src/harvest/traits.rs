//! Per-record stage seam and the failure types a harvest run reports.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::model::CatalogIdentifier;
use crate::traits::{FetchError, SinkError};

// ============================================================================
// Stage Trait
// ============================================================================

/// A synchronous, per-record step of a harvest run.
///
/// [`HarvestPipeline`](crate::HarvestPipeline) hands every fetched record to
/// its normalizer through [`execute`](HarvestStage::execute) and tags log
/// lines with [`stage_name`](HarvestStage::stage_name). An implementation
/// sees one record at a time and keeps no state between calls.
pub trait HarvestStage: Send + Sync {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Converts one record. A failure only affects that record's identifier.
    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// Short label used as the `stage` field in logs.
    fn stage_name(&self) -> &'static str;
}

// ============================================================================
// Error Types
// ============================================================================

/// Reasons a remote record cannot be turned into a canonical package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// `resources` is missing, null or empty
    #[error("Dataset has no resources")]
    NoResources,

    /// No `name`, and no `title` to derive one from
    #[error("Dataset has no name and no title")]
    MissingTitle,

    /// The title slugifies to an empty string
    #[error("Title {title:?} does not produce a usable name")]
    EmptyName { title: String },

    /// A resource has no `title` to copy into its description
    #[error("Resource {index} has no title")]
    MissingResourceTitle { index: usize },

    /// The record does not have the expected field types
    #[error("Unexpected record shape: {0}")]
    Shape(String),
}

/// Stage at which an identifier failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Fetch,
    Normalize,
    Import,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::Fetch => "fetch",
            FailureStage::Normalize => "normalize",
            FailureStage::Import => "import",
        })
    }
}

/// Failure recorded against one identifier. Never aborts sibling identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{stage} failed for '{identifier}': {reason}")]
pub struct ItemFailure {
    pub identifier: CatalogIdentifier,
    pub stage: FailureStage,
    pub reason: String,
}

impl ItemFailure {
    pub fn fetch(identifier: CatalogIdentifier, error: &FetchError) -> Self {
        Self {
            identifier,
            stage: FailureStage::Fetch,
            reason: error.to_string(),
        }
    }

    pub fn normalize(identifier: CatalogIdentifier, error: &NormalizeError) -> Self {
        Self {
            identifier,
            stage: FailureStage::Normalize,
            reason: format!("Unable to convert DKAN to CKAN package: {}", error),
        }
    }

    pub fn import(identifier: CatalogIdentifier, error: &SinkError) -> Self {
        Self {
            identifier,
            stage: FailureStage::Import,
            reason: error.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
