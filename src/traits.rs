use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::model::{CanonicalPackage, CatalogIdentifier, RawRemoteRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP status {status}")]
    Status { status: u16 },
    #[error("request timed out")]
    Timeout,
}

/// Enumeration of a source could not be completed. Fatal to the run.
#[derive(Error, Debug)]
pub enum SourceFailure {
    #[error("Unable to get content for URL: {url} - {source}")]
    Unreachable {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("Unable to read package list from URL: {url} - {reason}")]
    MalformedEnvelope { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unable to get content for package: {url} - {source}")]
    Unreachable {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("Unable to read package from URL: {url} - {reason}")]
    MalformedEnvelope { url: String, reason: String },
    #[error("No package in response from URL: {url}")]
    EmptyResult { url: String },
    #[error("Fetch timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Unable to import package: {0}")]
    Rejected(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw transport used by the catalog client (`GET url` → body bytes).
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn get_content(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Lists every package identifier the remote catalog exposes.
    async fn enumerate(&self, base_url: &str) -> Result<Vec<CatalogIdentifier>, SourceFailure>;

    /// Fetches one package record. Failures concern `id` only.
    async fn fetch_one(
        &self,
        base_url: &str,
        id: &CatalogIdentifier,
    ) -> Result<RawRemoteRecord, FetchError>;
}

pub trait LicenseRegistry: Send + Sync {
    /// Id of the first license whose title equals `title` exactly.
    fn license_id_for_title(&self, title: &str) -> Option<&str>;
}

/// Host-side collaborator that persists harvest outcomes.
#[async_trait]
pub trait HarvestSink: Send + Sync {
    async fn save_gather_error(&self, source: &str, message: &str);

    async fn save_object_error(&self, id: &CatalogIdentifier, message: &str);

    async fn import_package(
        &self,
        id: &CatalogIdentifier,
        package: CanonicalPackage,
    ) -> Result<(), SinkError>;
}
