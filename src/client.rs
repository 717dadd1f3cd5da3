//! Remote DKAN catalog client.
//!
//! [`DkanClient`] knows the DKAN action API layout and envelope shapes; the
//! bytes themselves come from any [`ContentSource`]. [`HttpContentSource`] is
//! the `reqwest` implementation used outside tests.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::HarvesterConfig;
use crate::model::{CatalogIdentifier, RawRemoteRecord};
use crate::traits::{CatalogClient, ContentSource, FetchError, SourceFailure, TransportError};

pub const PACKAGE_LIST_PATH: &str = "/api/3/action/package_list";
pub const PACKAGE_SHOW_PATH: &str = "/api/3/action/package_show/";

// ============================================================================
// HTTP Transport
// ============================================================================

/// `reqwest`-backed transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: reqwest::Client,
}

impl HttpContentSource {
    /// Builds a client using the timeout and user agent from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the TLS backend or client
    /// settings cannot be initialized.
    pub fn new(config: &HarvesterConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(error.to_string())
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn get_content(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        Ok(body.to_vec())
    }
}

// ============================================================================
// DKAN Client
// ============================================================================

#[derive(Deserialize)]
struct ListEnvelope {
    result: Vec<CatalogIdentifier>,
}

#[derive(Deserialize)]
struct ShowEnvelope {
    result: Vec<Map<String, Value>>,
}

/// Client for the DKAN flavor of the CKAN action API.
pub struct DkanClient<T: ContentSource> {
    source: T,
}

impl<T: ContentSource> DkanClient<T> {
    pub fn new(source: T) -> Self {
        Self { source }
    }

    pub fn package_list_url(base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), PACKAGE_LIST_PATH)
    }

    pub fn package_show_url(base_url: &str, id: &CatalogIdentifier) -> String {
        format!("{}{}{}", base_url.trim_end_matches('/'), PACKAGE_SHOW_PATH, id)
    }
}

#[async_trait]
impl<T: ContentSource> CatalogClient for DkanClient<T> {
    async fn enumerate(&self, base_url: &str) -> Result<Vec<CatalogIdentifier>, SourceFailure> {
        let url = Self::package_list_url(base_url);
        debug!(url = %url, "Getting all DKAN packages");

        let content = self
            .source
            .get_content(&url)
            .await
            .map_err(|source| SourceFailure::Unreachable {
                url: url.clone(),
                source,
            })?;

        let envelope: ListEnvelope =
            serde_json::from_slice(&content).map_err(|e| SourceFailure::MalformedEnvelope {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(envelope.result)
    }

    async fn fetch_one(
        &self,
        base_url: &str,
        id: &CatalogIdentifier,
    ) -> Result<RawRemoteRecord, FetchError> {
        let url = Self::package_show_url(base_url, id);
        debug!(url = %url, "Getting DKAN package");

        let content = self
            .source
            .get_content(&url)
            .await
            .map_err(|source| FetchError::Unreachable {
                url: url.clone(),
                source,
            })?;

        let envelope: ShowEnvelope =
            serde_json::from_slice(&content).map_err(|e| FetchError::MalformedEnvelope {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        envelope
            .result
            .into_iter()
            .next()
            .map(RawRemoteRecord::new)
            .ok_or(FetchError::EmptyResult { url })
    }
}

// ============================================================================
// Tests
// ============================================================================
