//! Ready-made [`HarvestSink`] implementations.
//!
//! - [`MemorySink`] keeps everything in memory, for tests and embedding.
//! - [`JsonLinesSink`] writes each canonical package as one JSON line.

use async_trait::async_trait;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::model::{CanonicalPackage, CatalogIdentifier};
use crate::traits::{HarvestSink, SinkError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct MemorySinkState {
    packages: Vec<(CatalogIdentifier, CanonicalPackage)>,
    object_errors: Vec<(CatalogIdentifier, String)>,
    gather_errors: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemorySinkState>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packages(&self) -> Vec<(CatalogIdentifier, CanonicalPackage)> {
        lock(&self.state).packages.clone()
    }

    pub fn object_errors(&self) -> Vec<(CatalogIdentifier, String)> {
        lock(&self.state).object_errors.clone()
    }

    pub fn gather_errors(&self) -> Vec<(String, String)> {
        lock(&self.state).gather_errors.clone()
    }
}

#[async_trait]
impl HarvestSink for MemorySink {
    async fn save_gather_error(&self, source: &str, message: &str) {
        lock(&self.state)
            .gather_errors
            .push((source.to_string(), message.to_string()));
    }

    async fn save_object_error(&self, id: &CatalogIdentifier, message: &str) {
        lock(&self.state)
            .object_errors
            .push((id.clone(), message.to_string()));
    }

    async fn import_package(
        &self,
        id: &CatalogIdentifier,
        package: CanonicalPackage,
    ) -> Result<(), SinkError> {
        lock(&self.state).packages.push((id.clone(), package));
        Ok(())
    }
}

/// Streams packages to a writer; errors go to the log.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> HarvestSink for JsonLinesSink<W> {
    async fn save_gather_error(&self, source: &str, message: &str) {
        warn!(source, "{}", message);
    }

    async fn save_object_error(&self, id: &CatalogIdentifier, message: &str) {
        warn!(identifier = %id, "{}", message);
    }

    async fn import_package(
        &self,
        _id: &CatalogIdentifier,
        package: CanonicalPackage,
    ) -> Result<(), SinkError> {
        let line =
            serde_json::to_string(&package).map_err(|e| SinkError::Rejected(e.to_string()))?;
        let mut writer = lock(&self.writer);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}
