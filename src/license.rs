//! In-memory license registry.
//!
//! The receiving catalog owns its license list; this module only mirrors it
//! for lookups. [`StaticLicenseRegistry::ckan_defaults`] carries the stock CKAN
//! list, and [`StaticLicenseRegistry::load`] reads the same JSON shape CKAN
//! uses for custom license files (`[{"id": .., "title": .., ...}, ...]`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::traits::LicenseRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub title: String,
}

impl License {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("Failed to read license file '{}': {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid license list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered license list; the first title match wins.
#[derive(Debug, Clone, Default)]
pub struct StaticLicenseRegistry {
    licenses: Vec<License>,
}

impl StaticLicenseRegistry {
    pub fn new(licenses: Vec<License>) -> Self {
        Self { licenses }
    }

    /// The license list a stock CKAN instance ships with.
    pub fn ckan_defaults() -> Self {
        const DEFAULTS: &[(&str, &str)] = &[
            ("notspecified", "License not specified"),
            (
                "odc-pddl",
                "Open Data Commons Public Domain Dedication and License (PDDL)",
            ),
            ("odc-odbl", "Open Data Commons Open Database License (ODbL)"),
            ("odc-by", "Open Data Commons Attribution License"),
            ("cc-zero", "Creative Commons CCZero"),
            ("cc-by", "Creative Commons Attribution"),
            ("cc-by-sa", "Creative Commons Attribution Share-Alike"),
            ("gfdl", "GNU Free Documentation License"),
            ("other-open", "Other (Open)"),
            ("other-pd", "Other (Public Domain)"),
            ("other-at", "Other (Attribution)"),
            ("uk-ogl", "UK Open Government Licence (OGL)"),
            ("cc-nc", "Creative Commons Non-Commercial (Any)"),
            ("other-nc", "Other (Non-Commercial)"),
            ("other-closed", "Other (Not Open)"),
        ];

        Self::new(
            DEFAULTS
                .iter()
                .map(|(id, title)| License::new(*id, *title))
                .collect(),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, LicenseError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self, LicenseError> {
        let json = std::fs::read_to_string(path).map_err(|source| LicenseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn licenses(&self) -> &[License] {
        &self.licenses
    }
}

impl LicenseRegistry for StaticLicenseRegistry {
    fn license_id_for_title(&self, title: &str) -> Option<&str> {
        self.licenses
            .iter()
            .find(|license| license.title == title)
            .map(|license| license.id.as_str())
    }
}
