//! DKAN → CKAN package normalization.
//!
//! [`normalize`] is a pure function of the remote record and an injected
//! [`LicenseRegistry`]. Every exit is either a complete [`CanonicalPackage`]
//! or a [`NormalizeError`]; nothing is half-converted.
//!
//! Conversion rules:
//! - `extras` defaults to an empty mapping
//! - a missing `name` is derived from `title` with [`slugify`]
//! - `description` is copied to `notes`
//! - `license_title` is resolved to `license_id` through the registry
//! - resources are required; each gets `description := title`, loses
//!   `revision_id`, and gains a `format` inferred from `mimetype` when absent
//! - `private`, when present, is forced to `false`

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::harvest::formats::infer_format;
use crate::harvest::traits::{HarvestStage, NormalizeError};
use crate::model::{
    CanonicalPackage, CanonicalResource, RawRemoteRecord, RemotePackage, RemoteResource,
};
use crate::slug::slugify;
use crate::traits::LicenseRegistry;

/// Normalization stage bound to a license registry.
#[derive(Clone)]
pub struct PackageNormalizer {
    licenses: Arc<dyn LicenseRegistry>,
}

impl PackageNormalizer {
    pub fn new(licenses: Arc<dyn LicenseRegistry>) -> Self {
        Self { licenses }
    }

    pub fn normalize(&self, record: &RawRemoteRecord) -> Result<CanonicalPackage, NormalizeError> {
        normalize(record, self.licenses.as_ref())
    }
}

impl HarvestStage for PackageNormalizer {
    type Input = RawRemoteRecord;
    type Output = CanonicalPackage;
    type Error = NormalizeError;

    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        self.normalize(&input)
    }

    fn stage_name(&self) -> &'static str {
        "normalize"
    }
}

/// Converts one remote record into the canonical package schema.
///
/// # Errors
///
/// Returns [`NormalizeError`] when the record has no resources, has neither
/// `name` nor a usable `title`, has a resource without `title`, or when a
/// field has an unexpected type.
pub fn normalize(
    record: &RawRemoteRecord,
    licenses: &dyn LicenseRegistry,
) -> Result<CanonicalPackage, NormalizeError> {
    let remote: RemotePackage = serde_json::from_value(Value::Object(record.as_map().clone()))
        .map_err(|e| NormalizeError::Shape(e.to_string()))?;

    let extras = match remote.extras {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(extras) => extras,
    };

    let name = match remote.name {
        Some(name) if !name.is_empty() => name,
        _ => derive_name(remote.title.as_ref())?,
    };

    let notes = remote.description.clone().or(remote.notes);

    let license_id = resolve_license(remote.license_title.as_ref(), licenses)
        .or(remote.license_id);

    let resources = match remote.resources {
        Some(resources) if !resources.is_empty() => resources,
        _ => return Err(NormalizeError::NoResources),
    };
    let resources = resources
        .into_iter()
        .enumerate()
        .map(|(index, resource)| normalize_resource(index, resource))
        .collect::<Result<Vec<_>, _>>()?;

    // DKAN marks some openly fetchable datasets as private; if they really
    // were private the fetch would have been refused.
    let private = remote.private.map(|_| false);

    Ok(CanonicalPackage {
        name,
        title: remote.title,
        description: remote.description,
        notes,
        license_title: remote.license_title,
        license_id,
        private,
        extras,
        resources,
        other: remote.other,
    })
}

fn derive_name(title: Option<&Value>) -> Result<String, NormalizeError> {
    let title = match title {
        None | Some(Value::Null) => return Err(NormalizeError::MissingTitle),
        Some(Value::String(title)) => title,
        Some(other) => {
            return Err(NormalizeError::Shape(format!(
                "title must be a string to derive a name, got {}",
                other
            )))
        }
    };
    let name = slugify(title);
    if name.is_empty() {
        return Err(NormalizeError::EmptyName {
            title: title.clone(),
        });
    }
    Ok(name)
}

fn resolve_license(title: Option<&Value>, licenses: &dyn LicenseRegistry) -> Option<String> {
    let title = title?.as_str()?;
    match licenses.license_id_for_title(title) {
        Some(id) => Some(id.to_string()),
        None => {
            debug!(license_title = title, "No license matches title");
            None
        }
    }
}

fn normalize_resource(
    index: usize,
    resource: RemoteResource,
) -> Result<CanonicalResource, NormalizeError> {
    // a null title is copied like any other value; only a missing key fails
    let title = resource
        .title
        .ok_or(NormalizeError::MissingResourceTitle { index })?;

    let format = match resource.format {
        Some(format) => format,
        None => infer_format(resource.mimetype.as_deref()),
    };

    Ok(CanonicalResource {
        description: title.clone(),
        title,
        format,
        mimetype: resource.mimetype,
        other: resource.other,
    })
}
