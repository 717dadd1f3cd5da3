use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogIdentifier(String);

impl CatalogIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CatalogIdentifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One package exactly as the remote DKAN API returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRemoteRecord(Map<String, Value>);

impl RawRemoteRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

// Typed view of a remote (DKAN) package. Keys the normalizer does not touch
// ride along in `other`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePackage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>, // copied to notes as-is
    #[serde(default)]
    pub notes: Option<Value>,
    #[serde(default)]
    pub license_title: Option<Value>,
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub private: Option<Value>, // Some(..) whenever the key exists, even if null
    #[serde(default)]
    pub extras: Option<Value>,
    #[serde(default)]
    pub resources: Option<Vec<RemoteResource>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteResource {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>, // None only when the key is missing
    #[serde(default)]
    pub description: Option<Value>, // overwritten from title
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub revision_id: Option<Value>, // dropped
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPackage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    pub extras: Value,
    pub resources: Vec<CanonicalResource>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResource {
    pub title: Value,
    pub description: Value,
    pub format: String, // "" when the mimetype is unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Static descriptor the host shows for this harvester type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarvesterInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub form_config_interface: &'static str,
}

impl HarvesterInfo {
    pub const fn dkan() -> Self {
        Self {
            name: "dkan",
            title: "DKAN",
            description: "Harvests remote DKAN instances",
            form_config_interface: "Text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_private_presence_survives_null() {
        let with_null: RemotePackage = serde_json::from_value(json!({"private": null})).unwrap();
        assert_eq!(with_null.private, Some(Value::Null));

        let without: RemotePackage = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert!(without.private.is_none());
    }

    #[test]
    fn test_unknown_keys_are_carried() {
        let remote: RemotePackage =
            serde_json::from_value(json!({"title": "x", "author": "City"})).unwrap();
        assert_eq!(remote.other.get("author"), Some(&json!("City")));
        assert!(!remote.other.contains_key("title"));
    }

    #[test]
    fn test_raw_record_from_value_rejects_non_objects() {
        assert!(RawRemoteRecord::from_value(json!([1, 2])).is_none());
        let record = RawRemoteRecord::from_value(json!({"name": "a"})).unwrap();
        assert!(record.contains_key("name"));
    }

    #[test]
    fn test_harvester_info_serialization() {
        let info = serde_json::to_value(HarvesterInfo::dkan()).unwrap();
        assert_eq!(
            info,
            json!({
                "name": "dkan",
                "title": "DKAN",
                "description": "Harvests remote DKAN instances",
                "form_config_interface": "Text"
            })
        );
    }
}
