use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result};

/// One `added` entry: where a file's bytes live in the bundle payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddedEntry {
    pub path: String,
    #[serde(rename = "byteOffset")]
    pub byte_offset: u64,
    pub length: u64,
    #[serde(rename = "sha256HashBase64Encoded")]
    pub hash_b64: String,
}

/// The sidecar document for one bundle emission. Field names are wire format.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BundleMetadata {
    #[serde(rename = "versionNumber")]
    pub version: String,
    #[serde(rename = "previousVersionNumber")]
    pub previous_version: Option<String>,
    #[serde(rename = "applicationVersionNumber")]
    pub app_version: Option<String>,
    pub uuid: String,
    pub removed: Vec<String>,
    pub added: Vec<AddedEntry>,
    #[serde(rename = "pathToHash")]
    pub path_to_hash: BTreeMap<String, String>,
    #[serde(rename = "pathToDetails")]
    pub path_to_details: BTreeMap<String, Option<String>>,
}

/// Load the sidecar for extraction. A document without an `added` list is
/// unusable and rejected as malformed.
pub fn load(path: &Path) -> Result<BundleMetadata> {
    if !path.is_file() {
        return Err(BundleError::NotFound(format!(
            "metadata file `{}`",
            path.display()
        )));
    }
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|e| {
        BundleError::Format(format!(
            "metadata file `{}` is not a valid metadata document: {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BundleMetadata {
        BundleMetadata {
            version: "1.0.1".to_string(),
            previous_version: Some("1.0".to_string()),
            app_version: None,
            uuid: "a1b2c3d4e".to_string(),
            removed: vec!["gone.txt".to_string()],
            added: vec![AddedEntry {
                path: "a.txt".to_string(),
                byte_offset: 0,
                length: 5,
                hash_b64: "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=".to_string(),
            }],
            path_to_hash: BTreeMap::new(),
            path_to_details: BTreeMap::new(),
        }
    }

    #[test]
    fn serializes_wire_field_names() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"versionNumber\":\"1.0.1\""));
        assert!(json.contains("\"previousVersionNumber\":\"1.0\""));
        assert!(json.contains("\"applicationVersionNumber\":null"));
        assert!(json.contains("\"byteOffset\":0"));
        assert!(json.contains("\"sha256HashBase64Encoded\""));
        assert!(json.contains("\"pathToHash\""));
        assert!(json.contains("\"pathToDetails\""));
    }

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: BundleMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, "1.0.1");
        assert_eq!(back.added.len(), 1);
        assert_eq!(back.added[0].byte_offset, 0);
        assert_eq!(back.removed, vec!["gone.txt".to_string()]);
    }

    #[test]
    fn load_rejects_missing_added_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        fs::write(&path, b"{\"versionNumber\": \"1\"}").unwrap();
        assert!(matches!(load(&path), Err(BundleError::Format(_))));
    }

    #[test]
    fn load_reports_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(load(&path), Err(BundleError::NotFound(_))));
    }
}
