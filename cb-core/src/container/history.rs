use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::container::metadata::BundleMetadata;
use crate::error::{BundleError, Result};
use crate::version::VersionTuple;

/// A past bundle emission, stripped of its per-run `added`/`removed` lists.
/// The history array is the only carrier of the path snapshot between
/// otherwise stateless runs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HistoryEntry {
    #[serde(rename = "versionNumber", default)]
    pub version: Option<String>,
    #[serde(rename = "previousVersionNumber", default)]
    pub previous_version: Option<String>,
    #[serde(rename = "applicationVersionNumber", default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(rename = "pathToHash", default)]
    pub path_to_hash: BTreeMap<String, String>,
    #[serde(rename = "pathToDetails", default)]
    pub path_to_details: BTreeMap<String, Option<String>>,
}

impl From<&BundleMetadata> for HistoryEntry {
    fn from(meta: &BundleMetadata) -> Self {
        Self {
            version: Some(meta.version.clone()),
            previous_version: meta.previous_version.clone(),
            app_version: meta.app_version.clone(),
            uuid: Some(meta.uuid.clone()),
            path_to_hash: meta.path_to_hash.clone(),
            path_to_details: meta.path_to_details.clone(),
        }
    }
}

/// An absent history file means a fresh chain, not an error.
pub fn load(path: &Path) -> Result<Vec<HistoryEntry>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|e| {
        BundleError::Format(format!(
            "history file `{}` is not a valid JSON array: {e}",
            path.display()
        ))
    })
}

/// Highest-versioned entry wins, not the most recently appended one. The
/// array may hold out-of-order versions when explicit versions were supplied.
pub fn latest(entries: &[HistoryEntry]) -> Result<Option<&HistoryEntry>> {
    let mut best: Option<(&HistoryEntry, VersionTuple)> = None;
    for entry in entries {
        let version = VersionTuple::parse(entry.version.as_deref())?;
        match &best {
            Some((_, top)) if *top >= version => {}
            _ => best = Some((entry, version)),
        }
    }
    Ok(best.map(|(entry, _)| entry))
}

/// Read-modify-write append. The array stays a single JSON document.
pub fn append(path: &Path, entry: HistoryEntry) -> Result<()> {
    let mut entries = load(path)?;
    entries.push(entry);
    let raw = serde_json::to_vec(&entries).map_err(|e| BundleError::Format(e.to_string()))?;
    fs::write(path, raw)?;
    Ok(())
}
