use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::container::history::{self, HistoryEntry};
use crate::container::metadata::{AddedEntry, BundleMetadata};
use crate::error::{BundleError, Result};
use crate::hash;
use crate::record::FileRecord;
use crate::version::VersionTuple;

/// Fixed suffix of the bundle payload file.
pub const BUNDLE_SUFFIX: &str = "cb";
/// Fixed suffix of the append-only history file kept inside the input tree.
pub const HISTORY_SUFFIX: &str = "oldjson";

/// Control files that carry a keyed detail digest in addition to their
/// content hash.
const DETAIL_FILES: &[&str] = &["songs/unlocks", "songs/packlist", "songs/songlist"];

#[derive(Clone, Default)]
pub struct BundleOptions {
    /// Application version recorded verbatim in metadata.
    pub app_version: Option<String>,
    /// Explicit bundle version; derived from the previous one when absent.
    pub bundle_version: Option<String>,
    /// Override for the previous bundle version read from history.
    pub previous_bundle_version: Option<String>,
}

/// Per-run classification counters plus the payload size, for reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundleSummary {
    pub added: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub payload_bytes: u64,
}

/// Append `suffix` unless the path already carries it.
fn force_suffix(path: &Path, suffix: &str) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == suffix => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(suffix);
            PathBuf::from(name)
        }
    }
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Bundle `input_dir` into a payload + metadata pair, diffing against the
/// highest-versioned entry of the history chain kept inside the input tree.
/// Only added and changed files contribute payload bytes; offsets are the
/// running sum of written lengths, starting at zero.
pub fn bundle(
    input_dir: &Path,
    output: &Path,
    metadata_out: Option<&Path>,
    history_name: &str,
    opts: &BundleOptions,
) -> Result<BundleSummary> {
    let bundle_path = force_suffix(output, BUNDLE_SUFFIX);
    let metadata_path = match metadata_out {
        Some(p) => force_suffix(p, "json"),
        None => bundle_path.with_extension("json"),
    };
    let history_path = input_dir.join(force_suffix(Path::new(history_name), HISTORY_SUFFIX));

    // Refuse to clobber outputs before a single byte is written.
    if bundle_path.is_file() {
        return Err(BundleError::AlreadyExists(format!(
            "bundle file `{}`",
            bundle_path.display()
        )));
    }
    if metadata_path.is_file() {
        return Err(BundleError::AlreadyExists(format!(
            "metadata file `{}`",
            metadata_path.display()
        )));
    }

    // Seed the diff baseline from the highest-versioned history entry.
    let entries = history::load(&history_path)?;
    let previous = history::latest(&entries)?;
    let mut prev_hash: BTreeMap<String, String> = BTreeMap::new();
    let mut prev_details: BTreeMap<String, Option<String>> = BTreeMap::new();
    let mut prev_version: Option<String> = None;
    let mut app_version: Option<String> = None;
    if let Some(p) = previous {
        prev_hash = p.path_to_hash.clone();
        prev_details = p.path_to_details.clone();
        prev_version = p.version.clone();
        app_version = p.app_version.clone();
    }

    // Explicit options win over anything recovered from history.
    if opts.app_version.is_some() {
        app_version = opts.app_version.clone();
    }
    if opts.previous_bundle_version.is_some() {
        prev_version = opts.previous_bundle_version.clone();
    }
    let version = match &opts.bundle_version {
        Some(v) => v.clone(),
        None => VersionTuple::parse(prev_version.as_deref())?.next().to_string(),
    };

    info!(input = %input_dir.display(), version = %version, "bundling directory");

    let mut out = File::create(&bundle_path)?;

    let mut added: Vec<AddedEntry> = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    let mut path_to_hash: BTreeMap<String, String> = BTreeMap::new();
    let mut offset: u64 = 0;
    let mut summary = BundleSummary::default();

    for entry in WalkDir::new(input_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let abs = entry.path();
        if abs.extension().is_some_and(|ext| ext == HISTORY_SUFFIX) {
            continue;
        }
        let rel = match abs.strip_prefix(input_dir) {
            Ok(p) => slash_path(p),
            Err(_) => slash_path(abs),
        };

        let record = FileRecord::from_file(abs, &rel, offset)?;
        path_to_hash.insert(rel.clone(), record.hash_b64());

        match prev_hash.get(&rel) {
            None => {
                debug!(path = %rel, "new file added");
                summary.added += 1;
            }
            Some(prev) if *prev != record.hash_b64() => {
                // Changed: new bytes go to `added`, the stale path to
                // `removed` so consumers replace rather than duplicate.
                debug!(path = %rel, "file changed");
                removed.push(rel.clone());
                summary.changed += 1;
            }
            Some(_) => {
                debug!(path = %rel, "file unchanged");
                summary.unchanged += 1;
                continue;
            }
        }

        out.write_all(record.bytes())?;
        offset += record.len();
        added.push(record.to_entry());
    }

    for path in prev_hash.keys() {
        if !path_to_hash.contains_key(path) {
            debug!(path = %path, "file removed");
            removed.push(path.clone());
            summary.removed += 1;
        }
    }

    // Detail digests: recompute from disk when present, else carry forward
    // from the previous snapshot, else warn and leave the entry out.
    let mut path_to_details: BTreeMap<String, Option<String>> = BTreeMap::new();
    for name in DETAIL_FILES {
        let file_path = input_dir.join(name);
        if file_path.is_file() {
            let record = FileRecord::from_file(&file_path, name, 0)?;
            path_to_details.insert((*name).to_string(), Some(record.detail_digest_b64()));
        } else if let Some(carried) = prev_details.get(*name).cloned().flatten() {
            path_to_details.insert((*name).to_string(), Some(carried));
        } else {
            warn!(path = %file_path.display(), "control file missing and not in history; detail digest omitted");
        }
    }

    let metadata = BundleMetadata {
        version,
        previous_version: prev_version,
        app_version,
        uuid: hash::short_uuid()?,
        removed,
        added,
        path_to_hash,
        path_to_details,
    };
    debug!(uuid = %metadata.uuid, previous = ?metadata.previous_version, "metadata assembled");

    out.flush()?;

    let raw = serde_json::to_vec(&metadata).map_err(|e| BundleError::Format(e.to_string()))?;
    fs::write(&metadata_path, raw)?;
    info!(path = %metadata_path.display(), "bundle metadata written");
    info!(path = %bundle_path.display(), bytes = offset, "bundle payload written");

    history::append(&history_path, HistoryEntry::from(&metadata))?;
    info!(path = %history_path.display(), "history entry appended");

    summary.payload_bytes = offset;
    info!(
        added = summary.added,
        changed = summary.changed,
        unchanged = summary.unchanged,
        removed = summary.removed,
        "bundle completed"
    );
    Ok(summary)
}
