use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::container::metadata;
use crate::error::{BundleError, Result};
use crate::hash;
use crate::record::FileRecord;

/// Slice a bundle back into files under `dest` according to its metadata.
/// Every extracted file is re-verified against its recorded hash; the first
/// mismatch aborts, leaving earlier files on disk.
pub fn debundle(bundle_path: &Path, metadata_path: &Path, dest: &Path) -> Result<usize> {
    if !bundle_path.is_file() {
        return Err(BundleError::NotFound(format!(
            "bundle file `{}`",
            bundle_path.display()
        )));
    }
    let mut bundle = File::open(bundle_path)?;
    let meta = metadata::load(metadata_path)?;

    if dest.is_dir() {
        if fs::read_dir(dest)?.next().is_some() {
            return Err(BundleError::AlreadyExists(format!(
                "output directory `{}` is not empty",
                dest.display()
            )));
        }
    } else if dest.exists() {
        return Err(BundleError::AlreadyExists(format!(
            "output path `{}` is not a directory",
            dest.display()
        )));
    } else {
        info!(path = %dest.display(), "creating output directory");
        fs::create_dir_all(dest)?;
    }

    for entry in &meta.added {
        let out_path = safe_join(dest, &entry.path)?;
        let expected = hash::decode(&entry.hash_b64)?;
        FileRecord::from_bundle_range(
            &mut bundle,
            &out_path,
            entry.byte_offset,
            entry.length,
            &expected,
        )?
        .write_to_disk()?;
    }

    info!(files = meta.added.len(), "debundling completed");
    Ok(meta.added.len())
}

fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    if p.is_absolute() || rel.contains("../") || rel.contains("..\\") {
        return Err(BundleError::Format(format!(
            "unsafe path in metadata: `{rel}`"
        )));
    }
    Ok(root.join(p))
}
