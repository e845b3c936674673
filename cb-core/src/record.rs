use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::container::metadata::AddedEntry;
use crate::error::{BundleError, Result};
use crate::hash;

/// One file's identity and location within a bundle operation. Hashes are
/// computed once at construction and never change afterwards.
pub struct FileRecord {
    abs_path: PathBuf,
    rel_path: String,
    offset: u64,
    data: Vec<u8>,
    hash: [u8; 32],
}

impl FileRecord {
    /// Read a file from disk and place it at `offset` in the bundle layout.
    pub fn from_file(abs_path: &Path, rel_path: &str, offset: u64) -> Result<Self> {
        let data = fs::read(abs_path)?;
        let hash = hash::sha256(&data);
        Ok(Self {
            abs_path: abs_path.to_path_buf(),
            rel_path: rel_path.to_string(),
            offset,
            data,
            hash,
        })
    }

    /// Read one file's bytes back out of an open bundle and verify them
    /// against the recorded hash. This is the only integrity checkpoint of
    /// extraction; metadata is never trusted on its own.
    pub fn from_bundle_range(
        bundle: &mut File,
        out_abs: &Path,
        offset: u64,
        length: u64,
        expected: &[u8; 32],
    ) -> Result<Self> {
        bundle.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; length as usize];
        bundle.read_exact(&mut data)?;
        debug!(path = %out_abs.display(), offset, length, "read range from bundle");
        let got = hash::sha256(&data);
        if got != *expected {
            return Err(BundleError::Integrity(format!(
                "hash mismatch for `{}`: expected {}, got {}",
                out_abs.display(),
                hash::encode(expected),
                hash::encode(&got),
            )));
        }
        Ok(Self {
            abs_path: out_abs.to_path_buf(),
            rel_path: String::new(),
            offset,
            data,
            hash: got,
        })
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn hash_b64(&self) -> String {
        hash::encode(&self.hash)
    }

    /// Keyed digest of the held bytes, for the well-known control files.
    pub fn detail_digest_b64(&self) -> String {
        hash::encode(&hash::detail_digest(&self.data))
    }

    pub fn to_entry(&self) -> AddedEntry {
        AddedEntry {
            path: self.rel_path.clone(),
            byte_offset: self.offset,
            length: self.len(),
            hash_b64: self.hash_b64(),
        }
    }

    /// Write the held bytes to the absolute path, creating parent directories
    /// as needed. The caller guarantees the destination tree starts empty.
    pub fn write_to_disk(&self) -> Result<()> {
        if let Some(parent) = self.abs_path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %self.abs_path.display(), "writing file");
        fs::write(&self.abs_path, &self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_file_measures_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"hello").unwrap();

        let record = FileRecord::from_file(&path, "a.txt", 7).unwrap();
        assert_eq!(record.len(), 5);
        assert_eq!(
            record.hash_b64(),
            "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ="
        );

        let entry = record.to_entry();
        assert_eq!(entry.path, "a.txt");
        assert_eq!(entry.byte_offset, 7);
        assert_eq!(entry.length, 5);
    }

    #[test]
    fn from_file_reports_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            FileRecord::from_file(&missing, "missing.bin", 0),
            Err(BundleError::Io(_))
        ));
    }

    #[test]
    fn from_bundle_range_verifies_the_hash() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("payload.cb");
        fs::write(&bundle_path, b"helloworld").unwrap();
        let mut bundle = File::open(&bundle_path).unwrap();

        let out = dir.path().join("out/b.txt");
        let expected = hash::sha256(b"world");
        let record =
            FileRecord::from_bundle_range(&mut bundle, &out, 5, 5, &expected).unwrap();
        assert_eq!(record.bytes(), b"world");

        record.write_to_disk().unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"world");
    }

    #[test]
    fn from_bundle_range_rejects_wrong_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_path = dir.path().join("payload.cb");
        fs::write(&bundle_path, b"helloworld").unwrap();
        let mut bundle = File::open(&bundle_path).unwrap();

        let out = dir.path().join("out/a.txt");
        let expected = hash::sha256(b"hello");
        assert!(matches!(
            FileRecord::from_bundle_range(&mut bundle, &out, 5, 5, &expected),
            Err(BundleError::Integrity(_))
        ));
    }
}
