//! Flat-file sink: one `{identity}.record` file of `key=value` lines per
//! run, stored beside the raw outputs.
//!
//! The filename is the only index this sink has, so reads lean entirely on
//! the identity codec: every record file's stem must decode under exactly
//! one of the execution's codecs, and a stem no codec accepts means the
//! directory has been corrupted or hand-edited.

use crate::error::{IdentityError, StoreError};
use crate::naming::IdentityCodec;
use crate::sink::StorageSink;
use gridbench_core::{ArgMap, Record, Restriction};
use std::path::PathBuf;

/// Marker file tagging a directory as gridbench-owned output.
pub const OWNERSHIP_MARKER: &str = ".gridbench";

/// Extension distinguishing record files from raw benchmark outputs.
const RECORD_EXT: &str = "record";

/// Directory-of-files storage sink.
pub struct FlatFileSink {
    dir: PathBuf,
    codecs: Vec<IdentityCodec>,
}

impl FlatFileSink {
    /// Build a sink over `dir` with one codec per composed-backend variant
    /// (a single codec when the execution has no backend).
    pub fn new(dir: PathBuf, codecs: Vec<IdentityCodec>) -> Self {
        Self { dir, codecs }
    }

    fn decode_stem(&self, stem: &str) -> Result<Record, StoreError> {
        let mut last_err = None;
        for codec in &self.codecs {
            match codec.decode(stem) {
                Ok(decoded) => return Ok(decoded.record_fields()),
                Err(err) => last_err = Some(err),
            }
        }
        Err(StoreError::Identity(last_err.unwrap_or(
            IdentityError::TokenCount {
                expected: 0,
                found: 0,
                identity: stem.to_string(),
            },
        )))
    }
}

impl StorageSink for FlatFileSink {
    /// Create the directory and tag it with the ownership marker.
    ///
    /// An existing non-empty directory without the marker is refused
    /// outright: it holds someone else's data. An owned directory is
    /// emptied of previous outputs.
    fn clean(&self) -> Result<(), StoreError> {
        let marker = self.dir.join(OWNERSHIP_MARKER);

        if self.dir.exists() {
            let entries: Vec<_> = std::fs::read_dir(&self.dir)?.collect::<Result<_, _>>()?;
            if !entries.is_empty() && !marker.exists() {
                return Err(StoreError::UnmanagedDirectory {
                    path: self.dir.display().to_string(),
                });
            }
            for entry in entries {
                if entry.file_name() != OWNERSHIP_MARKER {
                    std::fs::remove_file(entry.path())?;
                }
            }
        } else {
            std::fs::create_dir_all(&self.dir)?;
        }

        std::fs::write(marker, b"")?;
        Ok(())
    }

    fn write(
        &self,
        identity: &str,
        record: &Record,
        _backend_args: Option<&ArgMap>,
        _bench_args: &ArgMap,
    ) -> Result<(), StoreError> {
        let path = self.dir.join(format!("{}.{}", identity, RECORD_EXT));
        std::fs::write(path, record.to_lines())?;
        Ok(())
    }

    fn read_all(&self, restriction: &Restriction) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();

        let mut entries: Vec<_> = std::fs::read_dir(&self.dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();

            let identity_fields = self.decode_stem(stem)?;
            let mut record = Record::from_lines(&std::fs::read_to_string(&path)?);
            record.merge(&identity_fields);

            if record.matches(restriction) {
                records.push(record);
            }
        }

        Ok(records)
    }
}
