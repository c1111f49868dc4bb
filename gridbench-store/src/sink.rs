//! Storage sink abstraction and target selection.

use crate::error::StoreError;
use crate::flat::FlatFileSink;
use crate::naming::IdentityCodec;
use crate::relational::RelationalSink;
use crate::schema::StorageSchema;
use gridbench_core::{ArgMap, Record, Restriction};
use std::path::{Path, PathBuf};

/// Where an execution persists its records, disambiguated by the reserved
/// `.db` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Directory of flat key=value files.
    Directory(PathBuf),
    /// SQLite database file.
    Database(PathBuf),
}

impl StorageTarget {
    /// Classify a user-supplied target path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.extension().is_some_and(|ext| ext == "db") {
            StorageTarget::Database(path)
        } else {
            StorageTarget::Directory(path)
        }
    }

    /// Directory where raw benchmark outputs are materialized.
    ///
    /// Flat targets keep raw outputs beside the record files; relational
    /// targets use a `{stem}.raw` sibling directory.
    pub fn raw_dir(&self) -> PathBuf {
        match self {
            StorageTarget::Directory(dir) => dir.clone(),
            StorageTarget::Database(db) => db.with_extension("raw"),
        }
    }

    /// The underlying path.
    pub fn path(&self) -> &Path {
        match self {
            StorageTarget::Directory(p) | StorageTarget::Database(p) => p,
        }
    }
}

/// Persists one record per run and reads them back under a restriction.
pub trait StorageSink: Send {
    /// Prepare the target for a fresh run (create/reset).
    fn clean(&self) -> Result<(), StoreError>;

    /// Persist one record. `identity` is the run's encoded identity;
    /// `backend_args`/`bench_args` are the fallback sources for derived
    /// columns the record itself lacks.
    fn write(
        &self,
        identity: &str,
        record: &Record,
        backend_args: Option<&ArgMap>,
        bench_args: &ArgMap,
    ) -> Result<(), StoreError>;

    /// Read back every persisted record matching the restriction.
    fn read_all(&self, restriction: &Restriction) -> Result<Vec<Record>, StoreError>;
}

/// Open the sink appropriate for a target.
pub fn open_sink(
    target: &StorageTarget,
    schema: StorageSchema,
    codecs: Vec<IdentityCodec>,
) -> Box<dyn StorageSink> {
    match target {
        StorageTarget::Directory(dir) => Box::new(FlatFileSink::new(dir.clone(), codecs)),
        StorageTarget::Database(db) => Box::new(RelationalSink::new(db.clone(), schema)),
    }
}
