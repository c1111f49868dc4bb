#![warn(missing_docs)]
//! Gridbench Store - Result Persistence
//!
//! Storage layer for matrix results: the identity codec that names every
//! run, the relational schema derived from registered components, and the
//! two `StorageSink` implementations — flat key=value files and SQLite —
//! selected by the target path's `.db` suffix.

mod error;
mod flat;
mod naming;
mod relational;
mod schema;
mod sink;

pub use error::{IdentityError, StoreError};
pub use flat::{FlatFileSink, OWNERSHIP_MARKER};
pub use naming::{DecodedIdentity, IdentityCodec};
pub use relational::RelationalSink;
pub use schema::{StorageSchema, TableSchema};
pub use sink::{open_sink, StorageSink, StorageTarget};
