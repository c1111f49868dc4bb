#![warn(missing_docs)]
//! Gridbench Core - Matrix Data Model
//!
//! This crate provides the leaf-level building blocks of the
//! benchmark-matrix engine:
//! - `VariableSet` for expanding constants + ranges into a cross product
//! - `BackendSpec`/`ComposedBackend` with the start/stop lifecycle chain
//! - `BenchmarkSpec`/`BenchmarkBinding` for the run contract
//! - `Registry` for explicit name→descriptor lookup
//! - `Record`/`Restriction` as the persisted result model
//! - the `OutputParser` contract with `MatchParser` and `FileParser`

mod backend;
mod benchmark;
mod error;
mod parser;
mod record;
mod registry;
mod value;
mod variables;

pub use backend::{BackendHandler, BackendSpec, BackendState, ComposedBackend};
pub use benchmark::{BenchmarkBinding, BenchmarkRunner, BenchmarkSpec};
pub use error::{BoxError, ConfigError, RunError};
pub use parser::{FileParser, MatchParser, OutputParser};
pub use record::{Record, Restriction};
pub use registry::Registry;
pub use value::Value;
pub use variables::{ArgMap, VariableSet, RESERVED_NAMES};
