#![warn(missing_docs)]
//! # Gridbench
//!
//! Benchmark-matrix execution engine: enumerate every combination of
//! {backend environments} × {swept variables} × {iterations}, run each
//! with correct setup/teardown ordering, capture raw output, and persist
//! one structured record per run in a queryable form.
//!
//! - **Variable sweeps**: constants plus ordered value ranges expanded
//!   into a deterministic cross product
//! - **Composed backends**: ordered member chains started forward and
//!   stopped in exact reverse, each member receiving only its declared
//!   arguments
//! - **Deterministic naming**: every run's raw output is named by a
//!   lossless identity encoding of its full parameter vector
//! - **Pluggable storage**: flat `key=value` files or a derived SQLite
//!   schema, selected by the target path's `.db` suffix
//! - **Shell adapters**: benchmarks and backends backed by plain shell
//!   commands
//!
//! ## Quick Start
//!
//! ```ignore
//! use gridbench::prelude::*;
//!
//! let mut registry = Registry::new();
//! registry.register_benchmark(BenchmarkSpec::new(
//!     "writes",
//!     vec!["x".to_string()],
//!     Arc::new(ShellBenchmark::new("my-bench --size \"$x\"")),
//! )?)?;
//!
//! let binding = BenchmarkBinding::new(
//!     registry.benchmark("writes")?,
//!     VariableSet::new(vec![], vec![("x".into(), values)])?,
//!     3,
//! )?;
//!
//! let mut plan = Plan::new();
//! plan.add(Execution::new(
//!     "latency-test",
//!     binding,
//!     vec![],
//!     Some(Box::new(parser)),
//!     StorageTarget::from_path("results"),
//!     &GridConfig::discover().unwrap_or_default(),
//! )?);
//! plan.run()?;
//! ```

// Re-export the data model
pub use gridbench_core::{
    ArgMap, BackendHandler, BackendSpec, BackendState, BenchmarkBinding, BenchmarkRunner,
    BenchmarkSpec, BoxError, ComposedBackend, ConfigError, FileParser, MatchParser, OutputParser,
    Record, Registry, Restriction, RunError, Value, VariableSet, RESERVED_NAMES,
};

// Re-export the storage layer
pub use gridbench_store::{
    DecodedIdentity, FlatFileSink, IdentityCodec, IdentityError, RelationalSink, StorageSchema,
    StorageSink, StorageTarget, StoreError, TableSchema, OWNERSHIP_MARKER,
};

// Re-export the orchestration layer
pub use gridbench_runner::{
    init_logging, ExecState, Execution, GridConfig, Plan, ShellBackend, ShellBenchmark,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BackendSpec, BenchmarkBinding, BenchmarkSpec, Execution, GridConfig, MatchParser, Plan,
        Record, Registry, Restriction, ShellBackend, ShellBenchmark, StorageTarget, Value,
        VariableSet,
    };
}
