//! Error taxonomy for plan construction and matrix execution.
//!
//! `ConfigError` covers everything that can be rejected before any run is
//! attempted; `RunError` covers a single failed matrix cell and is never
//! allowed to cascade past it.

use thiserror::Error;

/// Boxed error type accepted from user-supplied lifecycle, runner, and
/// parser implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building a plan, before any execution starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A user variable shadows an engine-reserved field.
    #[error("'{name}' is a reserved field name and cannot be declared as a variable")]
    ReservedName {
        /// Offending variable name
        name: String,
    },

    /// A name declared both constant and varying.
    #[error("'{name}' is declared both as a constant and as a varying variable")]
    NameClash {
        /// Offending variable name
        name: String,
    },

    /// A varying variable with no values.
    #[error("varying variable '{name}' has an empty value range")]
    EmptyRange {
        /// Offending variable name
        name: String,
    },

    /// An execution name the identity encoding cannot carry.
    #[error("execution name '{name}' contains a forbidden character ('/' or '_')")]
    InvalidExecutionName {
        /// Offending execution name
        name: String,
    },

    /// A backend or benchmark name the identity encoding cannot carry.
    #[error("{kind} name '{name}' is empty or contains a forbidden character ('-', '/', or '_')")]
    InvalidName {
        /// "benchmark" or "backend"
        kind: &'static str,
        /// Offending name
        name: String,
    },

    /// A benchmark bound with zero iterations.
    #[error("benchmark '{name}' declares zero iterations; at least one is required")]
    ZeroIterations {
        /// Offending benchmark name
        name: String,
    },

    /// Lookup of an unregistered benchmark.
    #[error("no registered benchmark named '{name}'")]
    UnknownBenchmark {
        /// Requested benchmark name
        name: String,
    },

    /// Lookup of an unregistered backend.
    #[error("no registered backend named '{name}'")]
    UnknownBackend {
        /// Requested backend name
        name: String,
    },

    /// A second registration under an existing name.
    #[error("a {kind} named '{name}' is already registered")]
    DuplicateRegistration {
        /// "benchmark" or "backend"
        kind: &'static str,
        /// Conflicting name
        name: String,
    },

    /// A parser extractor produced the wrong number of values.
    #[error("parser rule '{rule}' produced {actual} values, expected {expected}")]
    ParserArity {
        /// Rule or parser identifier
        rule: String,
        /// Declared output-name count
        expected: usize,
        /// Values actually produced
        actual: usize,
    },
}

/// Reject names that cannot round-trip through the path and identity
/// renderings: member names land in `-`-joined filenames and
/// `_`-delimited identities, so all three separator characters are
/// forbidden at declaration time.
pub(crate) fn validate_component_name(kind: &'static str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains('-') || name.contains('/') || name.contains('_') {
        return Err(ConfigError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Failure of a single backend/benchmark invocation.
///
/// Isolated to one matrix cell: the orchestrator reports it and moves on.
#[derive(Debug, Error)]
pub enum RunError {
    /// A backend member failed to come up.
    #[error("backend '{backend}' failed to start: {source}")]
    BackendStart {
        /// Backend member name
        backend: String,
        /// Underlying failure reported by the handler
        source: BoxError,
    },

    /// A backend member failed to tear down.
    #[error("backend '{backend}' failed to stop: {source}")]
    BackendStop {
        /// Backend member name
        backend: String,
        /// Underlying failure reported by the handler
        source: BoxError,
    },

    /// The benchmark run itself failed.
    #[error("benchmark '{benchmark}' failed: {source}")]
    Benchmark {
        /// Benchmark name
        benchmark: String,
        /// Underlying failure reported by the runner
        source: BoxError,
    },

    /// The output parser rejected a raw output.
    #[error("parser failed on '{path}': {source}")]
    Parser {
        /// Raw output path handed to the parser
        path: String,
        /// Underlying failure reported by the parser
        source: BoxError,
    },
}
