//! Storage-layer errors.

use thiserror::Error;

/// Violation of the identity encoding's strict round-trip contract.
///
/// On the decode side this indicates a corrupted or hand-edited output
/// directory; on the encode side, a parameter value that cannot appear in
/// a `_`-delimited identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A rendered value that cannot survive the encoding.
    #[error("token '{token}' cannot appear in an identity (empty, or contains '_' or '/')")]
    UnencodableToken {
        /// Offending rendered token
        token: String,
    },

    /// An argument map lacking a declared varying value.
    #[error("varying variable '{name}' missing from the argument map")]
    MissingVarying {
        /// Varying name the codec expected a value for
        name: String,
    },

    /// An identity with the wrong number of tokens.
    #[error("identity '{identity}' has {found} tokens, expected {expected}")]
    TokenCount {
        /// Expected token count for this codec's layout
        expected: usize,
        /// Tokens actually present
        found: usize,
        /// Offending identity string
        identity: String,
    },

    /// A backend-carrying codec given an identity without the sentinel.
    #[error("identity '{identity}' lacks the backend sentinel token")]
    Sentinel {
        /// Offending identity string
        identity: String,
    },

    /// An identity from a different execution.
    #[error("identity names execution '{found}', codec is for '{expected}'")]
    ExecutionMismatch {
        /// Execution the codec decodes for
        expected: String,
        /// Execution named by the identity
        found: String,
    },

    /// An identity from a different backend variant.
    #[error("identity names backend path '{found}', codec is for '{expected}'")]
    PathMismatch {
        /// Backend path rendering the codec decodes for
        expected: String,
        /// Path rendering named by the identity
        found: String,
    },

    /// A non-integer trailing iteration token.
    #[error("trailing iteration token '{token}' is not an integer")]
    BadIteration {
        /// Offending token
        token: String,
    },
}

/// Storage sink failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure in the flat sink.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite failure in the relational sink.
    #[error("relational store error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Refusal to clean a directory the engine does not own.
    #[error(
        "output directory '{path}' is non-empty and not gridbench-owned; refusing to clean it"
    )]
    UnmanagedDirectory {
        /// Offending directory
        path: String,
    },

    /// A record whose triplet matches no derived table.
    #[error(
        "no table matches record (execution '{execution}', workload '{workload}', backend '{backend}')"
    )]
    NoMatchingTable {
        /// Record's `_execution_name`
        execution: String,
        /// Record's `_workload`
        workload: String,
        /// Record's `_backend` (sql rendering), or "<none>"
        backend: String,
    },

    /// A relational restriction that selected nothing.
    #[error("restriction {restriction} matched zero rows; restrictions must select at least one")]
    EmptyResult {
        /// Rendered restriction map
        restriction: String,
    },

    /// Identity round-trip violation while decoding stored names.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}
