//! Deterministic identity encoding for one run's full parameter vector.
//!
//! The identity string is both the raw-output filename and the decode key
//! for the flat-file sink, so encode/decode must be a lossless bijection
//! over (backend identity, every varying value, iteration):
//!
//! ```text
//! {execution}_b_{path_out}_{backendVal_1}..{backendVal_k}_{benchVal_1}..{benchVal_m}_{iter}
//! ```
//!
//! The `_b_{path_out}` segment is omitted entirely when no backend is
//! attached. Decoding splits on `_` and consumes exactly the token counts
//! the codec's layout prescribes; any mismatch is an error, never a
//! best-effort guess.

use crate::error::IdentityError;
use gridbench_core::{ArgMap, ComposedBackend, Record, Value, VariableSet};

/// Sentinel token marking the presence of a backend segment.
const BACKEND_SENTINEL: &str = "b";

/// Per-(execution, backend-variant) identity encoder/decoder.
///
/// The codec persists the *names* of the varying variables (in declared
/// order); values are positional in the identity string.
#[derive(Debug, Clone)]
pub struct IdentityCodec {
    execution: String,
    backend: Option<BackendLayout>,
    bench_y_names: Vec<String>,
}

#[derive(Debug, Clone)]
struct BackendLayout {
    path_out: String,
    y_names: Vec<String>,
}

/// The parameter vector recovered from an identity string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedIdentity {
    /// Execution name.
    pub execution: String,
    /// User-facing backend path (`a/b`), when a backend segment is present.
    pub backend_path: Option<String>,
    /// Backend varying (name, raw token) pairs in declared order.
    pub backend_values: Vec<(String, String)>,
    /// Benchmark varying (name, raw token) pairs in declared order.
    pub bench_values: Vec<(String, String)>,
    /// Trailing iteration index.
    pub iteration: u32,
}

impl DecodedIdentity {
    /// The auxiliary record fields carried by the identity itself:
    /// `_execution_name`, `_iter`, `_backend` (when present), and every
    /// varying name with its lossily re-parsed value.
    pub fn record_fields(&self) -> Record {
        let mut record = Record::new();
        record.set("_execution_name", self.execution.as_str());
        record.set("_iter", self.iteration as i64);
        if let Some(path) = &self.backend_path {
            record.set("_backend", path.as_str());
        }
        for (name, token) in self.backend_values.iter().chain(&self.bench_values) {
            record.set(name.clone(), Value::parse_lossy(token));
        }
        record
    }
}

impl IdentityCodec {
    /// Build a codec for one execution and one backend variant (or none).
    pub fn new(
        execution: &str,
        backend: Option<&ComposedBackend>,
        bench_vars: &VariableSet,
    ) -> Self {
        Self {
            execution: execution.to_string(),
            backend: backend.map(|b| BackendLayout {
                path_out: b.path_out(),
                y_names: b
                    .variables()
                    .y_names()
                    .into_iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
            bench_y_names: bench_vars
                .y_names()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Total `_`-separated tokens an identity from this codec contains.
    fn expected_tokens(&self) -> usize {
        let backend_tokens = match &self.backend {
            // sentinel + path + one per varying name
            Some(layout) => 2 + layout.y_names.len(),
            None => 0,
        };
        // execution + backend segment + bench values + iteration
        1 + backend_tokens + self.bench_y_names.len() + 1
    }

    /// Encode one run's parameter vector.
    ///
    /// Fails if any rendered token is empty or contains `_` or `/` — such
    /// a value could not survive the round trip.
    pub fn encode(
        &self,
        backend_args: &ArgMap,
        bench_args: &ArgMap,
        iteration: u32,
    ) -> Result<String, IdentityError> {
        let mut tokens = Vec::with_capacity(self.expected_tokens());
        tokens.push(validate_token(self.execution.clone())?);

        if let Some(layout) = &self.backend {
            tokens.push(BACKEND_SENTINEL.to_string());
            tokens.push(validate_token(layout.path_out.clone())?);
            for name in &layout.y_names {
                tokens.push(validate_token(render_arg(backend_args, name)?)?);
            }
        }
        for name in &self.bench_y_names {
            tokens.push(validate_token(render_arg(bench_args, name)?)?);
        }
        tokens.push(iteration.to_string());

        Ok(tokens.join("_"))
    }

    /// Decode an identity string back into its parameter vector.
    ///
    /// Strict inverse of `encode`: the token count must match this codec's
    /// layout exactly, the sentinel and backend path must agree, and the
    /// trailing token must be an integer.
    pub fn decode(&self, identity: &str) -> Result<DecodedIdentity, IdentityError> {
        let tokens: Vec<&str> = identity.split('_').collect();
        if tokens.len() != self.expected_tokens() {
            return Err(IdentityError::TokenCount {
                expected: self.expected_tokens(),
                found: tokens.len(),
                identity: identity.to_string(),
            });
        }

        let mut cursor = tokens.into_iter();
        let execution = cursor.next().unwrap_or_default();
        if execution != self.execution {
            return Err(IdentityError::ExecutionMismatch {
                expected: self.execution.clone(),
                found: execution.to_string(),
            });
        }

        let mut backend_path = None;
        let mut backend_values = Vec::new();
        if let Some(layout) = &self.backend {
            if cursor.next() != Some(BACKEND_SENTINEL) {
                return Err(IdentityError::Sentinel {
                    identity: identity.to_string(),
                });
            }
            let path_out = cursor.next().unwrap_or_default();
            if path_out != layout.path_out {
                return Err(IdentityError::PathMismatch {
                    expected: layout.path_out.clone(),
                    found: path_out.to_string(),
                });
            }
            backend_path = Some(ComposedBackend::out_to_path(path_out));
            for name in &layout.y_names {
                let token = cursor.next().unwrap_or_default();
                backend_values.push((name.clone(), token.to_string()));
            }
        }

        let mut bench_values = Vec::new();
        for name in &self.bench_y_names {
            let token = cursor.next().unwrap_or_default();
            bench_values.push((name.clone(), token.to_string()));
        }

        let iter_token = cursor.next().unwrap_or_default();
        let iteration = iter_token
            .parse::<u32>()
            .map_err(|_| IdentityError::BadIteration {
                token: iter_token.to_string(),
            })?;

        Ok(DecodedIdentity {
            execution: execution.to_string(),
            backend_path,
            backend_values,
            bench_values,
            iteration,
        })
    }
}

fn render_arg(args: &ArgMap, name: &str) -> Result<String, IdentityError> {
    args.get(name)
        .map(|v| v.render())
        .ok_or_else(|| IdentityError::MissingVarying {
            name: name.to_string(),
        })
}

fn validate_token(token: String) -> Result<String, IdentityError> {
    if token.is_empty() || token.contains('_') || token.contains('/') {
        return Err(IdentityError::UnencodableToken { token });
    }
    Ok(token)
}
