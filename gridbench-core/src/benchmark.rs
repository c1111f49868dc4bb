//! Benchmark descriptors and per-execution bindings.

use crate::error::{validate_component_name, BoxError, ConfigError};
use crate::variables::{ArgMap, VariableSet, RESERVED_NAMES};
use std::path::Path;
use std::sync::Arc;

/// The run operation a benchmark implementation provides.
///
/// `backend` is the user-facing composed path of the running backend (or
/// `None` when the execution has no backend); the implementation must
/// write its raw output to `out_path` as its side effect.
pub trait BenchmarkRunner: Send + Sync {
    /// Run once with the given argument assignment.
    fn run(&self, backend: Option<&str>, out_path: &Path, args: &ArgMap) -> Result<(), BoxError>;
}

/// Class-level definition of a named benchmark.
#[derive(Clone)]
pub struct BenchmarkSpec {
    name: String,
    params: Vec<String>,
    runner: Arc<dyn BenchmarkRunner>,
}

impl std::fmt::Debug for BenchmarkSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl BenchmarkSpec {
    /// Define a benchmark. The name is lowercase-normalized and must be
    /// free of `-`, `/`, and `_` (the separators of the path and identity
    /// renderings); `params` is the explicit list of argument names `run`
    /// accepts. Reserved field names are rejected.
    pub fn new(
        name: &str,
        params: Vec<String>,
        runner: Arc<dyn BenchmarkRunner>,
    ) -> Result<Self, ConfigError> {
        validate_component_name("benchmark", name)?;
        for param in &params {
            if RESERVED_NAMES.contains(&param.as_str()) {
                return Err(ConfigError::ReservedName {
                    name: param.clone(),
                });
            }
        }
        Ok(Self {
            name: name.to_lowercase(),
            params,
            runner,
        })
    }

    /// Normalized benchmark name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared run-argument names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Invoke the user runner.
    pub fn run(
        &self,
        backend: Option<&str>,
        out_path: &Path,
        args: &ArgMap,
    ) -> Result<(), BoxError> {
        self.runner.run(backend, out_path, args)
    }
}

/// A benchmark spec bound to concrete variables and an iteration count,
/// owned by a single execution.
#[derive(Debug, Clone)]
pub struct BenchmarkBinding {
    spec: Arc<BenchmarkSpec>,
    variables: VariableSet,
    iterations: u32,
}

impl BenchmarkBinding {
    /// Bind a spec with its sweep variables and per-cell iteration count.
    pub fn new(
        spec: Arc<BenchmarkSpec>,
        variables: VariableSet,
        iterations: u32,
    ) -> Result<Self, ConfigError> {
        if iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                name: spec.name().to_string(),
            });
        }
        Ok(Self {
            spec,
            variables,
            iterations,
        })
    }

    /// The underlying spec.
    pub fn spec(&self) -> &Arc<BenchmarkSpec> {
        &self.spec
    }

    /// The bound variable set.
    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Runs per matrix cell, always ≥ 1.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}
