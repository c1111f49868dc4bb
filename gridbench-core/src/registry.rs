//! Explicit name→descriptor registry.
//!
//! Built once at plan-build time and treated as read-only during
//! execution. Names are lowercase-normalized, so lookups are
//! case-insensitive.

use crate::backend::BackendSpec;
use crate::benchmark::BenchmarkSpec;
use crate::error::ConfigError;
use fxhash::FxHashMap;
use std::sync::Arc;

/// Registered benchmark and backend descriptors.
#[derive(Debug, Default)]
pub struct Registry {
    benchmarks: FxHashMap<String, Arc<BenchmarkSpec>>,
    backends: FxHashMap<String, Arc<BackendSpec>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a benchmark descriptor. Duplicate names are rejected.
    pub fn register_benchmark(&mut self, spec: BenchmarkSpec) -> Result<(), ConfigError> {
        let name = spec.name().to_string();
        if self.benchmarks.contains_key(&name) {
            return Err(ConfigError::DuplicateRegistration {
                kind: "benchmark",
                name,
            });
        }
        self.benchmarks.insert(name, Arc::new(spec));
        Ok(())
    }

    /// Register a backend descriptor. Duplicate names are rejected.
    pub fn register_backend(&mut self, spec: BackendSpec) -> Result<(), ConfigError> {
        let name = spec.name().to_string();
        if self.backends.contains_key(&name) {
            return Err(ConfigError::DuplicateRegistration {
                kind: "backend",
                name,
            });
        }
        self.backends.insert(name, Arc::new(spec));
        Ok(())
    }

    /// Look up a benchmark by (case-insensitive) name.
    pub fn benchmark(&self, name: &str) -> Result<Arc<BenchmarkSpec>, ConfigError> {
        self.benchmarks
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownBenchmark {
                name: name.to_string(),
            })
    }

    /// Look up a backend by (case-insensitive) name.
    pub fn backend(&self, name: &str) -> Result<Arc<BackendSpec>, ConfigError> {
        self.backends
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownBackend {
                name: name.to_string(),
            })
    }

    /// Registered benchmark names, sorted.
    pub fn benchmark_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.benchmarks.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.backends.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
