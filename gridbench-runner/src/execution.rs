//! The execution orchestrator: one named sweep of a benchmark across its
//! composed backends, variables, and iterations.
//!
//! An `Execution` owns exactly one storage sink and walks the full matrix
//! sequentially: for each composed backend (or one implicit no-backend
//! pass), for each backend argument set, for each benchmark argument set
//! and iteration, run the lifecycle and the benchmark, then parse and
//! persist the record immediately. Cell failures are logged and isolated;
//! configuration and storage failures abort.

use crate::config::GridConfig;
use gridbench_core::{
    ArgMap, BenchmarkBinding, ComposedBackend, ConfigError, OutputParser, Record, Restriction,
};
use gridbench_store::{open_sink, IdentityCodec, StorageSchema, StorageSink, StorageTarget, StoreError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::warn;

/// Lifecycle state of an execution within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Storage prepared (or untouched); no runs performed yet.
    Clean,
    /// Runs performed; no parsed record set available.
    Executing,
    /// Parsed record set populated; stable for the rest of the process.
    Parsed,
}

/// One named benchmark sweep bound to its backends, parser, and storage.
pub struct Execution {
    name: String,
    benchmark: BenchmarkBinding,
    backends: Vec<ComposedBackend>,
    parser: Option<Box<dyn OutputParser>>,
    target: StorageTarget,
    raw_dir: PathBuf,
    sink: Box<dyn StorageSink>,
    codecs: Vec<IdentityCodec>,
    hold_backend: bool,
    state: ExecState,
    cached: Vec<Record>,
}

impl Execution {
    /// Build an execution. The name must not contain `/` or `_` (the
    /// identity encoding is `_`-delimited); one identity codec is derived
    /// per composed-backend variant, and the sink is selected by the
    /// target's `.db` suffix.
    pub fn new(
        name: &str,
        benchmark: BenchmarkBinding,
        backends: Vec<ComposedBackend>,
        parser: Option<Box<dyn OutputParser>>,
        target: StorageTarget,
        config: &GridConfig,
    ) -> Result<Self, ConfigError> {
        if name.is_empty() || name.contains('/') || name.contains('_') {
            return Err(ConfigError::InvalidExecutionName {
                name: name.to_string(),
            });
        }

        let codecs = if backends.is_empty() {
            vec![IdentityCodec::new(name, None, benchmark.variables())]
        } else {
            backends
                .iter()
                .map(|b| IdentityCodec::new(name, Some(b), benchmark.variables()))
                .collect()
        };

        let parser_fields = parser.as_ref().map(|p| p.fields()).unwrap_or_default();
        let schema = StorageSchema::derive(name, &benchmark, &backends, &parser_fields);
        let sink = open_sink(&target, schema, codecs.clone());
        let raw_dir = target.raw_dir();

        Ok(Self {
            name: name.to_string(),
            benchmark,
            backends,
            parser,
            target,
            raw_dir,
            sink,
            codecs,
            hold_backend: config.runner.hold_backend,
            state: ExecState::Clean,
            cached: Vec::new(),
        })
    }

    /// Execution name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecState {
        self.state
    }

    /// The parsed record set, populated by `execute()`/`parse()`.
    pub fn records(&self) -> &[Record] {
        &self.cached
    }

    /// Whether the name is declared by the benchmark variables, any
    /// backend's variables, or the bound parser.
    pub fn param_exists(&self, name: &str) -> bool {
        self.benchmark.variables().param_exists(name)
            || self
                .backends
                .iter()
                .any(|b| b.variables().param_exists(name))
            || self
                .parser
                .as_ref()
                .map(|p| p.param_exists(name))
                .unwrap_or(false)
    }

    /// Prepare the storage target for a fresh run.
    pub fn clean(&mut self) -> Result<(), StoreError> {
        self.sink.clean()?;
        if matches!(self.target, StorageTarget::Database(_)) {
            std::fs::create_dir_all(&self.raw_dir)?;
        }
        self.cached.clear();
        self.state = ExecState::Clean;
        Ok(())
    }

    /// Run the full matrix, persisting one record per run as it completes.
    ///
    /// Benchmark and lifecycle failures are logged and isolated (a failed
    /// backend start skips its whole argument set); identity and storage
    /// failures abort.
    pub fn execute(&mut self) -> Result<(), StoreError> {
        self.state = ExecState::Executing;
        self.cached.clear();

        let bench_sets = self.benchmark.variables().expand();
        let iterations = self.benchmark.iterations();
        let backend_sets: u64 = self
            .backends
            .iter()
            .map(|b| b.variables().expand().len() as u64)
            .sum::<u64>()
            .max(1);
        let pb = ProgressBar::new(backend_sets * bench_sets.len() as u64 * iterations as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(self.name.clone());

        let result = if self.backends.is_empty() {
            let codec = self.codecs[0].clone();
            self.run_matrix_bare(&codec, &bench_sets, &pb)
        } else {
            // Backends are moved out for the duration of the walk so the
            // lifecycle can borrow them mutably alongside `self`.
            let mut backends = std::mem::take(&mut self.backends);
            let codecs = self.codecs.clone();
            let mut result = Ok(());
            for (backend, codec) in backends.iter_mut().zip(&codecs) {
                result = self.run_matrix(backend, codec, &bench_sets, &pb);
                if result.is_err() {
                    break;
                }
            }
            self.backends = backends;
            result
        };

        pb.finish_and_clear();
        if result.is_ok() && self.parser.is_some() {
            self.state = ExecState::Parsed;
        }
        result
    }

    fn run_matrix_bare(
        &mut self,
        codec: &IdentityCodec,
        bench_sets: &[ArgMap],
        pb: &ProgressBar,
    ) -> Result<(), StoreError> {
        for bench_args in bench_sets {
            for iteration in 0..self.benchmark.iterations() {
                self.run_cell(None, None, codec, bench_args, iteration)?;
                pb.inc(1);
            }
        }
        Ok(())
    }

    fn run_matrix(
        &mut self,
        backend: &mut ComposedBackend,
        codec: &IdentityCodec,
        bench_sets: &[ArgMap],
        pb: &ProgressBar,
    ) -> Result<(), StoreError> {
        let path = backend.path();
        let iterations = self.benchmark.iterations();

        'arg_sets: for backend_args in backend.variables().expand() {
            if self.hold_backend {
                if let Err(err) = backend.start(&backend_args) {
                    warn!(backend = %path, error = %err, "backend failed to start; skipping argument set");
                    continue 'arg_sets;
                }
            }

            for bench_args in bench_sets {
                for iteration in 0..iterations {
                    if !self.hold_backend {
                        if let Err(err) = backend.start(&backend_args) {
                            warn!(backend = %path, error = %err, "backend failed to start; skipping argument set");
                            continue 'arg_sets;
                        }
                    }

                    let cell =
                        self.run_cell(Some(&path), Some(&backend_args), codec, bench_args, iteration);

                    if !self.hold_backend {
                        if let Err(err) = backend.stop() {
                            warn!(backend = %path, error = %err, "backend failed to stop; continuing");
                        }
                    }
                    cell?;
                    pb.inc(1);
                }
            }

            if self.hold_backend {
                if let Err(err) = backend.stop() {
                    warn!(backend = %path, error = %err, "backend failed to stop; continuing");
                }
            }
        }
        Ok(())
    }

    fn run_cell(
        &mut self,
        backend_path: Option<&str>,
        backend_args: Option<&ArgMap>,
        codec: &IdentityCodec,
        bench_args: &ArgMap,
        iteration: u32,
    ) -> Result<(), StoreError> {
        let empty = ArgMap::new();
        let identity = codec.encode(backend_args.unwrap_or(&empty), bench_args, iteration)?;
        let out_path = self.raw_dir.join(&identity);

        if let Err(err) = self.benchmark.spec().run(backend_path, &out_path, bench_args) {
            warn!(
                benchmark = self.benchmark.spec().name(),
                identity = %identity,
                error = %err,
                "benchmark run failed; skipping cell"
            );
            return Ok(());
        }

        if self.parser.is_none() {
            return Ok(());
        }
        let Some(record) =
            self.parse_raw(&identity, backend_path, backend_args, bench_args, iteration)
        else {
            return Ok(());
        };

        match self.sink.write(&identity, &record, backend_args, bench_args) {
            Ok(()) => self.cached.push(record),
            Err(StoreError::NoMatchingTable { .. }) => {
                warn!(identity = %identity, "record matched no table; dropped");
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Parse one run's already-materialized raw output into a full record.
    /// A parse failure is a cell failure: logged, no record.
    fn parse_raw(
        &self,
        identity: &str,
        backend_path: Option<&str>,
        backend_args: Option<&ArgMap>,
        bench_args: &ArgMap,
        iteration: u32,
    ) -> Option<Record> {
        let parser = self.parser.as_ref()?;
        let out_path = self.raw_dir.join(identity);

        let partial = match parser.parse(&out_path) {
            Ok(Some(partial)) => partial,
            Ok(None) => return None,
            Err(err) => {
                warn!(identity = %identity, error = %err, "parse failed; skipping cell");
                return None;
            }
        };

        let mut record = Record::new();
        for (k, v) in bench_args {
            record.set(k.clone(), v.clone());
        }
        if let Some(args) = backend_args {
            for (k, v) in args {
                record.set(k.clone(), v.clone());
            }
        }
        record.set("_execution_name", self.name.as_str());
        record.set("_workload", self.benchmark.spec().name());
        record.set("_iter", iteration as i64);
        if let Some(path) = backend_path {
            record.set("_backend", path);
        }
        record.merge(&partial);
        Some(record)
    }

    /// Rebuild the parsed record set from already-materialized raw outputs.
    ///
    /// A pure replay of the matrix: same identities, no lifecycle, no
    /// benchmark runs, no sink writes. Idempotent once populated.
    pub fn parse(&mut self) -> Result<(), StoreError> {
        if self.state == ExecState::Parsed {
            return Ok(());
        }

        let bench_sets = self.benchmark.variables().expand();
        let iterations = self.benchmark.iterations();
        let mut cached = Vec::new();

        if self.backends.is_empty() {
            let codec = &self.codecs[0];
            for bench_args in &bench_sets {
                for iteration in 0..iterations {
                    let identity = codec.encode(&ArgMap::new(), bench_args, iteration)?;
                    if let Some(record) =
                        self.parse_raw(&identity, None, None, bench_args, iteration)
                    {
                        cached.push(record);
                    }
                }
            }
        } else {
            for (backend, codec) in self.backends.iter().zip(&self.codecs) {
                let path = backend.path();
                for backend_args in backend.variables().expand() {
                    for bench_args in &bench_sets {
                        for iteration in 0..iterations {
                            let identity = codec.encode(&backend_args, bench_args, iteration)?;
                            if let Some(record) = self.parse_raw(
                                &identity,
                                Some(&path),
                                Some(&backend_args),
                                bench_args,
                                iteration,
                            ) {
                                cached.push(record);
                            }
                        }
                    }
                }
            }
        }

        self.cached = cached;
        self.state = ExecState::Parsed;
        Ok(())
    }

    /// Read back every persisted record matching the restriction.
    pub fn read_all(&self, restriction: &Restriction) -> Result<Vec<Record>, StoreError> {
        self.sink.read_all(restriction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbench_core::{
        BackendHandler, BackendSpec, BenchmarkRunner, BenchmarkSpec, BoxError, MatchParser, Value,
        VariableSet,
    };
    use regex::Regex;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct CountingRunner {
        runs: Arc<Mutex<u32>>,
        fail: bool,
    }

    impl BenchmarkRunner for CountingRunner {
        fn run(&self, _: Option<&str>, out_path: &Path, args: &ArgMap) -> Result<(), BoxError> {
            *self.runs.lock().unwrap() += 1;
            if self.fail {
                return Err("benchmark blew up".into());
            }
            let x = args.get("x").map(|v| v.render()).unwrap_or_default();
            std::fs::write(out_path, format!("latency {}\n", x))?;
            Ok(())
        }
    }

    struct CountingHandler {
        starts: Arc<Mutex<u32>>,
        stops: Arc<Mutex<u32>>,
        fail_start: bool,
    }

    impl BackendHandler for CountingHandler {
        fn start(&self, _: &ArgMap) -> Result<(), BoxError> {
            *self.starts.lock().unwrap() += 1;
            if self.fail_start {
                return Err("backend down".into());
            }
            Ok(())
        }
        fn stop(&self) -> Result<(), BoxError> {
            *self.stops.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct Fixture {
        runs: Arc<Mutex<u32>>,
        starts: Arc<Mutex<u32>>,
        stops: Arc<Mutex<u32>>,
    }

    fn bench_vars(xs: &[i64]) -> VariableSet {
        VariableSet::new(
            vec![],
            vec![("x".to_string(), xs.iter().map(|v| Value::Int(*v)).collect())],
        )
        .unwrap()
    }

    fn parser() -> Box<dyn OutputParser> {
        Box::new(
            MatchParser::new().rule(Regex::new(r"^latency").unwrap(), &["latency"], |line| {
                vec![Value::parse_lossy(line.split_whitespace().nth(1).unwrap())]
            }),
        )
    }

    fn execution(
        dir: &TempDir,
        xs: &[i64],
        iterations: u32,
        with_backend: bool,
        fail_start: bool,
        hold_backend: bool,
    ) -> (Execution, Fixture) {
        let fixture = Fixture {
            runs: Arc::new(Mutex::new(0)),
            starts: Arc::new(Mutex::new(0)),
            stops: Arc::new(Mutex::new(0)),
        };

        let spec = Arc::new(
            BenchmarkSpec::new(
                "writes",
                vec!["x".to_string()],
                Arc::new(CountingRunner {
                    runs: Arc::clone(&fixture.runs),
                    fail: false,
                }),
            )
            .unwrap(),
        );
        let binding = BenchmarkBinding::new(spec, bench_vars(xs), iterations).unwrap();

        let backends = if with_backend {
            let member = Arc::new(
                BackendSpec::new(
                    "srv",
                    vec![],
                    Arc::new(CountingHandler {
                        starts: Arc::clone(&fixture.starts),
                        stops: Arc::clone(&fixture.stops),
                        fail_start,
                    }),
                )
                .unwrap(),
            );
            vec![ComposedBackend::new(vec![member], VariableSet::empty())]
        } else {
            vec![]
        };

        let mut config = GridConfig::default();
        config.runner.hold_backend = hold_backend;

        let execution = Execution::new(
            "latency-test",
            binding,
            backends,
            Some(parser()),
            StorageTarget::from_path(dir.path().join("out")),
            &config,
        )
        .unwrap();
        (execution, fixture)
    }

    #[test]
    fn names_with_forbidden_characters_are_rejected() {
        let dir = TempDir::new().unwrap();
        for bad in ["my_exec", "my/exec", ""] {
            let spec = Arc::new(
                BenchmarkSpec::new(
                    "writes",
                    vec![],
                    Arc::new(CountingRunner {
                        runs: Arc::new(Mutex::new(0)),
                        fail: false,
                    }),
                )
                .unwrap(),
            );
            let binding = BenchmarkBinding::new(spec, VariableSet::empty(), 1).unwrap();
            let err = Execution::new(
                bad,
                binding,
                vec![],
                None,
                StorageTarget::from_path(dir.path().join("out")),
                &GridConfig::default(),
            );
            assert!(matches!(
                err,
                Err(ConfigError::InvalidExecutionName { .. })
            ));
        }
    }

    #[test]
    fn execute_materializes_raw_outputs_and_records() {
        let dir = TempDir::new().unwrap();
        let (mut exec, fixture) = execution(&dir, &[0, 1, 2], 2, false, false, false);

        exec.clean().unwrap();
        exec.execute().unwrap();

        assert_eq!(*fixture.runs.lock().unwrap(), 6);
        assert_eq!(exec.records().len(), 6);
        assert_eq!(exec.state(), ExecState::Parsed);

        // Raw outputs carry the bare identity name.
        for name in ["latency-test_0_0", "latency-test_1_1", "latency-test_2_0"] {
            assert!(dir.path().join("out").join(name).exists(), "{name}");
        }

        let mut only_x1 = Restriction::new();
        only_x1.insert("x".to_string(), "1".to_string());
        let rows = exec.read_all(&only_x1).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.get("latency") == Some(&Value::Int(1))));
    }

    #[test]
    fn default_lifecycle_wraps_every_iteration() {
        let dir = TempDir::new().unwrap();
        let (mut exec, fixture) = execution(&dir, &[0, 1], 2, true, false, false);

        exec.clean().unwrap();
        exec.execute().unwrap();

        assert_eq!(*fixture.runs.lock().unwrap(), 4);
        assert_eq!(*fixture.starts.lock().unwrap(), 4);
        assert_eq!(*fixture.stops.lock().unwrap(), 4);
    }

    #[test]
    fn hold_backend_collapses_lifecycle_to_one_per_argument_set() {
        let dir = TempDir::new().unwrap();
        let (mut exec, fixture) = execution(&dir, &[0, 1], 2, true, false, true);

        exec.clean().unwrap();
        exec.execute().unwrap();

        assert_eq!(*fixture.runs.lock().unwrap(), 4);
        assert_eq!(*fixture.starts.lock().unwrap(), 1);
        assert_eq!(*fixture.stops.lock().unwrap(), 1);
    }

    #[test]
    fn failed_backend_start_skips_the_argument_set() {
        let dir = TempDir::new().unwrap();
        let (mut exec, fixture) = execution(&dir, &[0, 1], 2, true, true, false);

        exec.clean().unwrap();
        exec.execute().unwrap();

        // No partial runs, and the failed chain is not stopped.
        assert_eq!(*fixture.runs.lock().unwrap(), 0);
        assert_eq!(*fixture.stops.lock().unwrap(), 0);
        assert!(exec.records().is_empty());
    }

    #[test]
    fn parse_replays_without_rerunning_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (mut exec, fixture) = execution(&dir, &[0, 1, 2], 2, false, false, false);

        exec.clean().unwrap();
        exec.execute().unwrap();
        let executed = exec.records().to_vec();

        exec.state = ExecState::Executing; // force a real replay
        exec.parse().unwrap();
        assert_eq!(*fixture.runs.lock().unwrap(), 6);
        assert_eq!(exec.records(), &executed[..]);

        exec.parse().unwrap();
        assert_eq!(exec.records(), &executed[..]);
        assert_eq!(exec.state(), ExecState::Parsed);
    }

    #[test]
    fn param_exists_covers_variables_and_parser_fields() {
        let dir = TempDir::new().unwrap();
        let (exec, _) = execution(&dir, &[0], 1, false, false, false);
        assert!(exec.param_exists("x"));
        assert!(exec.param_exists("latency"));
        assert!(!exec.param_exists("throughput"));
    }
}
