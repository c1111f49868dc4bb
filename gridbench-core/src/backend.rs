//! Backend descriptors and composed backend lifecycle.
//!
//! A `BackendSpec` is the registry-owned, class-level definition of one
//! environment capability: a name, the argument names its `start` accepts,
//! and the stateless start/stop handler. Executions bind specs into a
//! `ComposedBackend` — an ordered member chain with one concrete
//! `VariableSet` — whose `start` runs forward and whose `stop` runs in
//! exact reverse, best-effort.

use crate::error::{validate_component_name, BoxError, ConfigError, RunError};
use crate::variables::{ArgMap, VariableSet, RESERVED_NAMES};
use std::sync::Arc;

/// Lifecycle operations a backend implementation provides.
///
/// Handlers are stateless from the engine's point of view; the RUNNING /
/// STOPPED state machine is tracked by the owning `ComposedBackend`.
pub trait BackendHandler: Send + Sync {
    /// Bring the environment up with the given arguments.
    fn start(&self, args: &ArgMap) -> Result<(), BoxError>;
    /// Tear the environment down.
    fn stop(&self) -> Result<(), BoxError>;
}

/// Class-level definition of a named backend.
#[derive(Clone)]
pub struct BackendSpec {
    name: String,
    params: Vec<String>,
    handler: Arc<dyn BackendHandler>,
}

impl std::fmt::Debug for BackendSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl BackendSpec {
    /// Define a backend. The name is lowercase-normalized and must be free
    /// of `-`, `/`, and `_` — member names are joined by those separators
    /// in the path renderings, and the identity decode relies on splitting
    /// them back apart. `params` is the explicit list of argument names
    /// `start` accepts (only these are forwarded from the merged argument
    /// map). Reserved field names are rejected.
    pub fn new(
        name: &str,
        params: Vec<String>,
        handler: Arc<dyn BackendHandler>,
    ) -> Result<Self, ConfigError> {
        validate_component_name("backend", name)?;
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
            handler,
        })
    }

    /// Normalized backend name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared start-argument names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Self-select the declared subset of a merged argument map. Unknown
    /// keys are silently dropped: the orchestrator merges full-backend maps
    /// across composed members, so each member picks out its own share.
    fn filtered_args(&self, args: &ArgMap) -> ArgMap {
        args.iter()
            .filter(|(k, _)| self.params.iter().any(|p| p == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Lifecycle state of a composed backend instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    /// No member is running.
    Stopped,
    /// All members started successfully and have not been stopped.
    Running,
}

/// An ordered chain of backend specs treated as one lifecycle unit, bound
/// to a concrete variable set. Owned by a single execution; not shared.
#[derive(Debug, Clone)]
pub struct ComposedBackend {
    members: Vec<Arc<BackendSpec>>,
    variables: VariableSet,
    state: BackendState,
}

impl ComposedBackend {
    /// Bind one or more backend specs with the variables that drive them.
    pub fn new(members: Vec<Arc<BackendSpec>>, variables: VariableSet) -> Self {
        Self {
            members,
            variables,
            state: BackendState::Stopped,
        }
    }

    /// User-facing identity: member names joined by `/` in declaration order.
    pub fn path(&self) -> String {
        self.member_names().join("/")
    }

    /// SQL-safe rendering of the path (`/` → `_b_`).
    pub fn path_sql(&self) -> String {
        self.member_names().join("_b_")
    }

    /// Filesystem-safe rendering of the path (`/` → `-`).
    pub fn path_out(&self) -> String {
        self.member_names().join("-")
    }

    /// Convert a user-facing `a/b` path to its SQL rendering.
    pub fn path_to_sql(path: &str) -> String {
        path.split('/').collect::<Vec<_>>().join("_b_")
    }

    /// Convert a user-facing `a/b` path to its filesystem rendering.
    pub fn path_to_out(path: &str) -> String {
        path.split('/').collect::<Vec<_>>().join("-")
    }

    /// Convert a filesystem `a-b` rendering back to the user-facing path.
    pub fn out_to_path(out: &str) -> String {
        out.split('-').collect::<Vec<_>>().join("/")
    }

    /// Convert a filesystem `a-b` rendering to the SQL rendering.
    pub fn out_to_sql(out: &str) -> String {
        out.split('-').collect::<Vec<_>>().join("_b_")
    }

    fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Member specs in declaration order.
    pub fn members(&self) -> &[Arc<BackendSpec>] {
        &self.members
    }

    /// The bound variable set.
    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BackendState {
        self.state
    }

    /// Start every member in declaration order, forwarding to each only its
    /// declared argument subset.
    ///
    /// A member failure aborts the chain immediately: already-started
    /// members are not unwound (backends acquiring partial resources are
    /// expected to self-clean in their own `start`), and the composed
    /// instance stays STOPPED.
    pub fn start(&mut self, args: &ArgMap) -> Result<(), RunError> {
        for member in &self.members {
            member
                .handler
                .start(&member.filtered_args(args))
                .map_err(|source| RunError::BackendStart {
                    backend: member.name().to_string(),
                    source,
                })?;
        }
        self.state = BackendState::Running;
        Ok(())
    }

    /// Stop every member in exact reverse declaration order.
    ///
    /// Best-effort: each member's stop is attempted even if an earlier one
    /// failed; the first failure is returned. The instance is considered
    /// STOPPED afterwards either way.
    pub fn stop(&mut self) -> Result<(), RunError> {
        let mut first_failure = None;
        for member in self.members.iter().rev() {
            if let Err(source) = member.handler.stop() {
                first_failure.get_or_insert(RunError::BackendStop {
                    backend: member.name().to_string(),
                    source,
                });
            }
        }
        self.state = BackendState::Stopped;
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::sync::Mutex;

    /// Stub handler appending every call to a shared journal.
    struct Probe {
        label: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
        fail_stop: bool,
    }

    impl BackendHandler for Probe {
        fn start(&self, args: &ArgMap) -> Result<(), BoxError> {
            let keys: Vec<_> = args.keys().cloned().collect();
            self.journal
                .lock()
                .unwrap()
                .push(format!("start:{}[{}]", self.label, keys.join(",")));
            if self.fail_start {
                return Err("boom".into());
            }
            Ok(())
        }

        fn stop(&self) -> Result<(), BoxError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("stop:{}", self.label));
            if self.fail_stop {
                return Err("boom".into());
            }
            Ok(())
        }
    }

    fn spec(
        label: &'static str,
        params: &[&str],
        journal: &Arc<Mutex<Vec<String>>>,
        fail_start: bool,
        fail_stop: bool,
    ) -> Arc<BackendSpec> {
        Arc::new(
            BackendSpec::new(
                label,
                params.iter().map(|s| s.to_string()).collect(),
                Arc::new(Probe {
                    label,
                    journal: Arc::clone(journal),
                    fail_start,
                    fail_stop,
                }),
            )
            .unwrap(),
        )
    }

    fn args(pairs: &[(&str, i64)]) -> ArgMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn start_forward_stop_reverse() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let a = spec("a", &[], &journal, false, false);
        let b = spec("b", &[], &journal, false, false);
        let mut composed = ComposedBackend::new(vec![a, b], VariableSet::empty());

        composed.start(&ArgMap::new()).unwrap();
        assert_eq!(composed.state(), BackendState::Running);
        composed.stop().unwrap();
        assert_eq!(composed.state(), BackendState::Stopped);

        let calls = journal.lock().unwrap().clone();
        assert_eq!(calls, vec!["start:a[]", "start:b[]", "stop:b", "stop:a"]);
    }

    #[test]
    fn members_receive_only_declared_args() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let a = spec("a", &["port"], &journal, false, false);
        let b = spec("b", &["threads"], &journal, false, false);
        let mut composed = ComposedBackend::new(vec![a, b], VariableSet::empty());

        composed
            .start(&args(&[("port", 8080), ("threads", 4), ("junk", 1)]))
            .unwrap();

        let calls = journal.lock().unwrap().clone();
        assert_eq!(calls, vec!["start:a[port]", "start:b[threads]"]);
    }

    #[test]
    fn failed_member_start_aborts_chain_without_unwind() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let a = spec("a", &[], &journal, false, false);
        let b = spec("b", &[], &journal, true, false);
        let c = spec("c", &[], &journal, false, false);
        let mut composed = ComposedBackend::new(vec![a, b, c], VariableSet::empty());

        let err = composed.start(&ArgMap::new()).unwrap_err();
        assert!(matches!(err, RunError::BackendStart { ref backend, .. } if backend == "b"));
        assert_eq!(composed.state(), BackendState::Stopped);

        // c is never reached and nothing is stopped on the way out.
        let calls = journal.lock().unwrap().clone();
        assert_eq!(calls, vec!["start:a[]", "start:b[]"]);
    }

    #[test]
    fn stop_attempts_every_member_despite_failure() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let a = spec("a", &[], &journal, false, false);
        let b = spec("b", &[], &journal, false, true);
        let c = spec("c", &[], &journal, false, false);
        let mut composed = ComposedBackend::new(vec![a, b, c], VariableSet::empty());

        composed.start(&ArgMap::new()).unwrap();
        let err = composed.stop().unwrap_err();
        assert!(matches!(err, RunError::BackendStop { ref backend, .. } if backend == "b"));
        assert_eq!(composed.state(), BackendState::Stopped);

        let calls = journal.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec!["start:a[]", "start:b[]", "start:c[]", "stop:c", "stop:b", "stop:a"]
        );
    }

    #[test]
    fn path_renderings() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let a = spec("alpha", &[], &journal, false, false);
        let b = spec("beta", &[], &journal, false, false);
        let composed = ComposedBackend::new(vec![a, b], VariableSet::empty());

        assert_eq!(composed.path(), "alpha/beta");
        assert_eq!(composed.path_sql(), "alpha_b_beta");
        assert_eq!(composed.path_out(), "alpha-beta");

        assert_eq!(ComposedBackend::path_to_sql("alpha/beta"), "alpha_b_beta");
        assert_eq!(ComposedBackend::path_to_out("alpha/beta"), "alpha-beta");
        assert_eq!(ComposedBackend::out_to_path("alpha-beta"), "alpha/beta");
        assert_eq!(ComposedBackend::out_to_sql("alpha-beta"), "alpha_b_beta");
    }

    #[test]
    fn reserved_param_names_are_rejected() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let probe = Arc::new(Probe {
            label: "x",
            journal,
            fail_start: false,
            fail_stop: false,
        });
        let err = BackendSpec::new("x", vec!["_iter".to_string()], probe);
        assert!(matches!(err, Err(ConfigError::ReservedName { .. })));
    }

    #[test]
    fn member_names_with_separator_characters_are_rejected() {
        // A name like "my-srv" would render path_out() as "my-srv" and
        // decode back as the two-member path "my/srv"; all three separator
        // characters must be refused at declaration time.
        for bad in ["my-srv", "my_srv", "my/srv", ""] {
            let journal = Arc::new(Mutex::new(Vec::new()));
            let err = BackendSpec::new(
                bad,
                vec![],
                Arc::new(Probe {
                    label: "bad",
                    journal,
                    fail_start: false,
                    fail_stop: false,
                }),
            );
            assert!(
                matches!(err, Err(ConfigError::InvalidName { kind: "backend", .. })),
                "'{bad}' was accepted"
            );
        }
    }

    #[test]
    fn spec_names_are_normalized_lowercase() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let s = spec("a", &[], &journal, false, false);
        assert_eq!(s.name(), "a");
        let upper = BackendSpec::new(
            "MyBackend",
            vec![],
            Arc::new(Probe {
                label: "u",
                journal,
                fail_start: false,
                fail_stop: false,
            }),
        )
        .unwrap();
        assert_eq!(upper.name(), "mybackend");
    }
}
