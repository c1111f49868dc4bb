//! The plan driver: an ordered list of executions run as one batch.

use crate::execution::Execution;
use anyhow::Context;
use tracing::info;

/// An ordered batch of executions, driven clean-all / execute-all /
/// parse-all.
///
/// Per-cell failures inside an execution never abort the plan (the
/// orchestrator isolates them); configuration and storage-fatal errors do.
#[derive(Default)]
pub struct Plan {
    executions: Vec<Execution>,
}

impl Plan {
    /// Empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an execution. Order is preserved for every phase.
    pub fn add(&mut self, execution: Execution) -> &mut Self {
        self.executions.push(execution);
        self
    }

    /// The planned executions, in order.
    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    /// Clean every execution, run every execution, parse every execution.
    pub fn run(&mut self) -> anyhow::Result<()> {
        for execution in &mut self.executions {
            execution
                .clean()
                .with_context(|| format!("cleaning storage for '{}'", execution.name()))?;
        }
        for execution in &mut self.executions {
            info!(execution = execution.name(), "executing");
            execution
                .execute()
                .with_context(|| format!("executing '{}'", execution.name()))?;
        }
        for execution in &mut self.executions {
            execution
                .parse()
                .with_context(|| format!("parsing results of '{}'", execution.name()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use gridbench_core::{
        ArgMap, BenchmarkBinding, BenchmarkRunner, BenchmarkSpec, BoxError, FileParser, Value,
        VariableSet,
    };
    use gridbench_store::StorageTarget;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Touch;
    impl BenchmarkRunner for Touch {
        fn run(&self, _: Option<&str>, out_path: &Path, _: &ArgMap) -> Result<(), BoxError> {
            std::fs::write(out_path, "done\n")?;
            Ok(())
        }
    }

    fn execution(dir: &TempDir, name: &str) -> Execution {
        let spec = Arc::new(BenchmarkSpec::new("touch", vec![], Arc::new(Touch)).unwrap());
        let binding = BenchmarkBinding::new(spec, VariableSet::empty(), 2).unwrap();
        let parser = FileParser::new(&["ok"], |_| Ok(Some(vec![Value::Bool(true)])));
        Execution::new(
            name,
            binding,
            vec![],
            Some(Box::new(parser)),
            StorageTarget::from_path(dir.path().join(name)),
            &GridConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn run_drives_every_execution_through_all_phases() {
        let dir = TempDir::new().unwrap();
        let mut plan = Plan::new();
        plan.add(execution(&dir, "first"))
            .add(execution(&dir, "second"));

        plan.run().unwrap();

        for execution in plan.executions() {
            assert_eq!(execution.records().len(), 2);
        }
    }

    #[test]
    fn unmanaged_storage_aborts_the_plan() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("first")).unwrap();
        std::fs::write(dir.path().join("first/keep.txt"), "foreign").unwrap();

        let mut plan = Plan::new();
        plan.add(execution(&dir, "first"));
        assert!(plan.run().is_err());
    }
}
