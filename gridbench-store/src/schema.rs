//! Relational schema derivation.
//!
//! One table per (execution, composed-backend-path) pair — or a single
//! table when the execution has no backend. The column set is the sorted
//! union of the fields every layer can contribute: backend member
//! parameters, benchmark parameters, parser output names, and the
//! engine's reserved fields.

use gridbench_core::{BenchmarkBinding, ComposedBackend, RESERVED_NAMES};
use std::collections::BTreeSet;

/// One derived table: name, optional backend path rendering, sorted columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name: `{execution}__{benchmark}` or
    /// `{execution}__{benchmark}__{path_sql}`.
    pub name: String,
    /// SQL rendering of the backend path this table serves, if any.
    pub backend_path_sql: Option<String>,
    /// Sorted column names, all text affinity.
    pub columns: Vec<String>,
}

/// The full derived schema for one execution's storage target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSchema {
    /// Execution name.
    pub execution: String,
    /// Benchmark (workload) name.
    pub workload: String,
    /// Derived tables, one per backend variant.
    pub tables: Vec<TableSchema>,
}

impl StorageSchema {
    /// Derive the schema from an execution's registered components.
    pub fn derive(
        execution: &str,
        benchmark: &BenchmarkBinding,
        backends: &[ComposedBackend],
        parser_fields: &[String],
    ) -> Self {
        let workload = benchmark.spec().name().to_string();

        let base_columns = |extra: &mut BTreeSet<String>| {
            for param in benchmark.spec().params() {
                extra.insert(param.clone());
            }
            for field in parser_fields {
                extra.insert(field.clone());
            }
            for reserved in RESERVED_NAMES {
                extra.insert(reserved.to_string());
            }
        };

        let tables = if backends.is_empty() {
            let mut columns = BTreeSet::new();
            base_columns(&mut columns);
            vec![TableSchema {
                name: format!("{}__{}", execution, workload),
                backend_path_sql: None,
                columns: columns.into_iter().collect(),
            }]
        } else {
            backends
                .iter()
                .map(|back| {
                    let mut columns = BTreeSet::new();
                    base_columns(&mut columns);
                    for member in back.members() {
                        for param in member.params() {
                            columns.insert(param.clone());
                        }
                    }
                    TableSchema {
                        name: format!("{}__{}__{}", execution, workload, back.path_sql()),
                        backend_path_sql: Some(back.path_sql()),
                        columns: columns.into_iter().collect(),
                    }
                })
                .collect()
        };

        Self {
            execution: execution.to_string(),
            workload,
            tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbench_core::{
        ArgMap, BackendHandler, BackendSpec, BenchmarkRunner, BenchmarkSpec, BoxError, VariableSet,
    };
    use std::path::Path;
    use std::sync::Arc;

    struct Noop;
    impl BenchmarkRunner for Noop {
        fn run(&self, _: Option<&str>, _: &Path, _: &ArgMap) -> Result<(), BoxError> {
            Ok(())
        }
    }
    impl BackendHandler for Noop {
        fn start(&self, _: &ArgMap) -> Result<(), BoxError> {
            Ok(())
        }
        fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn binding(params: &[&str]) -> BenchmarkBinding {
        let spec = Arc::new(
            BenchmarkSpec::new(
                "writes",
                params.iter().map(|s| s.to_string()).collect(),
                Arc::new(Noop),
            )
            .unwrap(),
        );
        BenchmarkBinding::new(spec, VariableSet::empty(), 1).unwrap()
    }

    fn backend(members: &[(&str, &[&str])]) -> ComposedBackend {
        let specs = members
            .iter()
            .map(|(name, params)| {
                Arc::new(
                    BackendSpec::new(
                        name,
                        params.iter().map(|s| s.to_string()).collect(),
                        Arc::new(Noop),
                    )
                    .unwrap(),
                )
            })
            .collect();
        ComposedBackend::new(specs, VariableSet::empty())
    }

    #[test]
    fn columns_are_sorted_union_with_reserved_fields() {
        let back = backend(&[("srv", &["port"]), ("cache", &["size"])]);
        let schema = StorageSchema::derive(
            "exec",
            &binding(&["x"]),
            &[back],
            &["latency".to_string()],
        );

        assert_eq!(schema.tables.len(), 1);
        let table = &schema.tables[0];
        assert_eq!(table.name, "exec__writes__srv_b_cache");
        assert_eq!(table.backend_path_sql.as_deref(), Some("srv_b_cache"));
        assert_eq!(
            table.columns,
            vec![
                "_backend",
                "_execution_name",
                "_iter",
                "_workload",
                "latency",
                "port",
                "size",
                "x"
            ]
        );
    }

    #[test]
    fn no_backend_yields_single_table_without_suffix() {
        let schema = StorageSchema::derive("exec", &binding(&["x"]), &[], &[]);
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].name, "exec__writes");
        assert_eq!(schema.tables[0].backend_path_sql, None);
    }

    #[test]
    fn one_table_per_backend_variant() {
        let schema = StorageSchema::derive(
            "exec",
            &binding(&[]),
            &[backend(&[("a", &[])]), backend(&[("b", &[])])],
            &[],
        );
        let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["exec__writes__a", "exec__writes__b"]);
    }
}
