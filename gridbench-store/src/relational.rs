//! SQLite-backed sink: one row per run, one table per
//! (execution, composed-backend-path) pair.
//!
//! The connection is reopened for every operation. Writes happen at most
//! every few seconds in this engine, and a short-lived handle sidesteps
//! cross-process file-locking hazards entirely.

use crate::error::StoreError;
use crate::schema::{StorageSchema, TableSchema};
use crate::sink::StorageSink;
use gridbench_core::{ArgMap, ComposedBackend, Record, Restriction, Value};
use rusqlite::{params_from_iter, Connection};
use std::path::PathBuf;
use tracing::debug;

/// SQLite storage sink with a schema derived from registered components.
pub struct RelationalSink {
    path: PathBuf,
    schema: StorageSchema,
}

impl RelationalSink {
    /// Build a sink over the database at `path`.
    pub fn new(path: PathBuf, schema: StorageSchema) -> Self {
        Self { path, schema }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    /// The table matching a record's `_execution_name`/`_workload`/
    /// `_backend` triplet, if any.
    fn table_for(&self, record: &Record) -> Option<&TableSchema> {
        let execution = record.get("_execution_name")?.render();
        let workload = record.get("_workload")?.render();
        if execution != self.schema.execution || workload != self.schema.workload {
            return None;
        }

        let backend_sql = record
            .get("_backend")
            .map(|v| ComposedBackend::path_to_sql(&v.render()));

        self.schema
            .tables
            .iter()
            .find(|table| table.backend_path_sql == backend_sql)
    }
}

impl StorageSink for RelationalSink {
    /// Create every derived table idempotently and reset its rows.
    ///
    /// The schema is assumed stable across reruns of the same plan, so an
    /// existing table is emptied rather than recreated.
    fn clean(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        for table in &self.schema.tables {
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|c| format!("\"{}\" TEXT", c))
                .collect();
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
                    table.name,
                    columns.join(", ")
                ),
                [],
            )?;
            conn.execute(&format!("DELETE FROM \"{}\"", table.name), [])?;
            debug!(table = %table.name, columns = table.columns.len(), "table ready");
        }
        Ok(())
    }

    /// Insert one row, populating every declared column: from the record,
    /// else the backend args, else the benchmark args, else empty string.
    fn write(
        &self,
        _identity: &str,
        record: &Record,
        backend_args: Option<&ArgMap>,
        bench_args: &ArgMap,
    ) -> Result<(), StoreError> {
        let table = self.table_for(record).ok_or_else(|| {
            let field = |name: &str| {
                record
                    .get(name)
                    .map(|v| v.render())
                    .unwrap_or_else(|| "<none>".to_string())
            };
            StoreError::NoMatchingTable {
                execution: field("_execution_name"),
                workload: field("_workload"),
                backend: field("_backend"),
            }
        })?;

        let values: Vec<String> = table
            .columns
            .iter()
            .map(|col| {
                if col == "_backend" {
                    // Stored in the SQL rendering, matching the table name.
                    return record
                        .get(col)
                        .map(|v| ComposedBackend::path_to_sql(&v.render()))
                        .unwrap_or_default();
                }
                record
                    .get(col)
                    .map(|v| v.render())
                    .or_else(|| backend_args.and_then(|a| a.get(col)).map(|v| v.render()))
                    .or_else(|| bench_args.get(col).map(|v| v.render()))
                    .unwrap_or_default()
            })
            .collect();

        let column_list: Vec<String> = table.columns.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();

        let conn = self.connect()?;
        conn.execute(
            &format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                table.name,
                column_list.join(", "),
                placeholders.join(", ")
            ),
            params_from_iter(values.iter()),
        )?;
        Ok(())
    }

    /// Equality-restricted select across every table whose column set can
    /// satisfy the restriction. Zero total rows is a hard error: an empty
    /// relational result always means the restriction was mis-authored.
    fn read_all(&self, restriction: &Restriction) -> Result<Vec<Record>, StoreError> {
        let conn = self.connect()?;
        let mut records = Vec::new();

        for table in &self.schema.tables {
            if !restriction.keys().all(|k| table.columns.contains(k)) {
                continue;
            }

            let mut sql = format!(
                "SELECT {} FROM \"{}\"",
                table
                    .columns
                    .iter()
                    .map(|c| format!("\"{}\"", c))
                    .collect::<Vec<_>>()
                    .join(", "),
                table.name
            );
            let mut params = Vec::new();
            if !restriction.is_empty() {
                let clauses: Vec<String> = restriction
                    .keys()
                    .enumerate()
                    .map(|(i, k)| format!("\"{}\" = ?{}", k, i + 1))
                    .collect();
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
                params = restriction
                    .iter()
                    .map(|(key, value)| {
                        if key == "_backend" {
                            ComposedBackend::path_to_sql(value)
                        } else {
                            value.clone()
                        }
                    })
                    .collect();
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                let mut record = Record::new();
                for (i, col) in table.columns.iter().enumerate() {
                    let text: String = row.get(i)?;
                    if col == "_backend" {
                        if !text.is_empty() {
                            // Surface the user-facing path rendering.
                            let path = text.replace("_b_", "/");
                            record.set(col.clone(), Value::Str(path));
                        }
                    } else {
                        record.set(col.clone(), Value::parse_lossy(&text));
                    }
                }
                Ok(record)
            })?;
            for row in rows {
                records.push(row?);
            }
        }

        if records.is_empty() {
            return Err(StoreError::EmptyResult {
                restriction: format!("{:?}", restriction),
            });
        }
        Ok(records)
    }
}
