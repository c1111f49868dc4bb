//! The structured result of one benchmark run, and the restriction filter
//! used to query persisted result sets.

use crate::value::Value;
use std::collections::BTreeMap;

/// Equality filter over persisted records: field name → expected canonical
/// string. Keys absent from a record do not constrain it.
pub type Restriction = BTreeMap<String, String>;

/// One structured result row for a single run.
///
/// Always carries the reserved fields `_execution_name`, `_workload`,
/// `_iter`, and `_backend` (the latter only when a backend is attached),
/// alongside benchmark args, backend args, and parser outputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Fetch a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate fields in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge every field of `other` into this record, overwriting clashes.
    pub fn merge(&mut self, other: &Record) {
        for (k, v) in &other.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Whether every restriction key present in this record matches by
    /// canonical-string equality. Restriction keys the record lacks are
    /// non-constraining.
    pub fn matches(&self, restriction: &Restriction) -> bool {
        restriction.iter().all(|(key, expected)| {
            self.fields
                .get(key)
                .map(|v| v.matches_str(expected))
                .unwrap_or(true)
        })
    }

    /// Serialize as newline-delimited `key=value` lines, keys sorted.
    ///
    /// Values must not contain `=` or newlines; the format does no escaping.
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push('=');
            out.push_str(&value.render());
            out.push('\n');
        }
        out
    }

    /// Deserialize from `key=value` lines, splitting on the first `=`.
    /// Blank lines are skipped; lines without `=` are ignored.
    pub fn from_lines(body: &str) -> Record {
        let mut record = Record::new();
        for line in body.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                record.set(key, Value::parse_lossy(value));
            }
        }
        record
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}
