//! Raw-output parser contract and the two shipped implementations.
//!
//! The engine only requires a pure function from a raw output location to
//! a partial record (the parser's own fields; the orchestrator merges in
//! argument and reserved fields). Returning `None` means "no record for
//! this run" and is not an error.

use crate::error::{BoxError, ConfigError, RunError};
use crate::record::Record;
use crate::value::Value;
use regex::Regex;
use std::path::Path;

/// A parser of one run's raw output.
pub trait OutputParser: Send + Sync {
    /// The output field names this parser can contribute to a record.
    fn fields(&self) -> Vec<String>;

    /// Whether `name` is one of this parser's output fields.
    fn param_exists(&self, name: &str) -> bool {
        self.fields().iter().any(|f| f == name)
    }

    /// Parse the raw output at `path` into the parser-owned record fields.
    fn parse(&self, path: &Path) -> Result<Option<Record>, RunError>;
}

type LineExtractor = Box<dyn Fn(&str) -> Vec<Value> + Send + Sync>;
type FileExtractor = Box<dyn Fn(&Path) -> Result<Option<Vec<Value>>, BoxError> + Send + Sync>;

struct MatchRule {
    pattern: Regex,
    names: Vec<String>,
    extract: LineExtractor,
}

/// Line-oriented parser: each rule pairs a regex with the output names its
/// extractor binds. Every matching line re-binds the rule's names, so the
/// last match wins.
#[derive(Default)]
pub struct MatchParser {
    rules: Vec<MatchRule>,
}

impl MatchParser {
    /// Parser with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. The extractor must return exactly one value per name;
    /// a mismatch at parse time fails that run's parse.
    pub fn rule<F>(mut self, pattern: Regex, names: &[&str], extract: F) -> Self
    where
        F: Fn(&str) -> Vec<Value> + Send + Sync + 'static,
    {
        self.rules.push(MatchRule {
            pattern,
            names: names.iter().map(|s| s.to_string()).collect(),
            extract: Box::new(extract),
        });
        self
    }
}

impl OutputParser for MatchParser {
    fn fields(&self) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|r| r.names.iter().cloned())
            .collect()
    }

    fn parse(&self, path: &Path) -> Result<Option<Record>, RunError> {
        let body = std::fs::read_to_string(path).map_err(|e| RunError::Parser {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let mut record = Record::new();
        for line in body.lines() {
            for rule in &self.rules {
                if !rule.pattern.is_match(line) {
                    continue;
                }
                let values = (rule.extract)(line);
                if values.len() != rule.names.len() {
                    return Err(RunError::Parser {
                        path: path.display().to_string(),
                        source: Box::new(ConfigError::ParserArity {
                            rule: rule.pattern.as_str().to_string(),
                            expected: rule.names.len(),
                            actual: values.len(),
                        }),
                    });
                }
                for (name, value) in rule.names.iter().zip(values) {
                    record.set(name.clone(), value);
                }
            }
        }
        Ok(Some(record))
    }
}

/// Whole-file parser: a declared name list plus a user function that
/// produces one value per name (or `None` for "no record").
pub struct FileParser {
    names: Vec<String>,
    extract: FileExtractor,
}

impl FileParser {
    /// Build from declared names and an extractor.
    pub fn new<F>(names: &[&str], extract: F) -> Self
    where
        F: Fn(&Path) -> Result<Option<Vec<Value>>, BoxError> + Send + Sync + 'static,
    {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            extract: Box::new(extract),
        }
    }
}

impl OutputParser for FileParser {
    fn fields(&self) -> Vec<String> {
        self.names.clone()
    }

    fn parse(&self, path: &Path) -> Result<Option<Record>, RunError> {
        let values = (self.extract)(path).map_err(|source| RunError::Parser {
            path: path.display().to_string(),
            source,
        })?;

        let Some(values) = values else {
            return Ok(None);
        };

        if values.len() != self.names.len() {
            return Err(RunError::Parser {
                path: path.display().to_string(),
                source: Box::new(ConfigError::ParserArity {
                    rule: "file parser".to_string(),
                    expected: self.names.len(),
                    actual: values.len(),
                }),
            });
        }

        let mut record = Record::new();
        for (name, value) in self.names.iter().zip(values) {
            record.set(name.clone(), value);
        }
        Ok(Some(record))
    }
}
