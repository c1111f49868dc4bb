//! Declarative constants + ranges, expanded into a concrete cross product.
//!
//! A `VariableSet` is declared once per backend/benchmark binding and is
//! immutable afterwards. `expand()` walks the varying ranges like an
//! odometer in declaration order (leftmost varies slowest), which mirrors
//! nested-loop semantics and gives the naming codec a stable positional
//! encoding.

use crate::error::ConfigError;
use crate::value::Value;
use std::collections::BTreeMap;

/// Field names the engine itself owns; user variables may not shadow them.
pub const RESERVED_NAMES: [&str; 4] = ["_backend", "_execution_name", "_iter", "_workload"];

/// One fully merged argument assignment for a single run.
pub type ArgMap = BTreeMap<String, Value>;

/// Constants plus ordered varying ranges for one benchmark or backend.
#[derive(Debug, Clone)]
pub struct VariableSet {
    constants: Vec<(String, Value)>,
    varying: Vec<(String, Vec<Value>)>,
}

impl VariableSet {
    /// Build a variable set, rejecting reserved names, names declared both
    /// constant and varying, and empty ranges.
    pub fn new(
        constants: Vec<(String, Value)>,
        varying: Vec<(String, Vec<Value>)>,
    ) -> Result<Self, ConfigError> {
        for name in constants
            .iter()
            .map(|(n, _)| n)
            .chain(varying.iter().map(|(n, _)| n))
        {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::ReservedName { name: name.clone() });
            }
        }

        for (name, values) in &varying {
            if values.is_empty() {
                return Err(ConfigError::EmptyRange { name: name.clone() });
            }
            if constants.iter().any(|(c, _)| c == name) {
                return Err(ConfigError::NameClash { name: name.clone() });
            }
        }

        Ok(Self { constants, varying })
    }

    /// A set with no constants and no varying names; expands to one empty map.
    pub fn empty() -> Self {
        Self {
            constants: Vec::new(),
            varying: Vec::new(),
        }
    }

    /// Expand into every argument assignment, in deterministic order.
    ///
    /// The leftmost declared varying name changes slowest. With no varying
    /// names the result is a single map holding just the constants.
    pub fn expand(&self) -> Vec<ArgMap> {
        let total: usize = self.varying.iter().map(|(_, vs)| vs.len()).product();
        let mut out = Vec::with_capacity(total);

        // Mixed-radix counter over the varying ranges.
        let mut indices = vec![0usize; self.varying.len()];
        loop {
            let mut args: ArgMap = self
                .constants
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (slot, (name, values)) in indices.iter().zip(self.varying.iter()) {
                args.insert(name.clone(), values[*slot].clone());
            }
            out.push(args);

            // Increment from the rightmost digit.
            let mut pos = self.varying.len();
            loop {
                if pos == 0 {
                    return out;
                }
                pos -= 1;
                indices[pos] += 1;
                if indices[pos] < self.varying[pos].1.len() {
                    break;
                }
                indices[pos] = 0;
            }
        }
    }

    /// Ordered names of the varying variables.
    ///
    /// This list (not the values) is what the naming codec persists for
    /// positional decoding.
    pub fn y_names(&self) -> Vec<&str> {
        self.varying.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Names of the constants.
    pub fn const_names(&self) -> Vec<&str> {
        self.constants.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Whether `name` is declared, either as a constant or a varying name.
    pub fn param_exists(&self, name: &str) -> bool {
        self.constants.iter().any(|(n, _)| n == name)
            || self.varying.iter().any(|(n, _)| n == name)
    }
}
