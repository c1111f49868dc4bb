//! Scalar cell type for argument maps and records.
//!
//! Every value the engine sweeps, forwards, or persists is one of these
//! four scalars. The `Display` rendering is canonical: it is what lands in
//! filenames, flat-file bodies, and SQL text cells, and it is the string
//! the restriction filter compares against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar benchmark/backend argument or parsed result value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Free-form string
    Str(String),
}

impl Value {
    /// Recover the narrowest variant from a persisted canonical rendering.
    ///
    /// Used when reading flat-file bodies and relational text cells back;
    /// anything that is not an integer, float, or bool stays a string.
    pub fn parse_lossy(s: &str) -> Value {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
        match s {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Str(s.to_string()),
        }
    }

    /// Canonical string rendering, identical to `Display`.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Whether two values agree under canonical-string comparison.
    ///
    /// Restrictions are authored as strings, so `Int(1)` matches `"1"`.
    pub fn matches_str(&self, other: &str) -> bool {
        self.render() == other
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            // Whole floats keep an explicit fractional part so the
            // rendering re-parses as a float, not an integer.
            Value::Float(x) if x.is_finite() && x.trunc() == *x => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_round_trips_through_parse_lossy() {
        for v in [
            Value::Int(42),
            Value::Int(-3),
            Value::Float(0.5),
            Value::Float(7.0),
            Value::Float(-2.0),
            Value::Bool(true),
            Value::Str("ext4".to_string()),
        ] {
            assert_eq!(Value::parse_lossy(&v.render()), v);
        }
    }

    #[test]
    fn whole_floats_render_with_a_fractional_part() {
        assert_eq!(Value::Float(7.0).render(), "7.0");
        assert_eq!(Value::Float(-2.0).render(), "-2.0");
        assert_eq!(Value::Float(7.25).render(), "7.25");
        assert!(Value::Float(7.0).matches_str("7.0"));
        assert!(!Value::Float(7.0).matches_str("7"));
    }

    #[test]
    fn integers_win_over_floats() {
        assert_eq!(Value::parse_lossy("7"), Value::Int(7));
        assert_eq!(Value::parse_lossy("7.0"), Value::Float(7.0));
    }

    #[test]
    fn restriction_comparison_is_string_based() {
        assert!(Value::Int(1).matches_str("1"));
        assert!(!Value::Int(1).matches_str("1.0"));
        assert!(Value::Str("a/b".to_string()).matches_str("a/b"));
    }
}
