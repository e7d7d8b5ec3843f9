//! Required-field and range validation shared by every route.
//!
//! The handlers this replaces each re-implemented the same check; this
//! is the one reusable version. A field counts as missing when it is
//! absent, `null`, or an empty/whitespace string — callers get the
//! full list back, never just the first offender.

use serde_json::Value;

/// Outcome of a required-field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub missing: Vec<String>,
}

impl FieldCheck {
    pub fn ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check that every named field is present and non-empty on `body`.
pub fn require(body: &Value, required: &[&str]) -> FieldCheck {
    let missing = required
        .iter()
        .filter(|name| !is_present(body.get(**name)))
        .map(|name| name.to_string())
        .collect();
    FieldCheck { missing }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

/// Check that an integer setting lies within `[min, max]`.
///
/// Returns the offending value for the 400 body when out of bounds.
pub fn check_range(value: i64, min: i64, max: i64) -> std::result::Result<(), i64> {
    if value < min || value > max {
        Err(value)
    } else {
        Ok(())
    }
}
