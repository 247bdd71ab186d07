//! Small helpers for the loosely-typed JSON the admin backend exchanges.

use serde_json::{Map, Value};
use std::fmt;

/// JSON type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub fn value_type(value: &Value) -> ValueType {
    match value {
        Value::Null => ValueType::Null,
        Value::Bool(_) => ValueType::Boolean,
        Value::Number(_) => ValueType::Number,
        Value::String(_) => ValueType::String,
        Value::Array(_) => ValueType::Array,
        Value::Object(_) => ValueType::Object,
    }
}

/// Parse `input`, falling back to `default` (with a warning) when it is not
/// valid JSON.
#[must_use]
pub fn safe_json_parse(input: &str, default: Value) -> Value {
    match serde_json::from_str(input) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse JSON, using default");
            default
        }
    }
}

/// Options for [`modify_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Skip patch entries whose value is `null`
    pub filter_null: bool,
    /// Replace object values wholesale; when `false`, object-valued keys are
    /// merged recursively under the same options
    pub overwrite_objects: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            filter_null: false,
            overwrite_objects: true,
        }
    }
}

/// Copy values from `patch` into `target`, touching only keys `target`
/// already has. New keys in `patch` are ignored.
pub fn modify_data(target: &mut Map<String, Value>, patch: &Map<String, Value>, options: MergeOptions) {
    for (key, value) in patch {
        let Some(slot) = target.get_mut(key) else {
            continue;
        };
        if options.filter_null && value.is_null() {
            continue;
        }
        match (slot, value) {
            (Value::Object(nested), Value::Object(nested_patch)) if !options.overwrite_objects => {
                modify_data(nested, nested_patch, options);
            }
            (slot, value) => *slot = value.clone(),
        }
    }
}

/// Whether `path` is an external link (`http:`, `https:`, `mailto:`, `tel:`)
/// rather than an in-app route.
#[must_use]
pub fn is_external(path: &str) -> bool {
    const SCHEMES: [&str; 4] = ["http:", "https:", "mailto:", "tel:"];
    SCHEMES.iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
