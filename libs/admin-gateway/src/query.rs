use serde_json::Value;

/// Flatten a `GET` payload into query pairs.
///
/// Only a top-level object produces parameters:
/// - strings are sent as-is, numbers and booleans in their JSON spelling
/// - `null` entries are skipped
/// - arrays become repeated `key[]` pairs
/// - nested objects are sent as JSON text
///
/// Any other payload (null, scalar, array) yields no parameters.
pub(crate) fn flatten_query(data: &Value) -> Vec<(String, String)> {
    let Value::Object(object) = data else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let array_key = format!("{key}[]");
                pairs.extend(
                    items
                        .iter()
                        .filter_map(scalar_text)
                        .map(|text| (array_key.clone(), text)),
                );
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}
