use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::num::FpCategory;
use thiserror::Error;

/// Code carried by every failed envelope.
pub const FAILURE_CODE: i64 = -1;

/// Code the gateway assigns to envelopes it synthesizes for successful
/// responses (binary streams, empty bodies).
pub const SUCCESS_CODE: i64 = 1;

/// Code the gateway assigns to binary-stream responses.
pub const BINARY_SUCCESS_CODE: i64 = SUCCESS_CODE;

/// Payload of an [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeData {
    /// Parsed JSON payload (JSON response path and failures)
    Json(Value),
    /// Raw response body (`arraybuffer` / `blob` response types)
    Binary(Bytes),
}

impl Serialize for EnvelopeData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            Self::Binary(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}

/// The normalized `{ code, msg, data }` shape every gateway call resolves to.
///
/// An envelope parsed from a JSON response serializes back to exactly the
/// backend's object: `msg` and `data` keep their JSON form (an explicit
/// `null` is not the same as a missing field) and any other fields are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    pub code: i64,
    pub msg: Option<Value>,
    pub data: Option<EnvelopeData>,
    pub extra: Map<String, Value>,
}

/// Why a response body could not be read as an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("response envelope has no integer `code` field")]
    MissingCode,
}

impl Envelope {
    /// Failure envelope: `{code: -1, msg, data: {}}`.
    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            code: FAILURE_CODE,
            msg: Some(Value::String(msg.into())),
            data: Some(EnvelopeData::Json(Value::Object(Map::new()))),
            extra: Map::new(),
        }
    }

    /// Binary-stream envelope: `{code: 1, data: <raw body>}`.
    #[must_use]
    pub fn binary(body: Bytes) -> Self {
        Self {
            code: BINARY_SUCCESS_CODE,
            msg: None,
            data: Some(EnvelopeData::Binary(body)),
            extra: Map::new(),
        }
    }

    /// Success without payload (`{code: 1}`), for 2xx responses with an
    /// empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            code: SUCCESS_CODE,
            ..Self::default()
        }
    }

    /// Parse a response body.
    ///
    /// # Errors
    /// Returns [`EnvelopeError`] if the body is not JSON, not an object, or
    /// lacks an integer `code`.
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Build an envelope from an already-parsed JSON value.
    ///
    /// # Errors
    /// Returns [`EnvelopeError`] if `value` is not an object or lacks an
    /// integer `code`.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut object) = value else {
            return Err(EnvelopeError::NotAnObject);
        };

        let code = object
            .remove("code")
            .as_ref()
            .and_then(integral_code)
            .ok_or(EnvelopeError::MissingCode)?;

        Ok(Self {
            code,
            msg: object.remove("msg"),
            data: object.remove("data").map(EnvelopeData::Json),
            extra: object,
        })
    }

    /// Whether this envelope reports a failure (`code == -1`).
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.code == FAILURE_CODE
    }

    /// `msg` when the backend sent it as a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.msg.as_ref().and_then(Value::as_str)
    }

    /// Text to surface for a failure.
    ///
    /// `None` unless `code == -1` and `msg` is truthy: `null`, `false`, `0`
    /// and `""` stay silent. Non-string values are rendered as JSON text.
    #[must_use]
    pub fn failure_message(&self) -> Option<Cow<'_, str>> {
        if !self.is_failure() {
            return None;
        }
        match self.msg.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(Cow::Borrowed(text)),
            Value::Number(number)
                if number
                    .as_f64()
                    .is_some_and(|n| n.classify() == FpCategory::Zero) =>
            {
                None
            }
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    /// JSON payload; `None` when `data` is missing or binary.
    #[must_use]
    pub fn json_data(&self) -> Option<&Value> {
        match &self.data {
            Some(EnvelopeData::Json(value)) => Some(value),
            Some(EnvelopeData::Binary(_)) | None => None,
        }
    }

    /// Raw payload, `None` for JSON envelopes.
    #[must_use]
    pub fn binary_data(&self) -> Option<&Bytes> {
        match &self.data {
            Some(EnvelopeData::Binary(bytes)) => Some(bytes),
            Some(EnvelopeData::Json(_)) | None => None,
        }
    }

    /// Render as a JSON value. Binary payloads become an array of byte values.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("code", &self.code)?;
        if let Some(msg) = &self.msg {
            map.serialize_entry("msg", msg)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Largest float that still maps onto an exact integer.
const MAX_INTEGRAL_FLOAT: f64 = 9_007_199_254_740_992.0;

fn integral_code(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(code) = number.as_i64() {
        return Some(code);
    }
    // Some backends emit `1.0`
    let float = number.as_f64()?;
    if float.fract().abs() > f64::EPSILON || float.abs() > MAX_INTEGRAL_FLOAT {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let code = float as i64;
    Some(code)
}
