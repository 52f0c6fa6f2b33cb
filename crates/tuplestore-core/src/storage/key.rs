use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::storage::error::StorageSystemError;

/// Ordered tuple of string segments addressing one stored value.
///
/// Every segment is a non-empty string. The empty tuple is a valid key of
/// arity zero. Backends fix the arity they accept, see
/// [`StoreBackend::key_length`](crate::storage::StoreBackend::key_length).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StoreKey(Vec<String>);

impl StoreKey {
    /// Build a key from its segments, rejecting empty segments.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        validate_segments(&segments)?;
        Ok(Self(segments))
    }

    /// The zero-arity key.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wrap decoded segments without validation.
    ///
    /// Decoding through a misconfigured template may yield empty segments;
    /// those keys must still be reportable so verification can show them.
    pub(crate) fn from_segments_unchecked(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Validate a dynamically typed key.
    ///
    /// Accepts an array of strings only. A bare string is rejected even
    /// though it is a sequence of characters, as is any element that is not
    /// a string (numbers, booleans, null, nested arrays or objects).
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::String(s) => {
                return Err(StorageSystemError::invalid_key(format!(
                    "a bare string ({s:?}) is not a key, wrap it in a sequence"
                ))
                .into());
            }
            other => {
                return Err(StorageSystemError::invalid_key(format!(
                    "expected a sequence of strings, got {}",
                    value_kind(other)
                ))
                .into());
            }
        };

        let mut segments = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => segments.push(s.clone()),
                other => {
                    return Err(StorageSystemError::invalid_key(format!(
                        "segment {position} is {}, not a string",
                        value_kind(other)
                    ))
                    .into());
                }
            }
        }
        Self::new(segments)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_segments(self) -> Vec<String> {
        self.0
    }

    /// Join the segments into a single scalar string.
    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

/// Check that `value` is an acceptable key without keeping it.
pub fn validate_key_value(value: &Value) -> Result<()> {
    StoreKey::from_value(value).map(|_| ())
}

fn validate_segments(segments: &[String]) -> Result<()> {
    if let Some(position) = segments.iter().position(String::is_empty) {
        return Err(
            StorageSystemError::invalid_key(format!("segment {position} is an empty string")).into(),
        );
    }
    Ok(())
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

impl TryFrom<Vec<String>> for StoreKey {
    type Error = crate::error::Error;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Self::new(segments)
    }
}

impl TryFrom<&[&str]> for StoreKey {
    type Error = crate::error::Error;

    fn try_from(segments: &[&str]) -> Result<Self> {
        Self::new(segments.iter().copied())
    }
}

impl<'a> IntoIterator for &'a StoreKey {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Renders like a tuple: ("A", "B")
impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{segment:?}")?;
        }
        write!(f, ")")
    }
}
