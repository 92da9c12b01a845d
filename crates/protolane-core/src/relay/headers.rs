//! Outbound header construction and response header normalization.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Content type sent when the caller does not override it.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-protobuf";

/// A scalar header value as supplied by a caller.
///
/// Deserializes from a JSON string, number, or boolean, and is sent as its
/// textual form.
///
/// # Examples
///
/// ```
/// use protolane_core::HeaderScalar;
///
/// let value: HeaderScalar = serde_json::from_str("42").unwrap();
/// assert_eq!(value.to_string(), "42");
/// assert_eq!(HeaderScalar::from(true).to_string(), "true");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderScalar {
    /// Boolean value.
    Bool(bool),
    /// Numeric value, kept in its original JSON form.
    Number(serde_json::Number),
    /// String value.
    Text(String),
}

impl fmt::Display for HeaderScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for HeaderScalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for HeaderScalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for HeaderScalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for HeaderScalar {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for HeaderScalar {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// Caller-supplied header overrides, keyed by header name.
pub type HeaderOverrides = BTreeMap<String, HeaderScalar>;

/// Parses header overrides from a JSON object of scalar values.
///
/// An empty or whitespace-only string yields no overrides.
pub fn parse_header_overrides(json: &str) -> Result<HeaderOverrides> {
    if json.trim().is_empty() {
        return Ok(HeaderOverrides::new());
    }
    serde_json::from_str(json).map_err(|e| Error::InvalidHeader {
        name: "headers".to_string(),
        reason: format!("expected a JSON object of string, number or boolean values: {e}"),
    })
}

/// Builds the outbound header map.
///
/// Starts with `Content-Type: application/x-protobuf`; every override is then
/// inserted, replacing any earlier value of the same (case-insensitive) name.
pub fn build_request_headers(overrides: &HeaderOverrides) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    for (name, value) in overrides {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(&value.to_string()).map_err(|e| Error::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Flattens a response header map: lowercase names, repeated values joined
/// with `", "`.
pub fn normalize_response_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        flat.insert(name.as_str().to_ascii_lowercase(), joined);
    }
    flat
}
