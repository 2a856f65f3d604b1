//! Correlation context carried by one inbound HTTP request.
//!
//! A [`CorrelationContext`] pairs the request's [`CorrelationId`] with an
//! open-ended bag of [`ContextFields`] (enabled feature flags, the user's
//! external id, ...). The server keeps one context per in-flight request and
//! reads it when logging or calling upstream services.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field key holding the authenticated user's enabled feature flags.
pub const FEATURES_KEY: &str = "features";

/// Field key holding the authenticated user's external id.
pub const USER_EXTERNAL_ID_KEY: &str = "user_external_id";

/// Longest correlation identifier accepted from an inbound header.
pub const MAX_CORRELATION_ID_LEN: usize = 256;

// ---------------------------------------------------------------------------
// CorrelationId
// ---------------------------------------------------------------------------

/// Identifier tying one inbound request to its logs and outbound calls.
///
/// Always non-empty, at most [`MAX_CORRELATION_ID_LEN`] bytes, and made of
/// visible ASCII characters so it can be re-emitted as a header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Parses a raw header value.
    ///
    /// Surrounding whitespace is trimmed. Returns `None` for empty values,
    /// values over [`MAX_CORRELATION_ID_LEN`] bytes, and values containing
    /// anything outside visible ASCII.
    ///
    /// # Examples
    ///
    /// ```
    /// use selfservice_core::CorrelationId;
    ///
    /// assert_eq!(CorrelationId::parse(" abc123 ").unwrap().as_str(), "abc123");
    /// assert!(CorrelationId::parse("").is_none());
    /// assert!(CorrelationId::parse("has space").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_CORRELATION_ID_LEN {
            return None;
        }
        if !trimmed.bytes().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ContextFields
// ---------------------------------------------------------------------------

/// Open-ended key/value bag attached to a correlation context.
///
/// Ordered by key so log output is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextFields(BTreeMap<String, Value>);

impl ContextFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Feature flags stored under [`FEATURES_KEY`].
    ///
    /// Non-string array entries are skipped; a missing or non-array value
    /// yields an empty list.
    #[must_use]
    pub fn features(&self) -> Vec<String> {
        match self.0.get(FEATURES_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// External id of the user that made the request, if recorded.
    #[must_use]
    pub fn user_external_id(&self) -> Option<&str> {
        self.0.get(USER_EXTERNAL_ID_KEY).and_then(Value::as_str)
    }
}

/// Compact JSON object, the form used in structured log lines.
impl fmt::Display for ContextFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl FromIterator<(String, Value)> for ContextFields {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ContextFields {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// CorrelationContext
// ---------------------------------------------------------------------------

/// Snapshot of the context bound to one in-flight request.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationContext {
    pub id: CorrelationId,
    pub fields: ContextFields,
}

impl CorrelationContext {
    #[must_use]
    pub fn new(id: CorrelationId, fields: ContextFields) -> Self {
        Self { id, fields }
    }
}
