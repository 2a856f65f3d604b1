//! Identity types shared between the server's middleware and its clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{ContextFields, FEATURES_KEY, USER_EXTERNAL_ID_KEY};

/// The user a request was authenticated as.
///
/// Placed into request extensions by the authentication layer; the request
/// context middleware derives the correlation fields from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Stable identifier issued by the user-administration service.
    pub external_id: String,
    pub email: String,
    /// Feature flags enabled for this user.
    pub features: Vec<String>,
}

impl AuthenticatedUser {
    /// Builds the correlation field bag for this user.
    #[must_use]
    pub fn context_fields(&self) -> ContextFields {
        let mut fields = ContextFields::new();
        fields.insert(USER_EXTERNAL_ID_KEY, self.external_id.clone());
        fields.insert(
            FEATURES_KEY,
            Value::Array(self.features.iter().cloned().map(Value::String).collect()),
        );
        fields
    }
}

/// Splits the comma-separated feature string stored by user administration.
///
/// # Examples
///
/// ```
/// use selfservice_core::parse_features;
///
/// assert_eq!(parse_features("a, b,,c "), vec!["a", "b", "c"]);
/// assert!(parse_features("").is_empty());
/// ```
#[must_use]
pub fn parse_features(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToString::to_string)
        .collect()
}
