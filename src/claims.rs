use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SearchError};

/// Minimum number of characters an API key claim must carry
pub const API_KEY_MIN_LEN: usize = 8;

/// Wildcard index identifier granting access to every index
pub const ALL_INDEXES: &str = "*";

/// API key a tenant token is derived from.
///
/// Only the first [`API_KEY_MIN_LEN`] characters end up in the token payload.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyClaim(String);

impl ApiKeyClaim {
    pub fn new(value: impl Into<String>) -> Self {
        ApiKeyClaim(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject empty keys and keys shorter than the prefix length
    pub fn verify(&self) -> Result<()> {
        if self.0.chars().count() < API_KEY_MIN_LEN {
            return Err(SearchError::claim("apiKeyPrefix", "invalid key sent"));
        }
        Ok(())
    }

    /// Prefix embedded in the token payload
    pub fn prefix(&self) -> &str {
        match self.0.char_indices().nth(API_KEY_MIN_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl From<&str> for ApiKeyClaim {
    fn from(value: &str) -> Self {
        ApiKeyClaim::new(value)
    }
}

impl From<String> for ApiKeyClaim {
    fn from(value: String) -> Self {
        ApiKeyClaim(value)
    }
}

// Keep the full key out of logs
impl fmt::Debug for ApiKeyClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKeyClaim")
            .field(&format!("{}...", self.prefix()))
            .finish()
    }
}

/// Restrictions applied to one index. The empty policy grants full access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRules {
    /// Filter expression forced onto every search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Attributes the tenant may retrieve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_retrieve: Option<Vec<String>>,
}

impl IndexRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_attributes_to_retrieve<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_retrieve = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.filter.is_none() && self.attributes_to_retrieve.is_none()
    }
}

/// Search rules claim: index uid to optional policy.
///
/// The policies are opaque to the signer; the service interprets them.
/// Keys are ordered so that the payload is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchRules(BTreeMap<String, Option<IndexRules>>);

impl SearchRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unrestricted access to every index
    pub fn all_indexes() -> Self {
        SearchRules::new().index(ALL_INDEXES, Some(IndexRules::default()))
    }

    /// Add or replace the policy for an index
    pub fn index(mut self, uid: impl Into<String>, rules: Option<IndexRules>) -> Self {
        self.0.insert(uid.into(), rules);
        self
    }

    pub fn get(&self, uid: &str) -> Option<&Option<IndexRules>> {
        self.0.get(uid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<IndexRules>)> {
        self.0.iter()
    }

    /// Structural check: every key must be a non-empty index identifier
    pub fn verify(&self) -> Result<()> {
        if self.0.keys().any(|uid| uid.trim().is_empty()) {
            return Err(SearchError::claim("searchRules", "empty index uid"));
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, Option<IndexRules>)> for SearchRules {
    fn from_iter<I: IntoIterator<Item = (S, Option<IndexRules>)>>(iter: I) -> Self {
        SearchRules(iter.into_iter().map(|(uid, rules)| (uid.into(), rules)).collect())
    }
}

/// Payload of a tenant token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantClaims {
    pub search_rules: SearchRules,

    pub api_key_prefix: String,

    /// Issued-at, unix seconds
    pub iat: i64,

    /// Expiry, unix seconds. Absent for non-expiring tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_key_claim_verify() {
        assert!(ApiKeyClaim::new("").verify().unwrap_err().is_claim_failure());
        assert!(ApiKeyClaim::new("abcdefg").verify().is_err());
        assert!(ApiKeyClaim::new("abcdefgh").verify().is_ok());
        assert!(ApiKeyClaim::new("abcdefghijklmnop").verify().is_ok());
    }

    #[test]
    fn test_api_key_claim_error_fields() {
        match ApiKeyClaim::new("short").verify() {
            Err(SearchError::ClaimVerification { claim, message }) => {
                assert_eq!(claim, "apiKeyPrefix");
                assert_eq!(message, "invalid key sent");
            }
            other => panic!("expected claim failure, got {:?}", other),
        }
    }

    #[test]
    fn test_api_key_prefix() {
        assert_eq!(ApiKeyClaim::new("abcdefghijkl").prefix(), "abcdefgh");
        assert_eq!(ApiKeyClaim::new("abc").prefix(), "abc");
        assert_eq!(ApiKeyClaim::new("ééééééééé").prefix(), "éééééééé");
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", ApiKeyClaim::new("abcdefgh-secret-part"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_search_rules_json() {
        let rules = SearchRules::new()
            .index("movies", Some(IndexRules::new().with_filter("genre = comedy")))
            .index("books", None)
            .index("songs", Some(IndexRules::new()));

        assert_eq!(
            serde_json::to_value(&rules).unwrap(),
            json!({
                "books": null,
                "movies": {"filter": "genre = comedy"},
                "songs": {}
            })
        );
        assert!(rules.verify().is_ok());
        assert!(rules.get("songs").unwrap().as_ref().unwrap().is_unrestricted());
    }

    #[test]
    fn test_search_rules_rejects_empty_uid() {
        let rules: SearchRules = vec![("", None)].into_iter().collect();
        assert!(rules.verify().unwrap_err().is_claim_failure());
    }

    #[test]
    fn test_all_indexes() {
        assert_eq!(
            serde_json::to_value(SearchRules::all_indexes()).unwrap(),
            json!({"*": {}})
        );
    }
}
