//! Parsing of the parameter strings carried by callback links
//!
//! Implicit, invite and recovery links deliver their tokens in the URL fragment, which only the
//! browser sees. The callback page forwards `location.hash` and `location.search` verbatim and
//! they are decoded here.

use std::collections::HashMap;

/// Decoded key/value pairs of a `#fragment` or `?query` string
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UrlParams(HashMap<String, String>);

impl UrlParams {
    /// Parse a fragment or query string, with or without its leading `#` / `?`
    ///
    /// The first occurrence of a key wins; empty values are treated as absent.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches(['#', '?']);
        let mut params = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(trimmed.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self(params)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Provider error text: `error_description` when present, else `error`
    #[must_use]
    pub fn provider_error(&self) -> Option<&str> {
        self.get("error_description").or_else(|| self.get("error"))
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.get("error").is_some() || self.get("error_description").is_some()
    }
}
