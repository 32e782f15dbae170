use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Name of a status bucket (a board column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusKey(String);

impl StatusKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StatusKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for StatusKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// The configured columns, in canonical display order.
///
/// Non-empty, and no two keys compare equal ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSet {
    keys: Vec<StatusKey>,
}

impl StatusSet {
    /// Columns used when a project does not configure its own.
    pub const DEFAULT: [&'static str; 4] = ["TODO", "DOING", "REVIEW", "DONE"];

    /// Build a status set, rejecting empty, blank or duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the list is empty, contains a blank name,
    /// or names the same status twice (case-insensitively).
    pub fn new<I, S>(keys: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<StatusKey> = Vec::new();
        for raw in keys {
            let name = raw.into().trim().to_string();
            if name.is_empty() {
                return Err(ConfigError::BlankStatus);
            }
            if out.iter().any(|k| k.0.eq_ignore_ascii_case(&name)) {
                return Err(ConfigError::DuplicateStatus(name));
            }
            out.push(StatusKey(name));
        }
        if out.is_empty() {
            return Err(ConfigError::EmptyStatusSet);
        }
        Ok(Self { keys: out })
    }

    #[must_use]
    pub fn as_slice(&self) -> &[StatusKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusKey> {
        self.keys.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Exact membership test.
    #[must_use]
    pub fn contains(&self, status: &StatusKey) -> bool {
        self.keys.contains(status)
    }

    /// Display index of `status`, if configured.
    #[must_use]
    pub fn rank(&self, status: &StatusKey) -> Option<usize> {
        self.keys.iter().position(|k| k == status)
    }

    /// Case-insensitive lookup for user-typed status names.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<&StatusKey> {
        let needle = raw.trim();
        self.keys.iter().find(|k| k.0.eq_ignore_ascii_case(needle))
    }

    /// First configured column; new items land here by default.
    #[must_use]
    pub fn first(&self) -> &StatusKey {
        // `new` guarantees at least one key.
        &self.keys[0]
    }
}

impl Default for StatusSet {
    fn default() -> Self {
        Self {
            keys: Self::DEFAULT.iter().map(|s| StatusKey::from(*s)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StatusSet {
    type Item = &'a StatusKey;
    type IntoIter = std::slice::Iter<'a, StatusKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
