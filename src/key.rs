//! Cache keys and the validation rule persisting backends apply.

use std::fmt;

use crate::error::KeyValidationError;

/// Characters the reference backends refuse inside a key.
///
/// The reserved set common cache adapters agree on, so keys accepted by one
/// backend stay accepted by another.
const RESERVED_CHARS: &[char] = &['{', '}', '(', ')', '/', '\\', '@', ':'];

/// A text key identifying one cacheable computation.
///
/// Construction never fails; backends call [`CacheKey::validate`] and reject
/// keys that violate the shared rule with a
/// [`KeyValidationError`](crate::KeyValidationError).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the key against the constraints shared by the reference
    /// backends: non-empty and free of reserved characters.
    pub fn validate(&self) -> Result<(), KeyValidationError> {
        if self.0.is_empty() {
            return Err(KeyValidationError::new(&self.0, "key must not be empty"));
        }
        if let Some(c) = self.0.chars().find(|c| RESERVED_CHARS.contains(c)) {
            return Err(KeyValidationError::new(
                &self.0,
                format!("key contains reserved character {:?}", c),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for CacheKey {
    fn from(s: &String) -> Self {
        Self::new(s.clone())
    }
}
