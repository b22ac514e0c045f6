//! Content cache backing [`Parser::parse_post`](crate::Parser::parse_post).
//!
//! The parser only fills the cache. Whoever owns post edits is responsible
//! for calling [`CacheStore::remove`] when the content changes.
//!
//! The crate ships [`MemoryCache`]; implement [`CacheStore`] to back the
//! parser with something else.

mod memory;

pub use memory::MemoryCache;

use std::fmt;
use std::future::Future;

/// Cache identity of a payload.
///
/// Payloads without an owner id are [`Anonymous`](CacheKey::Anonymous) and
/// are never looked up or stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Identified(String),
    Anonymous,
}

impl CacheKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheKey::Identified(key) => Some(key),
            CacheKey::Anonymous => None,
        }
    }
}

impl<T: fmt::Display> From<Option<T>> for CacheKey {
    fn from(id: Option<T>) -> Self {
        match id {
            Some(id) => CacheKey::Identified(id.to_string()),
            None => CacheKey::Anonymous,
        }
    }
}

/// Key-value store for rendered content.
///
/// Implementations must tolerate concurrent `get`/`set` calls. No
/// read-then-write atomicity is expected: two concurrent misses for the same
/// key may both call `set`, and the last write wins.
///
/// # Implementing a custom store
///
/// ```rust,no_run
/// use post_parser::CacheStore;
///
/// struct NoCache;
///
/// impl CacheStore for NoCache {
///     async fn get(&self, _key: &str) -> Option<String> { None }
///     async fn set(&self, _key: &str, _value: String) {}
///     async fn remove(&self, _key: &str) {}
/// }
/// ```
pub trait CacheStore: Send + Sync + 'static {
    /// Look up the rendered content stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    /// Store rendered content under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> impl Future<Output = ()> + Send;

    /// Drop the entry for `key`, if any.
    fn remove(&self, key: &str) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_present_id() {
        let key = CacheKey::from(Some(42u64));
        assert_eq!(key, CacheKey::Identified("42".into()));
        assert_eq!(key.as_str(), Some("42"));
    }

    #[test]
    fn key_from_absent_id() {
        let key = CacheKey::from(None::<u64>);
        assert_eq!(key, CacheKey::Anonymous);
        assert_eq!(key.as_str(), None);
    }
}
