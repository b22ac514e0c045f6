//! Payloads carried through the pipeline.
//!
//! Both payloads keep every field they do not know about in `extra`, so
//! callers can round-trip their full objects through the parser.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::cache::CacheKey;
use crate::error::{PipelineError, Result};

/// Opaque post or user identifier.
///
/// Accepted as a JSON number or string and written back in the same form.
/// `42` and `"42"` share a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerId {
    Number(u64),
    Text(String),
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Number(n) => write!(f, "{n}"),
            OwnerId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        OwnerId::Number(id)
    }
}

impl From<String> for OwnerId {
    fn from(id: String) -> Self {
        OwnerId::Text(id)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        OwnerId::Text(id.to_string())
    }
}

/// A post whose `content` is rendered by [`Parser::parse_post`](crate::Parser::parse_post).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    /// Post id. Posts without one are never cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<OwnerId>,

    /// Post body. An absent or `null` value reads as an empty string.
    #[serde(default, deserialize_with = "string_or_null")]
    pub content: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PostData {
    pub fn new(pid: Option<u64>, content: impl Into<String>) -> Self {
        Self {
            pid: pid.map(OwnerId::from),
            content: content.into(),
            extra: Map::new(),
        }
    }

    /// Replace the post id, e.g. with a string id from storage.
    pub fn with_pid(mut self, pid: impl Into<OwnerId>) -> Self {
        self.pid = Some(pid.into());
        self
    }

    /// Identity used for content caching.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from(self.pid.as_ref())
    }

    /// Decode a post from a JSON object.
    ///
    /// Returns [`PipelineError::InvalidInput`] if `value` is not an object or
    /// `content` is neither a string nor `null`.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PipelineError::InvalidInput(format!(
                "post must be an object, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| PipelineError::InvalidInput(e.to_string()))
    }

    pub fn into_value(self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| PipelineError::InvalidInput(e.to_string()))
    }
}

/// A user profile whose `signature` is rendered by
/// [`Parser::parse_signature`](crate::Parser::parse_signature).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<OwnerId>,

    #[serde(default, deserialize_with = "string_or_null")]
    pub signature: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignatureData {
    pub fn new(uid: Option<u64>, signature: impl Into<String>) -> Self {
        Self {
            uid: uid.map(OwnerId::from),
            signature: signature.into(),
            extra: Map::new(),
        }
    }
}

fn string_or_null<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
