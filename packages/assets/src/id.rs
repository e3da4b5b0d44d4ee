use crate::error::{AssetError, AssetResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix of every transient handle
pub const HANDLE_SCHEME: &str = "blob:chroma/";

/// Stable, persistable asset identifier.
///
/// Restricted to `[A-Za-z0-9_-]` so it can be embedded in archive paths and
/// markdown links without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    /// Random 128-bit id rendered as 32 hex digits
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn parse(value: impl Into<String>) -> AssetResult<Self> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(value))
        } else {
            Err(AssetError::InvalidId { id: value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AssetId {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

/// Process-local reference to a live asset (`blob:chroma/<generation>/<uuid>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub(crate) fn issue(generation: u64) -> Self {
        Self(format!("{}{}/{}", HANDLE_SCHEME, generation, Uuid::new_v4().simple()))
    }

    /// Whether `text` looks like a handle (it may still be revoked)
    pub fn is_handle(text: &str) -> bool {
        text.starts_with(HANDLE_SCHEME)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_hex_and_distinct() {
        let a = AssetId::generate();
        let b = AssetId::generate();
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_path_characters() {
        assert!(AssetId::parse("abc-123_x").is_ok());
        assert!(AssetId::parse("").is_err());
        assert!(AssetId::parse("../etc").is_err());
        assert!(AssetId::parse("a b").is_err());
    }

    #[test]
    fn test_id_serde_validates() {
        let id: AssetId = serde_json::from_str("\"deadbeef\"").unwrap();
        assert_eq!(id.as_str(), "deadbeef");
        assert!(serde_json::from_str::<AssetId>("\"a/b\"").is_err());
    }

    #[test]
    fn test_handle_format() {
        let handle = AssetHandle::issue(7);
        assert!(AssetHandle::is_handle(handle.as_str()));
        assert!(handle.as_str().starts_with("blob:chroma/7/"));
    }
}
