use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, server-assigned identifier for a drop.
///
/// The server mints these as UUIDs, but nothing outside the metadata store
/// relies on that: clients treat the id as an opaque string lifted from the
/// share URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String))]
#[serde(transparent)]
pub struct DropId(String);

impl DropId {
    /// Create a new instance from a string value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the inner string as a str slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DropId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DropId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for DropId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_id_from_str() {
        let id = DropId::from("abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn drop_id_display() {
        let id = DropId::new("d1");
        assert_eq!(format!("{id}"), "d1");
    }

    #[test]
    fn drop_id_serde_transparent() {
        let id = DropId::new("drop-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"drop-42\"");
        let back: DropId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
