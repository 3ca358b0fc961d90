//! Extension identity normalization.
//!
//! # Invariants
//! - Identities compare case-insensitively.
//! - Leading `\` and `/` separators are not part of the identity.
//! - A normalized identity is never empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Normalized, comparable extension identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Normalizes `name` into an identity.
    pub fn parse(name: &str) -> Result<Self, IdentityError> {
        let normalized = name
            .trim()
            .trim_start_matches(['\\', '/'])
            .to_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::Empty(name.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExtensionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ExtensionId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExtensionId> for String {
    fn from(value: ExtensionId) -> Self {
        value.0
    }
}

/// Identity normalization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The name is empty once separators and whitespace are stripped.
    Empty(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(raw) => write!(f, "extension identity is empty: `{raw}`"),
        }
    }
}

impl Error for IdentityError {}

#[cfg(test)]
mod tests {
    use super::{ExtensionId, IdentityError};

    #[test]
    fn ignores_case_and_leading_separators() {
        let plain = ExtensionId::parse("Vendor\\TwigExtension").expect("plain");
        let rooted = ExtensionId::parse("\\vendor\\twigextension").expect("rooted");
        let slashed = ExtensionId::parse("/VENDOR\\TwigExtension").expect("slashed");

        assert_eq!(plain, rooted);
        assert_eq!(plain, slashed);
        assert_eq!(plain.as_str(), "vendor\\twigextension");
    }

    #[test]
    fn keeps_inner_separators() {
        let id = ExtensionId::parse("a/b").expect("id");
        assert_ne!(id, ExtensionId::parse("ab").expect("id"));
    }

    #[test]
    fn rejects_empty_identity() {
        assert_eq!(
            ExtensionId::parse(" \\/ "),
            Err(IdentityError::Empty(" \\/ ".to_string()))
        );
    }

    #[test]
    fn deserializes_through_normalization() {
        let id: ExtensionId = serde_json::from_str("\"\\\\My\\\\Module\"").expect("deserialize");
        assert_eq!(id.as_str(), "my\\module");
        assert!(serde_json::from_str::<ExtensionId>("\"\\\\\"").is_err());
    }
}
