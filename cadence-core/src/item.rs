//! Catalog item identifiers.

use serde::Serialize;

/// Longest identifier accepted from a client.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Opaque identifier naming a catalog item (a video or track id).
///
/// Non-empty and restricted to `[A-Za-z0-9_-]`, since it is embedded
/// verbatim into the provider lookup URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemIdentifier(String);

/// Rejected item identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidItemIdentifier {
    #[error("item id is empty")]
    Empty,

    #[error("item id is longer than {MAX_IDENTIFIER_LEN} characters")]
    TooLong,

    #[error("item id contains unsupported character {0:?}")]
    BadCharacter(char),
}

impl ItemIdentifier {
    /// Validates a raw identifier.
    ///
    /// The identifier is kept verbatim; surrounding whitespace is rejected,
    /// not stripped.
    ///
    /// # Errors
    /// - `InvalidItemIdentifier::Empty` - identifier is empty or whitespace
    /// - `InvalidItemIdentifier::TooLong` - identifier exceeds the length limit
    /// - `InvalidItemIdentifier::BadCharacter` - identifier contains a character outside `[A-Za-z0-9_-]`
    pub fn parse(raw: &str) -> Result<Self, InvalidItemIdentifier> {
        if raw.trim().is_empty() {
            return Err(InvalidItemIdentifier::Empty);
        }
        if raw.len() > MAX_IDENTIFIER_LEN {
            return Err(InvalidItemIdentifier::TooLong);
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(InvalidItemIdentifier::BadCharacter(bad));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ItemIdentifier {
    type Err = InvalidItemIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ItemIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
