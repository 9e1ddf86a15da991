//! ID generation utilities.
//!
//! Content identifiers carry their kind: a three digit kind code followed by
//! a lowercase ULID. Any component holding only an object id (reports,
//! activities, follows) can recover what the id points at without a lookup.

use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

/// Kind of object an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Question,
    Answer,
    Comment,
    Tag,
    User,
    Report,
}

impl ObjectKind {
    /// All kinds, in code order.
    pub const ALL: [Self; 6] = [
        Self::Question,
        Self::Answer,
        Self::Comment,
        Self::Tag,
        Self::User,
        Self::Report,
    ];

    /// Three digit prefix used in identifiers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Question => "101",
            Self::Answer => "102",
            Self::Comment => "103",
            Self::Tag => "104",
            Self::User => "105",
            Self::Report => "106",
        }
    }

    /// Name used in activity keys and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
            Self::Comment => "comment",
            Self::Tag => "tag",
            Self::User => "user",
            Self::Report => "report",
        }
    }

    /// Resolve the kind encoded in an object id.
    #[must_use]
    pub fn from_object_id(id: &str) -> Option<Self> {
        let prefix = id.get(..3)?;
        Self::ALL.into_iter().find(|kind| kind.code() == prefix)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a bare lowercase ULID.
    ///
    /// Used for rows that are never referenced by object id (activities,
    /// configs, notification settings).
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an id for an object of the given kind.
    #[must_use]
    pub fn generate_for(&self, kind: ObjectKind) -> String {
        format!("{}{}", kind.code(), self.generate())
    }

    /// Generate a new UUID v7-based request id.
    #[must_use]
    pub fn generate_request_id(&self) -> String {
        Uuid::now_v7().to_string()
    }

    /// Generate a random token (access tokens, unsubscribe codes).
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component, unlike v7.
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_for_round_trips_kind() {
        let id_gen = IdGenerator::new();
        for kind in ObjectKind::ALL {
            let id = id_gen.generate_for(kind);
            assert_eq!(id.len(), 29);
            assert_eq!(ObjectKind::from_object_id(&id), Some(kind));
        }
    }

    #[test]
    fn test_unknown_prefix() {
        assert_eq!(ObjectKind::from_object_id("999abc"), None);
        assert_eq!(ObjectKind::from_object_id("10"), None);
        assert_eq!(ObjectKind::from_object_id(""), None);
    }

    #[test]
    fn test_generate_token() {
        let token = IdGenerator::new().generate_token();
        assert_eq!(token.len(), 32);
    }
}
