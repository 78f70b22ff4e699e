// ── Entity identifiers ──
//
// Ids minted by the gateway are v4 UUIDs. Backups written by the older
// Mongo-backed console carry 24-digit ObjectId hex strings instead; those
// are kept exactly as imported so group references inside the same
// backup still resolve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a rule, group, route or blocked domain. On the wire it
/// is always a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityId(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Minted(Uuid),
    Imported(Box<str>),
}

impl EntityId {
    pub fn generate() -> Self {
        Self(Repr::Minted(Uuid::new_v4()))
    }

    /// The UUID behind this id, when it has UUID form.
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match &self.0 {
            Repr::Minted(u) => Some(u),
            Repr::Imported(_) => None,
        }
    }

    /// Whether the id came from an older store and is not a UUID.
    pub fn is_imported(&self) -> bool {
        matches!(self.0, Repr::Imported(_))
    }

    /// Whether the id looks like a MongoDB ObjectId.
    pub fn is_object_id(&self) -> bool {
        match &self.0 {
            Repr::Imported(s) => s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit()),
            Repr::Minted(_) => false,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Minted(u) => u.fmt(f),
            Repr::Imported(s) => f.write_str(s),
        }
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self(Repr::Minted(u))
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        Uuid::parse_str(raw).map_or_else(|_| Self(Repr::Imported(raw.into())), Self::from)
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
