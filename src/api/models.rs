//! Data types exchanged with the Paperless API.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Server-assigned numeric identifier of an entity.
///
/// During a dry run, entities that would be created get a placeholder ID
/// (see [`EntityId::placeholder`]). Placeholders format fine but never match
/// an ID the server will hand out later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// Placeholders are allocated downwards from `u64::MAX`.
const PLACEHOLDER_FLOOR: u64 = u64::MAX - u32::MAX as u64;

impl EntityId {
    /// The `n`-th dry-run placeholder ID.
    #[must_use]
    pub fn placeholder(n: u32) -> Self {
        Self(u64::MAX - u64::from(n))
    }

    /// Whether this ID was made up by a dry run.
    #[must_use]
    pub fn is_placeholder(self) -> bool {
        self.0 > PLACEHOLDER_FLOOR
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_placeholder() {
            write!(f, "new-{}", u64::MAX - self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Receipt for an accepted document upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kinds of named server-side objects the client resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Tag,
    Correspondent,
    User,
    Group,
    DocumentType,
}

impl EntityKind {
    /// All kinds, in a stable order.
    pub const ALL: [EntityKind; 5] = [
        Self::Tag,
        Self::Correspondent,
        Self::User,
        Self::Group,
        Self::DocumentType,
    ];

    /// REST collection name below `/api/`.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Correspondent => "correspondents",
            Self::User => "users",
            Self::Group => "groups",
            Self::DocumentType => "document_types",
        }
    }

    /// JSON field holding the display name.
    #[must_use]
    pub fn name_field(self) -> &'static str {
        match self {
            Self::User => "username",
            _ => "name",
        }
    }

    /// Human-readable label used in messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Tag => "Tag",
            Self::Correspondent => "Correspondent",
            Self::User => "User",
            Self::Group => "Group",
            Self::DocumentType => "Document type",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named entity as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
}

impl Entity {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: EntityId(id),
            name: name.into(),
        }
    }
}

/// Paperless auto-matching algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingAlgorithm {
    None = 0,
    Any = 1,
    All = 2,
    Literal = 3,
    Regex = 4,
    Fuzzy = 5,
    Auto = 6,
}

impl Serialize for MatchingAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Kind-specific fields sent along with a new entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_algorithm: Option<MatchingAlgorithm>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_insensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_inbox_tag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Access granted to a set of users and groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSet {
    pub users: Vec<EntityId>,
    pub groups: Vec<EntityId>,
}

/// The server's `set_permissions` structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionTable {
    pub view: PermissionSet,
    pub change: PermissionSet,
}

impl PermissionTable {
    /// True when the table grants nothing beyond the defaults.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view.users.is_empty()
            && self.view.groups.is_empty()
            && self.change.users.is_empty()
            && self.change.groups.is_empty()
    }
}

/// A not-yet-persisted entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDraft {
    pub name: String,
    #[serde(flatten)]
    pub args: CreateArgs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_permissions: Option<PermissionTable>,
}

impl EntityDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, args: CreateArgs) -> Self {
        Self {
            name: name.into(),
            args,
            owner: None,
            set_permissions: None,
        }
    }
}

/// A document ready to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    /// File name reported to the server.
    pub file_name: String,
    /// Raw file content.
    pub content: Vec<u8>,
    pub title: String,
    /// Creation date, `YYYY-MM-DD` when it could be normalised.
    pub created: Option<String>,
    pub tags: Vec<EntityId>,
    pub correspondent: Option<EntityId>,
    pub document_type: Option<EntityId>,
}
