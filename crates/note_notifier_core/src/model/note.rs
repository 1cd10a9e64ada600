//! Note domain model.
//!
//! # Responsibility
//! - Define `Note` and the identities it references.
//! - Validate notes before they reach the notifier.
//!
//! # Invariants
//! - `commit_author` is only set when `noteable_kind == NoteableKind::Commit`.
//! - Unknown parent tags decode to `NoteableKind::Unknown`, never an error.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable note identifier assigned by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

/// Stable user identifier, unique within the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Stable project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user reference. Identity is the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self { id: UserId(id) }
    }
}

/// Parent entity a note is attached to.
///
/// Every variant is matched explicitly by the notifier, so adding a kind
/// forces a dispatch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteableKind {
    Commit,
    Issue,
    Wiki,
    MergeRequest,
    Wall,
    Snippet,
    /// Any tag this build does not recognise.
    Unknown,
}

impl NoteableKind {
    /// Maps a parent type tag (`"Commit"`, `"MergeRequest"`, ...) to a kind.
    ///
    /// Matching is exact; anything unrecognised yields `Unknown`.
    pub fn from_type_name(value: &str) -> Self {
        match value {
            "Commit" => Self::Commit,
            "Issue" => Self::Issue,
            "Wiki" => Self::Wiki,
            "MergeRequest" => Self::MergeRequest,
            "Wall" => Self::Wall,
            "Snippet" => Self::Snippet,
            _ => Self::Unknown,
        }
    }

    /// Canonical parent type tag.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Commit => "Commit",
            Self::Issue => "Issue",
            Self::Wiki => "Wiki",
            Self::MergeRequest => "MergeRequest",
            Self::Wall => "Wall",
            Self::Snippet => "Snippet",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for NoteableKind {
    fn from(value: String) -> Self {
        Self::from_type_name(&value)
    }
}

impl From<NoteableKind> for String {
    fn from(value: NoteableKind) -> Self {
        value.type_name().to_string()
    }
}

impl Display for NoteableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Validation failures for `Note`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// A commit author was attached to a note whose parent is not a commit.
    CommitAuthorOnNonCommit(NoteableKind),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommitAuthorOnNonCommit(kind) => {
                write!(f, "commit_author is only valid on Commit notes, got {kind}")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// A persisted note as handed over by the create path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NoteWire")]
pub struct Note {
    pub id: NoteId,
    /// Serialized as `noteable_type` to match the host schema.
    #[serde(rename = "noteable_type")]
    pub noteable_kind: NoteableKind,
    /// Fan out to the project team when set.
    pub notify_team: bool,
    /// Notify the commit author when set.
    pub notify_author: bool,
    pub author: User,
    pub project: ProjectId,
    /// Author of the commented commit. `None` for non-commit notes or
    /// when the commit author is not a known user.
    pub commit_author: Option<User>,
}

impl Note {
    /// Creates a note with both notification flags off.
    pub fn new(id: i64, noteable_kind: NoteableKind, author: User, project: ProjectId) -> Self {
        Self {
            id: NoteId(id),
            noteable_kind,
            notify_team: false,
            notify_author: false,
            author,
            project,
            commit_author: None,
        }
    }

    pub fn with_team_notification(mut self, enabled: bool) -> Self {
        self.notify_team = enabled;
        self
    }

    pub fn with_author_notification(mut self, enabled: bool) -> Self {
        self.notify_author = enabled;
        self
    }

    pub fn with_commit_author(mut self, commit_author: Option<User>) -> Self {
        self.commit_author = commit_author;
        self
    }

    /// Checks the note invariants.
    ///
    /// # Errors
    /// - `CommitAuthorOnNonCommit` when a commit author is set on a
    ///   non-commit note.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.commit_author.is_some() && self.noteable_kind != NoteableKind::Commit {
            return Err(NoteValidationError::CommitAuthorOnNonCommit(
                self.noteable_kind,
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoteWire {
    id: NoteId,
    noteable_type: NoteableKind,
    #[serde(default)]
    notify_team: bool,
    #[serde(default)]
    notify_author: bool,
    author: User,
    project: ProjectId,
    #[serde(default)]
    commit_author: Option<User>,
}

impl TryFrom<NoteWire> for Note {
    type Error = NoteValidationError;

    fn try_from(value: NoteWire) -> Result<Self, Self::Error> {
        let note = Note {
            id: value.id,
            noteable_kind: value.noteable_type,
            notify_team: value.notify_team,
            notify_author: value.notify_author,
            author: value.author,
            project: value.project,
            commit_author: value.commit_author,
        };
        note.validate()?;
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteableKind, User};

    #[test]
    fn kind_tags_map_to_variants() {
        assert_eq!(NoteableKind::from_type_name("Commit"), NoteableKind::Commit);
        assert_eq!(
            NoteableKind::from_type_name("MergeRequest"),
            NoteableKind::MergeRequest
        );
        assert_eq!(NoteableKind::from_type_name("Snippet"), NoteableKind::Snippet);
    }

    #[test]
    fn unrecognised_tag_is_unknown() {
        assert_eq!(NoteableKind::from_type_name("Epic"), NoteableKind::Unknown);
        assert_eq!(NoteableKind::from_type_name("commit"), NoteableKind::Unknown);
        assert_eq!(NoteableKind::from_type_name(""), NoteableKind::Unknown);
    }

    #[test]
    fn padded_tag_is_not_trimmed() {
        assert_eq!(NoteableKind::from_type_name(" Commit "), NoteableKind::Unknown);
    }

    #[test]
    fn users_compare_by_id() {
        assert_eq!(User::new(3), User::new(3));
        assert_ne!(User::new(3), User::new(4));
    }
}
