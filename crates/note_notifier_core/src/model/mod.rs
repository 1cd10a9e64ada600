//! Domain model for note-created notifications.
//!
//! # Responsibility
//! - Define the note, user and project identities the notifier reasons about.
//! - Turn the loosely-typed parent tag into a closed `NoteableKind`.
//!
//! # Invariants
//! - Users are compared by `UserId` only.
//! - Team membership is never stored on a note; it is resolved at
//!   notification time through `repo::team_repo::TeamDirectory`.

pub mod note;
