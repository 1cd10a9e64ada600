//! Mailer contract consumed by the notifier.
//!
//! # Responsibility
//! - Define one compose function per note email template (`Notify`).
//! - Define the delivery hand-off (`Deliver`) and its receipt.
//!
//! # Invariants
//! - One composed message addresses exactly one recipient.
//! - A message produces a receipt only after `deliver` succeeds.
//! - Rendering and network transport live behind this boundary.

use crate::db::DbError;
use crate::model::note::{NoteId, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod outbox;
mod recording;

pub use outbox::{OutboxEntry, OutboxMessage, SqliteOutboxMailer};
pub use recording::{RecordedMessage, RecordingMailer};

pub type MailResult<T> = Result<T, MailError>;

/// Email templates for note notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTemplate {
    NoteCommitEmail,
    NoteIssueEmail,
    NoteWikiEmail,
    NoteMergeRequestEmail,
    NoteWallEmail,
}

impl MailTemplate {
    /// Stable template name, also used as the outbox column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoteCommitEmail => "note_commit_email",
            Self::NoteIssueEmail => "note_issue_email",
            Self::NoteWikiEmail => "note_wiki_email",
            Self::NoteMergeRequestEmail => "note_merge_request_email",
            Self::NoteWallEmail => "note_wall_email",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "note_commit_email" => Some(Self::NoteCommitEmail),
            "note_issue_email" => Some(Self::NoteIssueEmail),
            "note_wiki_email" => Some(Self::NoteWikiEmail),
            "note_merge_request_email" => Some(Self::NoteMergeRequestEmail),
            "note_wall_email" => Some(Self::NoteWallEmail),
            _ => None,
        }
    }
}

impl Display for MailTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement returned by a successful `Deliver::deliver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: Uuid,
    pub template: MailTemplate,
    pub recipient: UserId,
    pub note: NoteId,
}

impl DeliveryReceipt {
    /// Creates a receipt with a fresh message id.
    pub fn new(template: MailTemplate, recipient: UserId, note: NoteId) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            template,
            recipient,
            note,
        }
    }
}

/// Mailer-side failures. The notifier propagates these unchanged.
#[derive(Debug)]
pub enum MailError {
    Storage(DbError),
    /// Mailer state cannot be used (e.g. poisoned lock).
    Unavailable(String),
    InvalidData(String),
}

impl Display for MailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "mail storage failure: {err}"),
            Self::Unavailable(message) => write!(f, "mailer unavailable: {message}"),
            Self::InvalidData(message) => write!(f, "invalid mail data: {message}"),
        }
    }
}

impl Error for MailError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Unavailable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for MailError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for MailError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

/// A composed message waiting to be handed to transport.
pub trait Deliver {
    fn deliver(self) -> MailResult<DeliveryReceipt>;
}

/// Note email composer. One function per template.
///
/// Implementors only provide `compose`; the per-template functions route
/// through it.
pub trait Notify {
    type Message: Deliver;

    fn compose(&self, template: MailTemplate, recipient: UserId, note: NoteId) -> Self::Message;

    fn note_commit_email(&self, recipient: UserId, note: NoteId) -> Self::Message {
        self.compose(MailTemplate::NoteCommitEmail, recipient, note)
    }

    fn note_issue_email(&self, recipient: UserId, note: NoteId) -> Self::Message {
        self.compose(MailTemplate::NoteIssueEmail, recipient, note)
    }

    fn note_wiki_email(&self, recipient: UserId, note: NoteId) -> Self::Message {
        self.compose(MailTemplate::NoteWikiEmail, recipient, note)
    }

    fn note_merge_request_email(&self, recipient: UserId, note: NoteId) -> Self::Message {
        self.compose(MailTemplate::NoteMergeRequestEmail, recipient, note)
    }

    fn note_wall_email(&self, recipient: UserId, note: NoteId) -> Self::Message {
        self.compose(MailTemplate::NoteWallEmail, recipient, note)
    }
}
