//! Note creation notifier.
//!
//! # Responsibility
//! - Decide who hears about a newly created note.
//! - Fan one email per recipient out to the mailer.
//!
//! # Invariants
//! - Holds no mutable state; each call reads the team fresh.
//! - `notify_team == false` never touches the team directory or mailer.
//! - Snippet and unknown parents send nothing and raise nothing.
//! - Mailer errors are propagated, never swallowed or retried here.

use crate::mailer::{Deliver, DeliveryReceipt, MailError, Notify};
use crate::model::note::{Note, NoteId, NoteValidationError, NoteableKind, User, UserId};
use crate::repo::team_repo::TeamDirectory;
use crate::repo::RepoError;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NotifierResult<T> = Result<T, NotifierError>;

/// Errors surfaced by the notifier.
#[derive(Debug)]
pub enum NotifierError {
    /// Note rejected before any dispatch.
    InvalidNote(NoteValidationError),
    /// Team lookup failed.
    Repo(RepoError),
    /// Mailer collaborator failed.
    Mail(MailError),
}

impl Display for NotifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNote(err) => write!(f, "invalid note: {err}"),
            Self::Repo(err) => write!(f, "team lookup failed: {err}"),
            Self::Mail(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidNote(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Mail(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for NotifierError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidNote(value)
    }
}

impl From<RepoError> for NotifierError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MailError> for NotifierError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

/// What `on_note_created` did for one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationReport {
    /// `Some` iff team fan-out ran. May be empty (snippet, lone author).
    pub team: Option<Vec<DeliveryReceipt>>,
    /// `Some` iff an email reached the commit author.
    pub author: Option<DeliveryReceipt>,
}

impl NotificationReport {
    /// True when neither path fired.
    pub fn is_empty(&self) -> bool {
        self.team.is_none() && self.author.is_none()
    }

    /// `(team_fanout_ran, author_notified)`.
    pub fn fired(&self) -> (bool, bool) {
        (self.team.is_some(), self.author.is_some())
    }

    /// Total emails delivered across both paths.
    pub fn delivered_count(&self) -> usize {
        self.team.as_ref().map_or(0, Vec::len) + usize::from(self.author.is_some())
    }
}

/// Notifier invoked once per persisted note.
///
/// Built once at startup with its collaborators and passed to whatever
/// drives note creation.
pub struct NoteNotifier<M: Notify, D: TeamDirectory> {
    mailer: M,
    directory: D,
}

impl<M: Notify, D: TeamDirectory> NoteNotifier<M, D> {
    pub fn new(mailer: M, directory: D) -> Self {
        Self { mailer, directory }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Runs both notification paths for a freshly created note.
    ///
    /// The team and author paths are independent; with both flags off this
    /// is a no-op returning an empty report and never an error.
    ///
    /// # Errors
    /// - `InvalidNote` when a path would fire and `note.validate()` fails;
    ///   nothing is sent.
    /// - `Repo` / `Mail` from the collaborators, unchanged.
    pub fn on_note_created(&self, note: &Note) -> NotifierResult<NotificationReport> {
        if !note.notify_team && !note.notify_author {
            return Ok(NotificationReport::default());
        }
        note.validate()?;

        let mut report = NotificationReport::default();
        if note.notify_team {
            report.team = Some(self.notify_team_of_new_note(note)?);
        }
        if note.notify_author {
            report.author = self.notify_commit_author(note)?;
        }
        Ok(report)
    }

    /// Emails every team member except the note author, using the template
    /// for the note's parent kind.
    ///
    /// Returns one receipt per recipient in team order; empty for snippet and
    /// unknown parents.
    pub fn notify_team_of_new_note(&self, note: &Note) -> NotifierResult<Vec<DeliveryReceipt>> {
        let compose: fn(&M, UserId, NoteId) -> M::Message = match note.noteable_kind {
            NoteableKind::Commit => M::note_commit_email,
            NoteableKind::Issue => M::note_issue_email,
            NoteableKind::Wiki => M::note_wiki_email,
            NoteableKind::MergeRequest => M::note_merge_request_email,
            NoteableKind::Wall => M::note_wall_email,
            NoteableKind::Snippet | NoteableKind::Unknown => {
                debug!(
                    "event=team_fanout_skipped module=notifier status=ok note_id={} kind={}",
                    note.id, note.noteable_kind
                );
                return Ok(Vec::new());
            }
        };

        let recipients = self.team_without_note_author(note)?;
        let mut receipts = Vec::with_capacity(recipients.len());
        for recipient in &recipients {
            receipts.push(compose(&self.mailer, recipient.id, note.id).deliver()?);
        }

        info!(
            "event=team_fanout module=notifier status=ok note_id={} kind={} recipients={}",
            note.id,
            note.noteable_kind,
            receipts.len()
        );
        Ok(receipts)
    }

    /// Current team of the note's project without the note author.
    pub fn team_without_note_author(&self, note: &Note) -> NotifierResult<Vec<User>> {
        let team = self.directory.team_of(note.project)?;
        Ok(exclude_author(team, note.author))
    }

    fn notify_commit_author(&self, note: &Note) -> NotifierResult<Option<DeliveryReceipt>> {
        let Some(commit_author) = note.commit_author else {
            debug!(
                "event=author_notify module=notifier status=skipped note_id={} reason=no_commit_author",
                note.id
            );
            return Ok(None);
        };

        let receipt = self
            .mailer
            .note_commit_email(commit_author.id, note.id)
            .deliver()?;
        info!(
            "event=author_notify module=notifier status=ok note_id={} recipient_id={}",
            note.id, commit_author.id
        );
        Ok(Some(receipt))
    }
}

/// Removes every member whose id matches `author`, keeping order.
pub fn exclude_author(team: impl IntoIterator<Item = User>, author: User) -> Vec<User> {
    team.into_iter()
        .filter(|member| member.id != author.id)
        .collect()
}
