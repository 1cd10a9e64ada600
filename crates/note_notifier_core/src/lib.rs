//! Note-created notification core.
//! Decides which users hear about a new note and hands their emails to the
//! mailer.

pub mod db;
pub mod hooks;
pub mod logging;
pub mod mailer;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;

pub use hooks::{HookError, HookResult, NoteCreatedHook, NoteHookRegistry};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mailer::{
    Deliver, DeliveryReceipt, MailError, MailResult, MailTemplate, Notify, OutboxEntry,
    RecordingMailer, SqliteOutboxMailer,
};
pub use model::note::{
    Note, NoteId, NoteValidationError, NoteableKind, ProjectId, User, UserId,
};
pub use repo::team_repo::{InMemoryTeamDirectory, SqliteTeamRepository, TeamDirectory};
pub use repo::{RepoError, RepoResult};
pub use service::notifier::{
    exclude_author, NotificationReport, NoteNotifier, NotifierError, NotifierResult,
};
pub use settings::{NotifierSettings, SettingsError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
