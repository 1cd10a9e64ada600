//! Read-side collaborators the notifier consults at notification time.
//!
//! # Responsibility
//! - Define the team lookup contract used by the notifier.
//! - Isolate SQLite query details from notification orchestration.
//!
//! # Invariants
//! - Team reads are point-in-time snapshots; nothing is cached on notes.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::note::{ProjectId, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod team_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for team membership reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// The membership row targeted by a write does not exist.
    MemberNotFound { project: ProjectId, user: UserId },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MemberNotFound { project, user } => {
                write!(f, "user {user} is not a member of project {project}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MemberNotFound { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
