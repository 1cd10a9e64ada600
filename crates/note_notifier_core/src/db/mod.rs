//! Storage for the two tables the notifier owns.
//!
//! `project_members` answers "who is on this team right now" when a note is
//! created; `mail_outbox` receives one row per delivered email. Both
//! `SqliteTeamRepository` and `SqliteOutboxMailer` borrow a connection opened
//! here and refuse one whose schema is not exactly current
//! (`DbError::NotMigrated` / `UnsupportedSchemaVersion`).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap and schema errors.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Connection schema is older than this binary expects.
    NotMigrated { db_version: u32, required: u32 },
    /// Connection schema is newer than this binary understands.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NotMigrated {
                db_version,
                required,
            } => write!(
                f,
                "notifier schema version {db_version} is behind {required}; open the database through db::open_db"
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "notifier schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NotMigrated { .. } | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
