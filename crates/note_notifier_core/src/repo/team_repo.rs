//! Team membership contracts and implementations.
//!
//! # Responsibility
//! - Resolve the members of a project when a note is created.
//! - Provide membership writes for wiring and tests.
//!
//! # Invariants
//! - `team_of` returns members in join order, ties broken by insertion.
//! - An unknown project has an empty team, not an error.

use crate::db::migrations::ensure_migrated;
use crate::model::note::{ProjectId, User, UserId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Lookup of project team members.
pub trait TeamDirectory {
    /// Returns the current members of `project`.
    fn team_of(&self, project: ProjectId) -> RepoResult<Vec<User>>;
}

impl<T: TeamDirectory + ?Sized> TeamDirectory for &T {
    fn team_of(&self, project: ProjectId) -> RepoResult<Vec<User>> {
        (**self).team_of(project)
    }
}

/// SQLite-backed team directory over `project_members`.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `Db(DbError::NotMigrated)` when migrations have not run.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        Ok(Self { conn })
    }

    /// Adds `user` to the team of `project`. Re-adding is a no-op.
    pub fn add_member(&self, project: ProjectId, user: UserId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO project_members (project_id, user_id)
             VALUES (?1, ?2);",
            params![project.0, user.0],
        )?;
        Ok(())
    }

    /// Removes `user` from the team of `project`.
    ///
    /// # Errors
    /// - `MemberNotFound` when the user is not a member.
    pub fn remove_member(&self, project: ProjectId, user: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM project_members
             WHERE project_id = ?1
               AND user_id = ?2;",
            params![project.0, user.0],
        )?;
        if changed == 0 {
            return Err(RepoError::MemberNotFound { project, user });
        }
        Ok(())
    }
}

impl TeamDirectory for SqliteTeamRepository<'_> {
    fn team_of(&self, project: ProjectId) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id
             FROM project_members
             WHERE project_id = ?1
             ORDER BY joined_at ASC, rowid ASC;",
        )?;
        let rows = stmt.query_map([project.0], |row| row.get::<_, i64>(0))?;

        let mut team = Vec::new();
        for user_id in rows {
            team.push(User::new(user_id?));
        }
        Ok(team)
    }
}

/// In-memory team directory for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeamDirectory {
    teams: BTreeMap<ProjectId, Vec<User>>,
}

impl InMemoryTeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole team of `project`.
    pub fn set_team(&mut self, project: ProjectId, members: Vec<User>) {
        self.teams.insert(project, members);
    }

    /// Builder form of `set_team`.
    pub fn with_team(mut self, project: ProjectId, members: Vec<User>) -> Self {
        self.set_team(project, members);
        self
    }
}

impl TeamDirectory for InMemoryTeamDirectory {
    fn team_of(&self, project: ProjectId) -> RepoResult<Vec<User>> {
        Ok(self.teams.get(&project).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryTeamDirectory, TeamDirectory};
    use crate::model::note::{ProjectId, User};

    #[test]
    fn in_memory_directory_returns_members_in_order() {
        let directory = InMemoryTeamDirectory::new().with_team(
            ProjectId(7),
            vec![User::new(3), User::new(1), User::new(2)],
        );

        let team = directory.team_of(ProjectId(7)).unwrap();
        assert_eq!(team, vec![User::new(3), User::new(1), User::new(2)]);
    }

    #[test]
    fn unknown_project_has_empty_team() {
        let directory = InMemoryTeamDirectory::new();
        assert!(directory.team_of(ProjectId(99)).unwrap().is_empty());
    }
}
