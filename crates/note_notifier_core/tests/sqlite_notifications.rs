use note_notifier_core::db::migrations::latest_version;
use note_notifier_core::db::{open_db, open_db_in_memory, DbError};
use note_notifier_core::{
    HookError, MailError, MailTemplate, Note, NoteHookRegistry, NoteId, NoteNotifier, NoteableKind,
    ProjectId, RepoError, SqliteOutboxMailer, SqliteTeamRepository, TeamDirectory, User, UserId,
};
use rusqlite::Connection;

const PROJECT: ProjectId = ProjectId(3);

fn seed_team(conn: &Connection, members: &[i64]) {
    let repo = SqliteTeamRepository::try_new(conn).unwrap();
    for member in members {
        repo.add_member(PROJECT, UserId(*member)).unwrap();
    }
}

#[test]
fn open_db_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteTeamRepository::try_new(&conn),
        Err(RepoError::Db(DbError::NotMigrated {
            db_version: 0,
            ..
        }))
    ));
    assert!(matches!(
        SqliteOutboxMailer::try_new(&conn),
        Err(MailError::Storage(DbError::NotMigrated { .. }))
    ));
}

#[test]
fn team_membership_is_ordered_and_idempotent() {
    let conn = open_db_in_memory().unwrap();
    seed_team(&conn, &[5, 2, 5, 8]);
    let repo = SqliteTeamRepository::try_new(&conn).unwrap();

    assert_eq!(
        repo.team_of(PROJECT).unwrap(),
        vec![User::new(5), User::new(2), User::new(8)]
    );
    assert!(repo.team_of(ProjectId(404)).unwrap().is_empty());

    repo.remove_member(PROJECT, UserId(2)).unwrap();
    assert!(matches!(
        repo.remove_member(PROJECT, UserId(2)),
        Err(RepoError::MemberNotFound { .. })
    ));
    assert_eq!(
        repo.team_of(PROJECT).unwrap(),
        vec![User::new(5), User::new(8)]
    );
}

#[test]
fn published_note_lands_in_outbox() {
    let conn = open_db_in_memory().unwrap();
    seed_team(&conn, &[1, 2, 4]);

    let team = SqliteTeamRepository::try_new(&conn).unwrap();
    let mailer = SqliteOutboxMailer::try_new(&conn).unwrap();
    let mut registry = NoteHookRegistry::new();
    registry
        .register(Box::new(NoteNotifier::new(mailer, team)))
        .unwrap();
    assert_eq!(registry.hook_ids(), vec!["note_notifier"]);

    let note = Note::new(42, NoteableKind::Commit, User::new(4), PROJECT)
        .with_team_notification(true)
        .with_author_notification(true)
        .with_commit_author(Some(User::new(7)));
    registry.publish(&note).unwrap();

    let outbox = mailer.list_for_note(NoteId(42)).unwrap();
    let recipients: Vec<UserId> = outbox.iter().map(|entry| entry.recipient).collect();
    assert_eq!(recipients, vec![UserId(1), UserId(2), UserId(7)]);
    assert!(outbox
        .iter()
        .all(|entry| entry.template == MailTemplate::NoteCommitEmail));
}

#[test]
fn team_changes_are_seen_at_notification_time() {
    let conn = open_db_in_memory().unwrap();
    seed_team(&conn, &[1, 4]);
    let team = SqliteTeamRepository::try_new(&conn).unwrap();
    let mailer = SqliteOutboxMailer::try_new(&conn).unwrap();
    let notifier = NoteNotifier::new(mailer, &team);
    let note = Note::new(8, NoteableKind::Issue, User::new(4), PROJECT).with_team_notification(true);

    notifier.on_note_created(&note).unwrap();
    team.add_member(PROJECT, UserId(6)).unwrap();
    notifier.on_note_created(&note).unwrap();

    let recipients: Vec<UserId> = mailer
        .list_outbox()
        .unwrap()
        .iter()
        .map(|entry| entry.recipient)
        .collect();
    assert_eq!(recipients, vec![UserId(1), UserId(1), UserId(6)]);
}

#[test]
fn snippet_note_leaves_outbox_empty() {
    let conn = open_db_in_memory().unwrap();
    seed_team(&conn, &[1, 2]);
    let team = SqliteTeamRepository::try_new(&conn).unwrap();
    let mailer = SqliteOutboxMailer::try_new(&conn).unwrap();
    let mut registry = NoteHookRegistry::new();
    registry
        .register(Box::new(NoteNotifier::new(mailer, team)))
        .unwrap();

    let note =
        Note::new(11, NoteableKind::Snippet, User::new(9), PROJECT).with_team_notification(true);
    registry.publish(&note).unwrap();

    assert!(mailer.list_outbox().unwrap().is_empty());
}

#[test]
fn outbox_failure_surfaces_as_hook_failure() {
    let conn = open_db_in_memory().unwrap();
    seed_team(&conn, &[1]);
    let team = SqliteTeamRepository::try_new(&conn).unwrap();
    let mailer = SqliteOutboxMailer::try_new(&conn).unwrap();
    conn.execute_batch("DROP TABLE mail_outbox;").unwrap();

    let mut registry = NoteHookRegistry::new();
    registry
        .register(Box::new(NoteNotifier::new(mailer, team)))
        .unwrap();
    let note = Note::new(1, NoteableKind::Wall, User::new(2), PROJECT).with_team_notification(true);

    let err = registry.publish(&note).unwrap_err();
    assert!(matches!(err, HookError::HookFailed { ref hook_id, .. } if hook_id == "note_notifier"));
}

#[test]
fn file_database_keeps_outbox_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notifier.db");
    {
        let conn = open_db(&path).unwrap();
        seed_team(&conn, &[1, 2]);
        let team = SqliteTeamRepository::try_new(&conn).unwrap();
        let mailer = SqliteOutboxMailer::try_new(&conn).unwrap();
        let note = Note::new(3, NoteableKind::Wiki, User::new(2), PROJECT).with_team_notification(true);
        NoteNotifier::new(mailer, team).on_note_created(&note).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let outbox = SqliteOutboxMailer::try_new(&conn).unwrap().list_outbox().unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].recipient, UserId(1));
    assert_eq!(outbox[0].template, MailTemplate::NoteWikiEmail);
}

#[test]
fn list_for_note_returns_only_that_note() {
    let conn = open_db_in_memory().unwrap();
    seed_team(&conn, &[1, 2]);
    let team = SqliteTeamRepository::try_new(&conn).unwrap();
    let mailer = SqliteOutboxMailer::try_new(&conn).unwrap();
    let notifier = NoteNotifier::new(mailer, &team);

    for (id, kind) in [(20, NoteableKind::Issue), (21, NoteableKind::Wall)] {
        let note = Note::new(id, kind, User::new(9), PROJECT).with_team_notification(true);
        notifier.on_note_created(&note).unwrap();
    }

    let entries = mailer.list_for_note(NoteId(21)).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.note == NoteId(21)));
    assert!(entries
        .iter()
        .all(|entry| entry.template == MailTemplate::NoteWallEmail));
    assert_eq!(mailer.list_outbox().unwrap().len(), 4);
    assert!(mailer.list_for_note(NoteId(99)).unwrap().is_empty());
}
