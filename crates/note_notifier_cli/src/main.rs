//! Driver executable for the note notifier.
//!
//! # Responsibility
//! - Wire settings, logging, storage and the hook registry at startup.
//! - Replay note-created events against a local database without a host
//!   application.

use clap::{Parser, Subcommand};
use log::info;
use note_notifier_core::db::open_db;
use note_notifier_core::{
    core_version, init_logging, Note, NoteHookRegistry, NoteNotifier, NotifierSettings, ProjectId,
    SqliteOutboxMailer, SqliteTeamRepository, UserId,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "note-notifier", version, about = "Note-created email notifier")]
struct Cli {
    /// JSON settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a user to a project team.
    AddMember {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        user: i64,
    },
    /// Remove a user from a project team.
    RemoveMember {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        user: i64,
    },
    /// Publish one note-created event read from a JSON file.
    Notify {
        #[arg(long)]
        note: PathBuf,
    },
    /// List queued outbox messages.
    Outbox,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = match &cli.settings {
        Some(path) => NotifierSettings::from_file(path)?,
        None => NotifierSettings::default(),
    };
    if let Some(log_dir) = &settings.log_dir {
        init_logging(&settings.log_level, &log_dir.to_string_lossy())?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let conn = open_db(settings.resolved_db_path())?;
    let team = SqliteTeamRepository::try_new(&conn)?;

    match cli.command {
        Command::AddMember { project, user } => {
            team.add_member(ProjectId(project), UserId(user))?;
            println!("added user={user} project={project}");
        }
        Command::RemoveMember { project, user } => {
            team.remove_member(ProjectId(project), UserId(user))?;
            println!("removed user={user} project={project}");
        }
        Command::Notify { note } => {
            let raw = std::fs::read_to_string(&note)
                .map_err(|err| format!("failed to read note `{}`: {err}", note.display()))?;
            let note: Note = serde_json::from_str(&raw)?;

            let mailer = SqliteOutboxMailer::try_new(&conn)?;
            let mut registry = NoteHookRegistry::new();
            registry.register(Box::new(NoteNotifier::new(mailer, &team)))?;
            registry.publish(&note)?;

            let queued = mailer.list_for_note(note.id)?;
            println!("note={} queued={}", note.id, queued.len());
            for entry in queued {
                println!(
                    "  {} template={} recipient={}",
                    entry.message_id, entry.template, entry.recipient
                );
            }
        }
        Command::Outbox => {
            let mailer = SqliteOutboxMailer::try_new(&conn)?;
            for entry in mailer.list_outbox()? {
                println!(
                    "{} queued_at={} template={} recipient={} note={}",
                    entry.message_id, entry.queued_at, entry.template, entry.recipient, entry.note
                );
            }
        }
    }

    Ok(())
}
