//! SQLite outbox mailer.
//!
//! # Responsibility
//! - Persist delivered note emails into `mail_outbox` for the transport.
//!
//! # Invariants
//! - One `deliver` call inserts exactly one row.
//! - Rows are never updated by this module.

use super::{Deliver, DeliveryReceipt, MailError, MailResult, MailTemplate, Notify};
use crate::db::migrations::ensure_migrated;
use crate::model::note::{NoteId, UserId};
use log::{debug, error};
use rusqlite::{params, Connection, Rows};
use uuid::Uuid;

/// Row read back from `mail_outbox`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub message_id: Uuid,
    pub template: MailTemplate,
    pub recipient: UserId,
    pub note: NoteId,
    /// Enqueue timestamp in epoch milliseconds.
    pub queued_at: i64,
}

/// Mailer whose delivery step enqueues into the outbox table.
#[derive(Debug, Clone, Copy)]
pub struct SqliteOutboxMailer<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutboxMailer<'conn> {
    /// Constructs a mailer over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> MailResult<Self> {
        ensure_migrated(conn)?;
        Ok(Self { conn })
    }

    /// Lists queued messages oldest first.
    pub fn list_outbox(&self) -> MailResult<Vec<OutboxEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, template, recipient_id, note_id, queued_at
             FROM mail_outbox
             ORDER BY queued_at ASC, rowid ASC;",
        )?;
        let rows = stmt.query([])?;
        read_entries(rows)
    }

    /// Lists queued messages for one note, oldest first.
    pub fn list_for_note(&self, note: NoteId) -> MailResult<Vec<OutboxEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, template, recipient_id, note_id, queued_at
             FROM mail_outbox
             WHERE note_id = ?1
             ORDER BY queued_at ASC, rowid ASC;",
        )?;
        let rows = stmt.query([note.0])?;
        read_entries(rows)
    }
}

fn read_entries(mut rows: Rows<'_>) -> MailResult<Vec<OutboxEntry>> {
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let message_id: String = row.get("message_id")?;
        let template: String = row.get("template")?;
        entries.push(OutboxEntry {
            message_id: Uuid::parse_str(&message_id).map_err(|err| {
                MailError::InvalidData(format!("invalid message id `{message_id}`: {err}"))
            })?,
            template: MailTemplate::parse(&template)
                .ok_or_else(|| MailError::InvalidData(format!("unknown template `{template}`")))?,
            recipient: UserId(row.get("recipient_id")?),
            note: NoteId(row.get("note_id")?),
            queued_at: row.get("queued_at")?,
        });
    }
    Ok(entries)
}

impl<'conn> Notify for SqliteOutboxMailer<'conn> {
    type Message = OutboxMessage<'conn>;

    fn compose(
        &self,
        template: MailTemplate,
        recipient: UserId,
        note: NoteId,
    ) -> OutboxMessage<'conn> {
        OutboxMessage {
            conn: self.conn,
            template,
            recipient,
            note,
        }
    }
}

/// Message composed by `SqliteOutboxMailer`.
#[derive(Debug)]
pub struct OutboxMessage<'conn> {
    conn: &'conn Connection,
    template: MailTemplate,
    recipient: UserId,
    note: NoteId,
}

impl Deliver for OutboxMessage<'_> {
    fn deliver(self) -> MailResult<DeliveryReceipt> {
        let receipt = DeliveryReceipt::new(self.template, self.recipient, self.note);
        let inserted = self.conn.execute(
            "INSERT INTO mail_outbox (message_id, template, recipient_id, note_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                receipt.message_id.to_string(),
                receipt.template.as_str(),
                receipt.recipient.0,
                receipt.note.0,
            ],
        );

        match inserted {
            Ok(_) => {
                debug!(
                    "event=outbox_enqueue module=mailer status=ok template={} recipient_id={} note_id={}",
                    receipt.template, receipt.recipient, receipt.note
                );
                Ok(receipt)
            }
            Err(err) => {
                error!(
                    "event=outbox_enqueue module=mailer status=error template={} note_id={} error={}",
                    receipt.template, receipt.note, err
                );
                Err(err.into())
            }
        }
    }
}
