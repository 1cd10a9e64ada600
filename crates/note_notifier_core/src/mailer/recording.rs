//! In-memory mailer that records delivered messages.

use super::{Deliver, DeliveryReceipt, MailError, MailResult, MailTemplate, Notify};
use crate::model::note::{NoteId, UserId};
use std::sync::{Arc, Mutex};

/// Mailer that keeps every delivered message in memory.
///
/// Clones share one log, so a test can keep a handle while the notifier
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    delivered: Arc<Mutex<Vec<DeliveryReceipt>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered messages in delivery order.
    pub fn delivered(&self) -> Vec<DeliveryReceipt> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered().len()
    }

    /// Number of delivered messages that used `template`.
    pub fn count_for(&self, template: MailTemplate) -> usize {
        self.delivered()
            .iter()
            .filter(|receipt| receipt.template == template)
            .count()
    }
}

impl Notify for RecordingMailer {
    type Message = RecordedMessage;

    fn compose(&self, template: MailTemplate, recipient: UserId, note: NoteId) -> RecordedMessage {
        RecordedMessage {
            log: Arc::clone(&self.delivered),
            template,
            recipient,
            note,
        }
    }
}

/// Message composed by `RecordingMailer`.
#[derive(Debug)]
pub struct RecordedMessage {
    log: Arc<Mutex<Vec<DeliveryReceipt>>>,
    template: MailTemplate,
    recipient: UserId,
    note: NoteId,
}

impl Deliver for RecordedMessage {
    fn deliver(self) -> MailResult<DeliveryReceipt> {
        let receipt = DeliveryReceipt::new(self.template, self.recipient, self.note);
        self.log
            .lock()
            .map_err(|_| MailError::Unavailable("recording log lock poisoned".to_string()))?
            .push(receipt.clone());
        Ok(receipt)
    }
}
