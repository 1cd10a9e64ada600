//! Explicit note-created hook registry.
//!
//! The create path owns one registry, built at process start, and calls
//! `publish` once per successfully persisted note. Nothing registers itself.

use crate::mailer::Notify;
use crate::model::note::Note;
use crate::repo::team_repo::TeamDirectory;
use crate::service::notifier::NoteNotifier;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HookResult<T> = Result<T, HookError>;

/// Registration and publish errors.
#[derive(Debug)]
pub enum HookError {
    InvalidHookId(String),
    DuplicateHookId(String),
    /// A hook failed while handling a note; later hooks were not run.
    HookFailed {
        hook_id: String,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHookId(value) => write!(f, "hook id is invalid: `{value}`"),
            Self::DuplicateHookId(value) => write!(f, "hook id already registered: {value}"),
            Self::HookFailed { hook_id, source } => {
                write!(f, "hook `{hook_id}` failed: {source}")
            }
        }
    }
}

impl Error for HookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::HookFailed { source, .. } => Some(source.as_ref()),
            Self::InvalidHookId(_) | Self::DuplicateHookId(_) => None,
        }
    }
}

/// Subscriber invoked after a note is created.
pub trait NoteCreatedHook {
    /// Stable id, unique within one registry.
    fn hook_id(&self) -> &str;
    fn on_note_created(&self, note: &Note) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl<M, D> NoteCreatedHook for NoteNotifier<M, D>
where
    M: Notify,
    D: TeamDirectory,
{
    fn hook_id(&self) -> &str {
        "note_notifier"
    }

    fn on_note_created(&self, note: &Note) -> Result<(), Box<dyn Error + Send + Sync>> {
        NoteNotifier::on_note_created(self, note)
            .map(|_| ())
            .map_err(Into::into)
    }
}

/// Ordered list of note-created subscribers.
#[derive(Default)]
pub struct NoteHookRegistry<'a> {
    hooks: Vec<Box<dyn NoteCreatedHook + 'a>>,
}

impl<'a> NoteHookRegistry<'a> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Appends one hook. Hooks run in registration order.
    pub fn register(&mut self, hook: Box<dyn NoteCreatedHook + 'a>) -> HookResult<()> {
        let hook_id = hook.hook_id().trim().to_string();
        if !is_valid_hook_id(&hook_id) {
            return Err(HookError::InvalidHookId(hook_id));
        }
        if self.hooks.iter().any(|existing| existing.hook_id() == hook_id) {
            return Err(HookError::DuplicateHookId(hook_id));
        }
        self.hooks.push(hook);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook ids in registration order.
    pub fn hook_ids(&self) -> Vec<String> {
        self.hooks
            .iter()
            .map(|hook| hook.hook_id().to_string())
            .collect()
    }

    /// Runs every hook once for `note`, stopping at the first failure.
    pub fn publish(&self, note: &Note) -> HookResult<()> {
        info!(
            "event=note_created_publish module=hooks status=start note_id={} hooks={}",
            note.id,
            self.hooks.len()
        );
        for hook in &self.hooks {
            if let Err(source) = hook.on_note_created(note) {
                error!(
                    "event=note_created_publish module=hooks status=error note_id={} hook_id={} error={}",
                    note.id,
                    hook.hook_id(),
                    source
                );
                return Err(HookError::HookFailed {
                    hook_id: hook.hook_id().to_string(),
                    source,
                });
            }
        }
        Ok(())
    }
}

fn is_valid_hook_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::{HookError, NoteCreatedHook, NoteHookRegistry};
    use crate::model::note::{Note, NoteableKind, ProjectId, User};
    use std::cell::RefCell;
    use std::error::Error;

    struct Probe<'a> {
        id: &'static str,
        calls: &'a RefCell<Vec<&'static str>>,
        fail: bool,
    }

    impl NoteCreatedHook for Probe<'_> {
        fn hook_id(&self) -> &str {
            self.id
        }

        fn on_note_created(&self, _note: &Note) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.calls.borrow_mut().push(self.id);
            if self.fail {
                return Err("probe failure".into());
            }
            Ok(())
        }
    }

    fn sample_note() -> Note {
        Note::new(1, NoteableKind::Issue, User::new(1), ProjectId(1))
    }

    #[test]
    fn publish_runs_hooks_in_registration_order() {
        let calls = RefCell::new(Vec::new());
        let mut registry = NoteHookRegistry::new();
        for id in ["first", "second"] {
            registry
                .register(Box::new(Probe {
                    id,
                    calls: &calls,
                    fail: false,
                }))
                .unwrap();
        }

        registry.publish(&sample_note()).unwrap();
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
        assert_eq!(registry.hook_ids(), vec!["first", "second"]);
    }

    #[test]
    fn publish_stops_at_first_failure() {
        let calls = RefCell::new(Vec::new());
        let mut registry = NoteHookRegistry::new();
        registry
            .register(Box::new(Probe {
                id: "broken",
                calls: &calls,
                fail: true,
            }))
            .unwrap();
        registry
            .register(Box::new(Probe {
                id: "after",
                calls: &calls,
                fail: false,
            }))
            .unwrap();

        let err = registry.publish(&sample_note()).unwrap_err();
        assert!(matches!(err, HookError::HookFailed { ref hook_id, .. } if hook_id == "broken"));
        assert_eq!(*calls.borrow(), vec!["broken"]);
    }

    #[test]
    fn rejects_duplicate_and_invalid_ids() {
        let calls = RefCell::new(Vec::new());
        let mut registry = NoteHookRegistry::new();
        let probe = |id| {
            Box::new(Probe {
                id,
                calls: &calls,
                fail: false,
            })
        };

        registry.register(probe("audit")).unwrap();
        assert!(matches!(
            registry.register(probe("audit")),
            Err(HookError::DuplicateHookId(_))
        ));
        assert!(matches!(
            registry.register(probe("  ")),
            Err(HookError::InvalidHookId(_))
        ));
        assert!(matches!(
            registry.register(probe("Has Space")),
            Err(HookError::InvalidHookId(_))
        ));
        assert_eq!(registry.len(), 1);
    }
}
