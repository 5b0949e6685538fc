//! Record of mutations a dry run would have performed.
//!
//! Entries are logged at info level as they are recorded and can be printed
//! once the command finishes. Nothing is persisted.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::api::{EntityId, EntityKind};

/// One intended mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// An entity that does not exist yet would be created.
    CreateEntity { kind: EntityKind, name: String },
    /// A file would be uploaded with the given metadata.
    Upload {
        file: PathBuf,
        title: String,
        created: Option<String>,
        tags: Vec<EntityId>,
        correspondent: Option<EntityId>,
        document_type: Option<EntityId>,
    },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateEntity { kind, name } => {
                write!(f, "create {} '{}'", kind.label().to_lowercase(), name)
            }
            Self::Upload {
                file,
                title,
                created,
                tags,
                correspondent,
                document_type,
            } => {
                write!(f, "upload {} as '{}'", file.display(), title)?;
                if let Some(created) = created {
                    write!(f, ", created {created}")?;
                }
                if !tags.is_empty() {
                    let ids: Vec<String> = tags.iter().map(ToString::to_string).collect();
                    write!(f, ", tags [{}]", ids.join(", "))?;
                }
                if let Some(id) = correspondent {
                    write!(f, ", correspondent {id}")?;
                }
                if let Some(id) = document_type {
                    write!(f, ", document type {id}")?;
                }
                Ok(())
            }
        }
    }
}

/// Ordered, append-only list of planned actions.
#[derive(Debug, Default)]
pub struct DryRunLog {
    entries: Mutex<Vec<PlannedAction>>,
}

impl DryRunLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action. Repeated entity creations of the same name are
    /// recorded once; returns whether the action was new.
    pub fn record(&self, action: PlannedAction) -> bool {
        let mut entries = self.lock();
        if matches!(action, PlannedAction::CreateEntity { .. }) && entries.contains(&action) {
            return false;
        }
        log::info!("Would {action}");
        entries.push(action);
        true
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<PlannedAction> {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PlannedAction>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
