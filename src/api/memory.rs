//! In-memory Paperless server.
//!
//! Behaves like the HTTP backend from the engine's point of view and records
//! every call, so tests can assert how often listings, creations and uploads
//! happened. Upload failures can be injected per file name.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ApiError, ApiResult, DocumentDraft, Entity, EntityDraft, EntityId, EntityKind, PaperlessApi,
    TaskId,
};

#[derive(Default)]
struct State {
    entities: HashMap<EntityKind, Vec<Entity>>,
    next_id: u64,
    list_calls: HashMap<EntityKind, usize>,
    created: Vec<(EntityKind, EntityDraft)>,
    uploads: Vec<DocumentDraft>,
    upload_attempts: HashMap<String, usize>,
    upload_failures: HashMap<String, VecDeque<ApiError>>,
    deny_uploads: bool,
    closed: bool,
}

/// In-memory backend for [`PaperlessApi`].
#[derive(Default)]
pub struct MemoryApi {
    state: Mutex<State>,
}

impl MemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing entity. Listing returns entities in insertion order.
    #[must_use]
    pub fn with_entity(self, kind: EntityKind, id: u64, name: &str) -> Self {
        {
            let mut state = self.lock();
            state.next_id = state.next_id.max(id);
            state
                .entities
                .entry(kind)
                .or_default()
                .push(Entity::new(id, name));
        }
        self
    }

    /// Queue errors returned by the next uploads of `file_name`, in order.
    pub fn fail_uploads(&self, file_name: &str, errors: Vec<ApiError>) {
        self.lock()
            .upload_failures
            .entry(file_name.to_string())
            .or_default()
            .extend(errors);
    }

    /// Make every upload fail with HTTP 403.
    pub fn deny_uploads(&self) {
        self.lock().deny_uploads = true;
    }

    /// Number of full listings requested for `kind`.
    #[must_use]
    pub fn list_calls(&self, kind: EntityKind) -> usize {
        self.lock().list_calls.get(&kind).copied().unwrap_or(0)
    }

    /// Drafts saved so far, in order.
    #[must_use]
    pub fn created(&self) -> Vec<(EntityKind, EntityDraft)> {
        self.lock().created.clone()
    }

    /// Names of entities of `kind` created so far.
    #[must_use]
    pub fn created_names(&self, kind: EntityKind) -> Vec<String> {
        self.lock()
            .created
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, d)| d.name.clone())
            .collect()
    }

    /// Successfully uploaded documents.
    #[must_use]
    pub fn uploads(&self) -> Vec<DocumentDraft> {
        self.lock().uploads.clone()
    }

    /// Upload attempts (successful or not) for `file_name`.
    #[must_use]
    pub fn upload_attempts(&self, file_name: &str) -> usize {
        self.lock()
            .upload_attempts
            .get(file_name)
            .copied()
            .unwrap_or(0)
    }

    /// Whether [`PaperlessApi::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl PaperlessApi for MemoryApi {
    async fn list_all(&self, kind: EntityKind) -> ApiResult<Vec<Entity>> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        *state.list_calls.entry(kind).or_default() += 1;
        Ok(state.entities.get(&kind).cloned().unwrap_or_default())
    }

    async fn save_draft(&self, kind: EntityKind, draft: &EntityDraft) -> ApiResult<EntityId> {
        // Let concurrent resolvers interleave like they would over the network.
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state
            .entities
            .entry(kind)
            .or_default()
            .push(Entity::new(id, draft.name.clone()));
        state.created.push((kind, draft.clone()));
        Ok(EntityId(id))
    }

    async fn upload_document(&self, draft: &DocumentDraft) -> ApiResult<TaskId> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        *state
            .upload_attempts
            .entry(draft.file_name.clone())
            .or_default() += 1;

        if state.deny_uploads {
            return Err(ApiError::Denied {
                status: 403,
                message: "You do not have permission to perform this action.".into(),
            });
        }
        if let Some(err) = state
            .upload_failures
            .get_mut(&draft.file_name)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        state.uploads.push(draft.clone());
        Ok(TaskId(format!("task-{}", state.uploads.len())))
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}
