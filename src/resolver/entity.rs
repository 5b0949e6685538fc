//! Generic name → ID resolution with on-demand creation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use rand::Rng;
use tokio::sync::OnceCell;

use super::EntityCache;
use crate::api::{
    CreateArgs, EntityDraft, EntityId, EntityKind, MatchingAlgorithm, PaperlessApi,
    PermissionTable,
};
use crate::dry_run::{DryRunLog, PlannedAction};
use crate::error::{PngxError, Result};

/// What the resolver needs to know about an entity kind.
#[derive(Clone, Copy)]
pub struct EntitySpec {
    pub kind: EntityKind,
    /// Whether missing entities of this kind may be created.
    pub creatable: bool,
    /// Default creation fields, evaluated anew for every creation.
    pub defaults: fn() -> CreateArgs,
}

impl std::fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySpec")
            .field("kind", &self.kind)
            .field("creatable", &self.creatable)
            .finish_non_exhaustive()
    }
}

impl EntitySpec {
    /// The descriptor for `kind`. Users and groups are never created.
    #[must_use]
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Tag => Self {
                kind,
                creatable: true,
                defaults: tag_defaults,
            },
            EntityKind::Correspondent | EntityKind::DocumentType => Self {
                kind,
                creatable: true,
                defaults: auto_match_defaults,
            },
            EntityKind::User | EntityKind::Group => Self {
                kind,
                creatable: false,
                defaults: CreateArgs::default,
            },
        }
    }
}

fn tag_defaults() -> CreateArgs {
    CreateArgs {
        matching_algorithm: Some(MatchingAlgorithm::None),
        match_text: Some(String::new()),
        is_insensitive: Some(true),
        is_inbox_tag: Some(false),
        color: Some(random_color()),
    }
}

fn auto_match_defaults() -> CreateArgs {
    CreateArgs {
        matching_algorithm: Some(MatchingAlgorithm::Auto),
        match_text: Some(String::new()),
        is_insensitive: Some(true),
        ..Default::default()
    }
}

/// A random `#rrggbb` colour.
#[must_use]
pub fn random_color() -> String {
    format!("#{:06x}", rand::thread_rng().gen_range(0..=0xff_ffffu32))
}

/// Owner, permissions and field overrides applied when an entity is created.
#[derive(Debug, Clone, Default)]
pub struct Creation {
    /// Replaces the kind's defaults when set.
    pub args: Option<CreateArgs>,
    pub owner: Option<EntityId>,
    pub permissions: Option<PermissionTable>,
}

/// Resolves names of one entity kind to server IDs.
///
/// The first lookup lists every entity of the kind; later lookups hit the
/// cache. Concurrent attempts to create the same missing name share a single
/// create request.
pub struct EntityResolver {
    spec: EntitySpec,
    api: Arc<dyn PaperlessApi>,
    cache: EntityCache,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<EntityId>>>>,
    dry_run: Option<Arc<DryRunLog>>,
    planned: Mutex<HashMap<String, EntityId>>,
    placeholders: Arc<AtomicU32>,
}

impl EntityResolver {
    #[must_use]
    pub fn new(spec: EntitySpec, api: Arc<dyn PaperlessApi>) -> Self {
        Self {
            spec,
            api,
            cache: EntityCache::new(),
            in_flight: Mutex::new(HashMap::new()),
            dry_run: None,
            planned: Mutex::new(HashMap::new()),
            placeholders: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Record would-be creations in `log` instead of performing them.
    ///
    /// `placeholders` numbers the made-up IDs; share it between resolvers
    /// so placeholders stay unique across kinds.
    #[must_use]
    pub fn with_dry_run(mut self, log: Arc<DryRunLog>, placeholders: Arc<AtomicU32>) -> Self {
        self.dry_run = Some(log);
        self.placeholders = placeholders;
        self
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.spec.kind
    }

    /// Resolve `name` to its ID.
    ///
    /// On a cache miss the entity is created when `make` is set and the kind
    /// allows it; otherwise [`PngxError::EntityNotFound`] is returned. In dry
    /// run mode a creation yields a placeholder ID and a [`DryRunLog`] entry.
    pub async fn resolve(&self, name: &str, make: bool, creation: &Creation) -> Result<EntityId> {
        self.ensure_loaded(false).await?;

        if let Some(id) = self.cache.get(name) {
            log::trace!("{} '{}' is {}", self.spec.kind, name, id);
            return Ok(id);
        }

        if !make || !self.spec.creatable {
            return Err(self.not_found(name));
        }

        if let Some(log) = &self.dry_run {
            return Ok(self.plan(name, log));
        }

        let cell = self.in_flight_cell(name);
        let id = *cell.get_or_try_init(|| self.create(name, creation)).await?;
        self.lock_in_flight().remove(name);
        Ok(id)
    }

    /// All entities of this kind, sorted by name.
    ///
    /// With `reload`, the server is listed again even if the cache is warm.
    pub async fn list(&self, reload: bool) -> Result<BTreeMap<String, EntityId>> {
        self.ensure_loaded(reload).await?;
        Ok(self.cache.snapshot())
    }

    /// Build the error for a missing `name`, with a suggestion if one is close.
    #[must_use]
    pub fn not_found(&self, name: &str) -> PngxError {
        PngxError::EntityNotFound {
            kind: self.spec.kind,
            name: name.to_string(),
            suggestion: self.cache.closest(name),
        }
    }

    /// Drop cached state at the end of a session.
    pub async fn clear(&self) {
        self.cache.clear().await;
        self.lock_in_flight().clear();
        self.planned
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    async fn ensure_loaded(&self, reload: bool) -> Result<()> {
        let kind = self.spec.kind;
        self.cache
            .load_with(reload, || self.api.list_all(kind))
            .await?;
        Ok(())
    }

    async fn create(&self, name: &str, creation: &Creation) -> Result<EntityId> {
        let args = creation
            .args
            .clone()
            .unwrap_or_else(|| (self.spec.defaults)());
        let mut draft = EntityDraft::new(name, args);
        draft.owner = creation.owner;
        draft.set_permissions = creation
            .permissions
            .clone()
            .filter(|table| !table.is_empty());

        let id = self.api.save_draft(self.spec.kind, &draft).await?;
        self.cache.insert(name, id);
        log::info!("Created {} '{}' with id {}", self.spec.kind, name, id);
        Ok(id)
    }

    fn plan(&self, name: &str, log: &DryRunLog) -> EntityId {
        let mut planned = self
            .planned
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(id) = planned.get(name) {
            return *id;
        }

        let n = self.placeholders.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        let id = EntityId::placeholder(n);
        planned.insert(name.to_string(), id);
        log.record(PlannedAction::CreateEntity {
            kind: self.spec.kind,
            name: name.to_string(),
        });
        id
    }

    fn in_flight_cell(&self, name: &str) -> Arc<OnceCell<EntityId>> {
        Arc::clone(
            self.lock_in_flight()
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<EntityId>>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
