//! Name → ID cache for one entity kind.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Mutex;

use crate::api::{ApiResult, Entity, EntityId};

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Lazily populated mapping from display name to server ID.
///
/// Names are matched exactly (case-sensitive, as returned by the server).
/// The cache reflects the server as of the last listing plus whatever this
/// process created since; staleness within one command is accepted.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: Mutex<HashMap<String, EntityId>>,
    /// `true` once a full listing has been loaded.
    loaded: tokio::sync::Mutex<bool>,
}

impl EntityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the cache with `fetch` unless it is already loaded.
    ///
    /// Concurrent callers wait for the first listing instead of issuing their
    /// own, so a kind is listed once per connection unless `reload` is set.
    pub async fn load_with<F, Fut>(&self, reload: bool, fetch: F) -> ApiResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Vec<Entity>>>,
    {
        let mut loaded = self.loaded.lock().await;
        if *loaded && !reload {
            return Ok(());
        }

        let entities = fetch().await?;
        let mut entries = self.lock();
        entries.clear();
        entries.extend(entities.into_iter().map(|e| (e.name, e.id)));
        *loaded = true;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.lock().get(name).copied()
    }

    pub fn insert(&self, name: &str, id: EntityId) {
        self.lock().insert(name.to_string(), id);
    }

    /// Sorted copy of the cache contents.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, EntityId> {
        self.lock()
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The cached name most similar to `name`, if any is close enough.
    #[must_use]
    pub fn closest(&self, name: &str) -> Option<String> {
        self.lock()
            .keys()
            .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate.clone())
    }

    /// Forget everything, including the loaded marker.
    pub async fn clear(&self) {
        let mut loaded = self.loaded.lock().await;
        self.lock().clear();
        *loaded = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, EntityId>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
