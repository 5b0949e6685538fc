//! Connection lifetime for one command invocation.
//!
//! A [`Session`] owns the API backend and one [`EntityResolver`] per entity
//! kind. [`Session::run`] scopes it: the closure gets the session, and the
//! session is closed afterwards whether the closure succeeded or not.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use reqwest::Url;

use crate::api::{EntityId, EntityKind, HttpApi, PaperlessApi};
use crate::dry_run::DryRunLog;
use crate::error::{PngxError, Result};
use crate::resolver::{EntityResolver, EntitySpec};

/// Connection settings after config and CLI have been merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub url: Option<String>,
    pub token: Option<String>,
    /// Compute and log mutations without performing them.
    pub dry_run: bool,
}

/// The API backend plus per-kind resolver caches.
pub struct Session {
    api: Arc<dyn PaperlessApi>,
    dry_run: Option<Arc<DryRunLog>>,
    tags: EntityResolver,
    correspondents: EntityResolver,
    users: EntityResolver,
    groups: EntityResolver,
    document_types: EntityResolver,
}

impl Session {
    /// Open an HTTP session. Missing or malformed settings fail here, before
    /// any request is made.
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let url = settings
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(PngxError::MissingConfig("URL"))?;
        let token = settings
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(PngxError::MissingConfig("API token"))?;

        let base = Url::parse(url).map_err(|e| PngxError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let api = HttpApi::new(base, token)?;
        log::debug!("Connecting to {url}");

        Ok(Self::with_api(Arc::new(api), settings.dry_run))
    }

    /// Build a session around an existing backend.
    #[must_use]
    pub fn with_api(api: Arc<dyn PaperlessApi>, dry_run: bool) -> Self {
        let log = dry_run.then(|| Arc::new(DryRunLog::new()));
        let placeholders = Arc::new(AtomicU32::new(0));
        let resolver = |kind: EntityKind| {
            let resolver = EntityResolver::new(EntitySpec::for_kind(kind), Arc::clone(&api));
            match &log {
                Some(log) => resolver.with_dry_run(Arc::clone(log), Arc::clone(&placeholders)),
                None => resolver,
            }
        };

        Self {
            tags: resolver(EntityKind::Tag),
            correspondents: resolver(EntityKind::Correspondent),
            users: resolver(EntityKind::User),
            groups: resolver(EntityKind::Group),
            document_types: resolver(EntityKind::DocumentType),
            api,
            dry_run: log,
        }
    }

    /// Run `f` with this session, then close it on every exit path.
    pub async fn run<R, F, Fut>(self, f: F) -> R
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = R>,
    {
        let session = Arc::new(self);
        let result = f(Arc::clone(&session)).await;
        session.close().await;
        result
    }

    /// Tear down caches and release the backend.
    pub async fn close(&self) {
        for kind in EntityKind::ALL {
            self.resolver(kind).clear().await;
        }
        self.api.close().await;
        log::debug!("Session closed");
    }

    /// Planned actions of a dry run; `None` when mutations are live.
    #[must_use]
    pub fn dry_run_log(&self) -> Option<&DryRunLog> {
        self.dry_run.as_deref()
    }

    pub(crate) fn api(&self) -> &dyn PaperlessApi {
        self.api.as_ref()
    }

    /// The resolver for `kind`.
    #[must_use]
    pub fn resolver(&self, kind: EntityKind) -> &EntityResolver {
        match kind {
            EntityKind::Tag => &self.tags,
            EntityKind::Correspondent => &self.correspondents,
            EntityKind::User => &self.users,
            EntityKind::Group => &self.groups,
            EntityKind::DocumentType => &self.document_types,
        }
    }

    /// Every entity of `kind`, freshly listed, sorted by name.
    pub async fn list(&self, kind: EntityKind) -> Result<BTreeMap<String, EntityId>> {
        self.resolver(kind).list(true).await
    }

    /// Shorthand for `list(EntityKind::Tag)`.
    pub async fn tags(&self) -> Result<BTreeMap<String, EntityId>> {
        self.list(EntityKind::Tag).await
    }
}
