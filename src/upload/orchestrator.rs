//! Batch upload of documents.
//!
//! # Overview
//!
//! 1. **Resolution**: owner, groups, tags, correspondent and document type
//!    are resolved once for the batch. Nothing is uploaded before this
//!    finishes, and a missing required entity aborts the batch here.
//! 2. **Uploads**: every file is uploaded concurrently with its own retry
//!    budget. Per-file failures are logged and reported, never raised.
//!
//! Per-file state: `Pending → Uploading → {Success | RetryWait → Uploading | Failed}`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, DocumentDraft, EntityId, EntityKind, PermissionTable, TaskId};
use crate::dry_run::PlannedAction;
use crate::error::{PngxError, Result};
use crate::progress::ProgressCallback;
use crate::resolver::{Creation, PermissionBuilder};
use crate::session::Session;

use super::filename::{FilenameMetadata, MetadataExtractor, DEFAULT_DATE_RULE};

/// Default number of upload attempts per file.
pub const DEFAULT_TRIES: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Everything an upload batch needs besides the file list.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner: Option<String>,
    pub groups: Vec<String>,
    pub correspondent: Option<String>,
    pub correspondent_must_exist: bool,
    pub document_type: Option<String>,
    pub document_type_must_exist: bool,
    pub tags: Vec<String>,
    pub tags_must_exist: bool,
    /// Date extraction rules, tried in order.
    pub date_rules: Vec<String>,
    /// sed-style title rules, applied in order.
    pub title_rules: Vec<String>,
    /// Characters turned into spaces in titles.
    pub replace_with_spaces: Vec<String>,
    /// Attempts per file, at least 1.
    pub max_tries: u32,
    pub retry_delay: Duration,
}

impl Default for UploadRequest {
    fn default() -> Self {
        Self {
            owner: None,
            groups: Vec::new(),
            correspondent: None,
            correspondent_must_exist: false,
            document_type: None,
            document_type_must_exist: false,
            tags: Vec::new(),
            tags_must_exist: false,
            date_rules: vec![DEFAULT_DATE_RULE.to_string()],
            title_rules: Vec::new(),
            replace_with_spaces: Vec::new(),
            max_tries: DEFAULT_TRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// IDs shared read-only by all uploads of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub tags: Vec<EntityId>,
    pub correspondent: Option<EntityId>,
    pub document_type: Option<EntityId>,
    pub owner: Option<EntityId>,
    pub permissions: PermissionTable,
}

/// How the upload of one file ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Accepted by the server; processing continues asynchronously.
    Uploaded(TaskId),
    /// Dry run: the upload was only logged.
    Planned,
    /// Gave up on this file.
    Failed(String),
    /// The server refused the request.
    Denied(String),
}

impl UploadOutcome {
    #[must_use]
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Uploaded(task) => Some(task),
            _ => None,
        }
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: UploadOutcome,
    /// Upload attempts made (0 when the file never got to the network).
    pub attempts: u32,
}

/// Result of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    /// Set when the server denied the batch; details are only logged.
    pub denied: Option<String>,
}

impl BatchReport {
    /// Number of files accepted by the server.
    #[must_use]
    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Uploaded(_)))
    }

    /// Number of files only logged by a dry run.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Planned))
    }

    /// Number of files that were given up on or denied.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UploadOutcome::Failed(_) | UploadOutcome::Denied(_)))
    }

    fn count(&self, pred: impl Fn(&UploadOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Uploads batches of files through a [`Session`].
pub struct Uploader<'a> {
    session: &'a Session,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl<'a> Uploader<'a> {
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            progress: None,
        }
    }

    /// Report per-file progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Upload `files` with the metadata described by `request`.
    ///
    /// Returns an error only if metadata resolution fails (missing required
    /// entity, unknown group or owner, API failure while resolving). Upload
    /// failures of individual files are logged and reported in the
    /// [`BatchReport`].
    pub async fn upload(&self, files: &[PathBuf], request: &UploadRequest) -> Result<BatchReport> {
        if files.is_empty() {
            return Ok(BatchReport::default());
        }

        let resolved = self.resolve_metadata(request).await?;
        let extractor = MetadataExtractor::new(
            &request.date_rules,
            &request.title_rules,
            &request.replace_with_spaces,
        );

        if let Some(progress) = &self.progress {
            progress.on_batch_start(files.len());
        }

        let reports = futures::future::join_all(
            files
                .iter()
                .map(|file| self.upload_file(file, &resolved, &extractor, request)),
        )
        .await;

        if let Some(progress) = &self.progress {
            progress.on_batch_end();
        }

        let denied = reports.iter().find_map(|r| match &r.outcome {
            UploadOutcome::Denied(message) => Some(message.clone()),
            _ => None,
        });
        if let Some(message) = &denied {
            log::error!("API request denied: {message}");
        }

        Ok(BatchReport {
            files: reports,
            denied,
        })
    }

    /// Resolve every symbolic reference of `request` to server IDs.
    pub async fn resolve_metadata(&self, request: &UploadRequest) -> Result<ResolvedMetadata> {
        let owner = match request.owner.as_deref() {
            Some(name) => Some(
                self.session
                    .resolver(EntityKind::User)
                    .resolve(name, false, &Creation::default())
                    .await?,
            ),
            None => None,
        };

        let permissions = PermissionBuilder::new(self.session.resolver(EntityKind::Group))
            .build(&request.groups)
            .await?;

        let creation = Creation {
            args: None,
            owner,
            permissions: Some(permissions.clone()),
        };

        let mut tags = Vec::new();
        for name in dedup(&request.tags) {
            let id = self
                .resolve_or_plan(
                    EntityKind::Tag,
                    name,
                    request.tags_must_exist,
                    "tags_must_exist",
                    &creation,
                )
                .await?;
            if let Some(id) = id {
                tags.push(id);
            }
        }

        let correspondent = match request.correspondent.as_deref() {
            Some(name) => {
                self.resolve_or_plan(
                    EntityKind::Correspondent,
                    name,
                    request.correspondent_must_exist,
                    "correspondent_must_exist",
                    &creation,
                )
                .await?
            }
            None => None,
        };

        let document_type = match request.document_type.as_deref() {
            Some(name) => {
                self.resolve_or_plan(
                    EntityKind::DocumentType,
                    name,
                    request.document_type_must_exist,
                    "document_type_must_exist",
                    &creation,
                )
                .await?
            }
            None => None,
        };

        Ok(ResolvedMetadata {
            tags,
            correspondent,
            document_type,
            owner,
            permissions,
        })
    }

    /// Resolve `name`, creating it unless `must_exist` or dry run.
    ///
    /// In a dry run, a missing entity that may be created is recorded as a
    /// planned creation and resolves to `None`; the batch continues without
    /// it. When `must_exist` is set a missing entity is always fatal.
    async fn resolve_or_plan(
        &self,
        kind: EntityKind,
        name: &str,
        must_exist: bool,
        setting: &'static str,
        creation: &Creation,
    ) -> Result<Option<EntityId>> {
        let dry_run = self.session.dry_run_log();
        let make = !must_exist && dry_run.is_none();

        match self.session.resolver(kind).resolve(name, make, creation).await {
            Ok(id) => Ok(Some(id)),
            Err(PngxError::EntityNotFound {
                kind, suggestion, ..
            }) => match dry_run {
                Some(log) if !must_exist => {
                    log.record(PlannedAction::CreateEntity {
                        kind,
                        name: name.to_string(),
                    });
                    Ok(None)
                }
                _ => Err(PngxError::MustExist {
                    kind,
                    name: name.to_string(),
                    setting,
                    suggestion,
                }),
            },
            Err(err) => Err(err),
        }
    }

    async fn upload_file(
        &self,
        path: &Path,
        resolved: &ResolvedMetadata,
        extractor: &MetadataExtractor,
        request: &UploadRequest,
    ) -> FileReport {
        let meta = extractor.extract(path);
        let max_tries = request.max_tries.max(1);
        let mut attempts = 0;

        let outcome = loop {
            attempts += 1;
            log::trace!("Uploading {} (attempt {attempts}/{max_tries})", path.display());

            let err = match self.attempt(path, &meta, resolved).await {
                Ok(Some(task)) => {
                    log::info!("File {} uploaded, task ID {task}", path.display());
                    break UploadOutcome::Uploaded(task);
                }
                Ok(None) => break UploadOutcome::Planned,
                Err(err) => err,
            };

            if err.is_file_not_found() {
                log::error!("File not found: {}", path.display());
                attempts -= 1;
                break UploadOutcome::Failed(err.to_string());
            }
            if err.is_denied() {
                break UploadOutcome::Denied(err.to_string());
            }
            if !err.is_recoverable() {
                log::error!(
                    "Received other error during upload of file {}: {err:?}",
                    path.display()
                );
                break UploadOutcome::Failed(err.to_string());
            }

            match &err {
                ApiError::BadResponse(_) | ApiError::Status { .. } => log::warn!(
                    "Paperless reported an error with the upload of file {}: {err}",
                    path.display()
                ),
                _ => log::warn!(
                    "Connection problem during upload of file {}: {err}",
                    path.display()
                ),
            }

            let remaining = max_tries - attempts;
            if remaining == 0 {
                log::error!("Upload of {} failed all retries.", path.display());
                break UploadOutcome::Failed(err.to_string());
            }

            log::info!(
                "Upload of {} failed, retrying {remaining} time(s)…",
                path.display()
            );
            tokio::time::sleep(request.retry_delay).await;
        };

        if let Some(progress) = &self.progress {
            progress.on_file_finished(path, &outcome);
        }

        FileReport {
            path: path.to_path_buf(),
            outcome,
            attempts,
        }
    }

    /// One upload attempt. `Ok(None)` means dry run.
    async fn attempt(
        &self,
        path: &Path,
        meta: &FilenameMetadata,
        resolved: &ResolvedMetadata,
    ) -> std::result::Result<Option<TaskId>, ApiError> {
        if let Some(log) = self.session.dry_run_log() {
            log.record(PlannedAction::Upload {
                file: path.to_path_buf(),
                title: meta.title.clone(),
                created: meta.created.clone(),
                tags: resolved.tags.clone(),
                correspondent: resolved.correspondent,
                document_type: resolved.document_type,
            });
            return Ok(None);
        }

        let content = tokio::fs::read(path).await?;
        let draft = DocumentDraft {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content,
            title: meta.title.clone(),
            created: meta.created.clone(),
            tags: resolved.tags.clone(),
            correspondent: resolved.correspondent,
            document_type: resolved.document_type,
        };

        self.session.api().upload_document(&draft).await.map(Some)
    }
}

/// `names` without repeats, first occurrence kept.
fn dedup(names: &[String]) -> Vec<&str> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !seen.contains(&name.as_str()) {
            seen.push(name.as_str());
        }
    }
    seen
}
