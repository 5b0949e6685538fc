//! Boundary to the Paperless-NGX REST API.
//!
//! The rest of the crate only talks to the server through the
//! [`PaperlessApi`] trait. It exposes exactly what the upload engine needs:
//!
//! * listing every entity of a kind (pagination is consumed by the backend),
//! * saving an entity draft and getting its new ID back,
//! * uploading a document and getting the server's task identifier back.
//!
//! # Backends
//!
//! * [`http`]: the real reqwest-based client.
//! * [`memory`]: an in-memory server used by the test suite.

pub mod http;
pub mod memory;
pub mod models;

use std::time::Duration;

use async_trait::async_trait;

pub use http::HttpApi;
pub use memory::MemoryApi;
pub use models::{
    CreateArgs, DocumentDraft, Entity, EntityDraft, EntityId, EntityKind, MatchingAlgorithm,
    PermissionSet, PermissionTable, TaskId,
};

/// Connect timeout for the HTTP session.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Overall request timeout (uploads of large scans can be slow).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors raised by an API backend.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered with something we could not interpret.
    #[error("malformed server response: {0}")]
    BadResponse(String),

    /// The server refused the request (HTTP 401/403).
    #[error("access denied (HTTP {status}): {message}")]
    Denied {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Local I/O failure, e.g. reading the document to upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors that fit no other category.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Whether the failure is transient and the request may be retried.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) | Self::BadResponse(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the server refused to authorise the request.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    /// Whether the error is a missing local file.
    #[must_use]
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the upload engine consumes from a Paperless server.
#[async_trait]
pub trait PaperlessApi: Send + Sync {
    /// List every entity of `kind`, following pagination to the end.
    async fn list_all(&self, kind: EntityKind) -> ApiResult<Vec<Entity>>;

    /// Persist an entity draft and return the ID assigned by the server.
    async fn save_draft(&self, kind: EntityKind, draft: &EntityDraft) -> ApiResult<EntityId>;

    /// Upload a document. The returned task ID is a receipt, processing
    /// happens asynchronously on the server.
    async fn upload_document(&self, draft: &DocumentDraft) -> ApiResult<TaskId>;

    /// Release the connection. Called once when the session ends.
    async fn close(&self) {}
}
