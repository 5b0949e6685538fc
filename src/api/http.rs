//! reqwest-based Paperless-NGX client.
//!
//! Authentication uses the `Authorization: Token <token>` header. Collection
//! endpoints are paginated; [`HttpApi::list_all`] follows the `next` links
//! until the last page so callers never see pagination.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{
    ApiError, ApiResult, DocumentDraft, Entity, EntityDraft, EntityId, EntityKind, PaperlessApi,
    TaskId, CONNECT_TIMEOUT, REQUEST_TIMEOUT,
};

const USER_AGENT: &str = concat!("pngx/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: u32 = 100;

/// One page of a collection listing.
#[derive(Debug, Deserialize)]
struct Page {
    next: Option<String>,
    results: Vec<Value>,
}

/// HTTP backend for [`PaperlessApi`].
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    /// Build a client for the server at `base` using an API token.
    pub fn new(base: Url, token: &str) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Token {token}"))
            .map_err(|e| ApiError::Other(format!("invalid API token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base: with_trailing_slash(base),
        })
    }

    /// URL of `/api/<path>/` below the configured base.
    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(&format!("api/{path}/"))
            .map_err(|e| ApiError::Other(format!("invalid endpoint {path}: {e}")))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ApiError::BadResponse(err.to_string())
        } else {
            ApiError::Other(err.to_string())
        }
    }
}

/// Turn non-success responses into errors.
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Denied {
            status: status.as_u16(),
            message,
        }),
        _ => Err(ApiError::Status {
            status: status.as_u16(),
            message,
        }),
    }
}

fn parse_entity(kind: EntityKind, value: &Value) -> ApiResult<Entity> {
    let id = value
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| ApiError::BadResponse(format!("{kind} without numeric id: {value}")))?;
    let name = value
        .get(kind.name_field())
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ApiError::BadResponse(format!("{kind} {id} without '{}'", kind.name_field()))
        })?;
    Ok(Entity::new(id, name))
}

#[async_trait]
impl PaperlessApi for HttpApi {
    async fn list_all(&self, kind: EntityKind) -> ApiResult<Vec<Entity>> {
        let mut url = self.endpoint(kind.endpoint())?;
        url.query_pairs_mut()
            .append_pair("page_size", &PAGE_SIZE.to_string());

        let mut entities = Vec::new();
        let mut next = Some(url);
        while let Some(page_url) = next.take() {
            log::trace!("GET {page_url}");
            let response = check_status(self.client.get(page_url).send().await?).await?;
            let page: Page = response.json().await?;

            for value in &page.results {
                entities.push(parse_entity(kind, value)?);
            }

            next = match page.next {
                Some(link) => Some(
                    Url::parse(&link)
                        .map_err(|e| ApiError::BadResponse(format!("bad next link {link}: {e}")))?,
                ),
                None => None,
            };
        }

        log::debug!("Listed {} {} entities", entities.len(), kind.endpoint());
        Ok(entities)
    }

    async fn save_draft(&self, kind: EntityKind, draft: &EntityDraft) -> ApiResult<EntityId> {
        let url = self.endpoint(kind.endpoint())?;
        log::trace!("POST {url} {}", draft.name);
        let response = check_status(self.client.post(url).json(draft).send().await?).await?;
        let created: Value = response.json().await?;
        parse_entity(kind, &created).map(|e| e.id)
    }

    async fn upload_document(&self, draft: &DocumentDraft) -> ApiResult<TaskId> {
        let url = self.endpoint("documents/post_document")?;

        let mut form = Form::new()
            .part(
                "document",
                Part::bytes(draft.content.clone()).file_name(draft.file_name.clone()),
            )
            .text("title", draft.title.clone());
        if let Some(created) = &draft.created {
            form = form.text("created", created.clone());
        }
        if let Some(correspondent) = draft.correspondent {
            form = form.text("correspondent", correspondent.0.to_string());
        }
        if let Some(document_type) = draft.document_type {
            form = form.text("document_type", document_type.0.to_string());
        }
        for tag in &draft.tags {
            form = form.text("tags", tag.0.to_string());
        }

        log::trace!("POST {url} {}", draft.file_name);
        let response = check_status(self.client.post(url).multipart(form).send().await?).await?;
        match response.json::<Value>().await? {
            Value::String(task) => Ok(TaskId(task)),
            other => Err(ApiError::BadResponse(format!(
                "expected a task id, got {other}"
            ))),
        }
    }
}
