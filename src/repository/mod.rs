//! Boundary to the external content repository.
//!
//! The repository executes query-language expressions against a dataset and
//! answers with a `{"result": ...}` envelope. [`ContentRepository`] is the seam
//! the rest of the crate depends on; [`HttpRepository`] is the production
//! implementation and tests substitute recording fakes.
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::config::RepositorySettings;
use crate::error::RepositoryError;
use crate::repository::model::QueryResponse;

pub mod model;

/// Which document set the repository should answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perspective {
    /// Published documents only.
    Published,
    /// Drafts layered over published documents.
    Drafts,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::Published => "published",
            Perspective::Drafts => "drafts",
        }
    }

    pub fn for_preview(preview: bool) -> Self {
        if preview {
            Perspective::Drafts
        } else {
            Perspective::Published
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryRequest {
    pub query: String,
    pub params: Map<String, Value>,
    pub perspective: Perspective,
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn query(&self, request: &RepositoryRequest) -> Result<Value, RepositoryError>;
}

#[derive(Clone)]
pub struct HttpRepository {
    http: Client,
    api_base: Url,
    cdn_base: Option<Url>,
    dataset: String,
    api_version: String,
    token: Option<String>,
}

impl fmt::Debug for HttpRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRepository")
            .field("api_base", &self.api_base)
            .field("cdn_base", &self.cdn_base)
            .field("dataset", &self.dataset)
            .finish_non_exhaustive()
    }
}

fn parse_base(raw: &str) -> Result<Url, RepositoryError> {
    // `Url::join` replaces the last segment unless the base ends with '/'.
    let raw = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&raw).map_err(|e| RepositoryError::Url(format!("{raw}: {e}")))
}

impl HttpRepository {
    pub fn from_settings(settings: &RepositorySettings) -> Result<Self, RepositoryError> {
        let api_base = parse_base(&settings.api_url)?;
        let cdn_base = match settings.cdn_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) if settings.use_cdn => Some(parse_base(url)?),
            _ => None,
        };
        let http = Client::builder()
            .user_agent(concat!("travel-content/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base,
            cdn_base,
            dataset: settings.dataset.clone(),
            api_version: settings.api_version.clone(),
            token: settings.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    /// Published reads go through the CDN when one is configured; draft
    /// reads always hit the API host so they are never served stale.
    fn base_for(&self, perspective: Perspective) -> &Url {
        match (perspective, &self.cdn_base) {
            (Perspective::Published, Some(cdn)) => cdn,
            _ => &self.api_base,
        }
    }

    pub fn build_request(&self, request: &RepositoryRequest) -> Result<reqwest::Request, RepositoryError> {
        let endpoint = self
            .base_for(request.perspective)
            .join(&format!(
                "v{}/data/query/{}",
                self.api_version.trim_start_matches('v'),
                self.dataset
            ))
            .map_err(|e| RepositoryError::Url(e.to_string()))?;

        let mut builder = self
            .http
            .post(endpoint)
            .query(&[("perspective", request.perspective.as_str())])
            .json(&json!({
                "query": request.query,
                "params": Value::Object(request.params.clone()),
            }));
        if request.perspective == Perspective::Drafts {
            match &self.token {
                Some(token) => builder = builder.bearer_auth(token),
                None => warn!("draft query without a repository token; drafts will not be visible"),
            }
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl ContentRepository for HttpRepository {
    async fn query(&self, request: &RepositoryRequest) -> Result<Value, RepositoryError> {
        let http_request = self.build_request(request)?;
        debug!(
            url = %http_request.url(),
            perspective = request.perspective.as_str(),
            query = %request.query,
            "sending repository query"
        );

        let res = self.http.execute(http_request).await?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("rate limited by content repository: {}", body);
            return Err(RepositoryError::RateLimited(body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "content repository error: {}", body);
            return Err(RepositoryError::Status { status, body });
        }

        let body = res.text().await?;
        let payload: QueryResponse =
            serde_json::from_str(&body).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        debug!(ms = ?payload.ms, "repository query answered");
        Ok(payload.result)
    }
}
