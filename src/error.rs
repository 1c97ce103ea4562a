use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the content repository. Surfaced to callers as-is;
/// this crate never retries.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to reach content repository: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid repository URL: {0}")]
    Url(String),
    #[error("received 429 from content repository: {0}")]
    RateLimited(String),
    #[error("content repository error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid content repository response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("malformed result for query `{query}`: {source}")]
    Malformed {
        query: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type ContentResult<T> = Result<T, ContentError>;
