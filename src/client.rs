//! Content Query Client: picks the execution mode for a query and applies the
//! matching cache and visibility rules before handing typed records back.
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::cache::{CacheKey, FreshnessPolicy, QueryCache, QueryKind};
use crate::error::{ContentError, ContentResult};
use crate::locale::{Locale, RequestContext};
use crate::repository::{ContentRepository, Perspective, RepositoryRequest};
use crate::visibility;

/// Half-open result slice `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    pub kind: QueryKind,
    pub expression: String,
    pub params: Map<String, Value>,
    pub locale: Locale,
    pub window: Option<Window>,
    pub preview: bool,
}

impl ContentQuery {
    pub fn new(kind: QueryKind, expression: impl Into<String>, ctx: RequestContext) -> Self {
        Self {
            kind,
            expression: expression.into(),
            params: Map::new(),
            locale: ctx.locale,
            window: None,
            preview: ctx.preview,
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn window(mut self, start: u64, end: u64) -> Self {
        self.window = Some(Window { start, end });
        self
    }

    /// Everything that changes the repository's answer apart from locale
    /// and perspective.
    fn identity(&self) -> String {
        let params = Value::Object(self.params.clone());
        match self.window {
            Some(w) => format!("{}|{}|{}..{}", self.expression, params, w.start, w.end),
            None => format!("{}|{}", self.expression, params),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            identity: self.identity(),
            locale: self.locale,
            preview: self.preview,
        }
    }

    /// The request sent to the repository. `$locale`, `$fallbackLocale`
    /// and, for windowed queries, `$start`/`$end` are always bound.
    pub fn to_request(&self) -> RepositoryRequest {
        let mut params = self.params.clone();
        params.insert("locale".into(), self.locale.as_str().into());
        params.insert("fallbackLocale".into(), self.locale.other().as_str().into());
        if let Some(w) = self.window {
            params.insert("start".into(), w.start.into());
            params.insert("end".into(), w.end.into());
        }
        RepositoryRequest {
            query: self.expression.clone(),
            params,
            perspective: Perspective::for_preview(self.preview),
        }
    }
}

/// Decoded rows of a list query plus how many rows the visibility rule
/// removed from the repository's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRows<T> {
    pub rows: Vec<T>,
    pub hidden: u64,
}

#[derive(Clone)]
pub struct ContentClient {
    repository: Arc<dyn ContentRepository>,
    cache: Arc<QueryCache>,
    freshness: FreshnessPolicy,
}

impl ContentClient {
    pub fn new(repository: Arc<dyn ContentRepository>, freshness: FreshnessPolicy) -> Self {
        Self::with_cache(repository, freshness, QueryCache::new())
    }

    pub fn with_cache(
        repository: Arc<dyn ContentRepository>,
        freshness: FreshnessPolicy,
        cache: QueryCache,
    ) -> Self {
        Self {
            repository,
            cache: Arc::new(cache),
            freshness,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run `query` and decode its result into the call site's record type.
    ///
    /// Live queries are answered from cache while the entry is younger than
    /// the freshness window for `query.kind`. Preview queries always go to
    /// the repository and never read or populate the cache.
    #[instrument(skip_all, fields(kind = ?query.kind, locale = %query.locale, preview = query.preview))]
    pub async fn fetch<T: DeserializeOwned>(&self, query: &ContentQuery) -> ContentResult<T> {
        self.load(query, |raw| decode(query, visibility::retain_visible(raw, query.preview)))
            .await
    }

    /// Like [`fetch`](Self::fetch) for list queries, also reporting how many
    /// rows were hidden so callers can keep totals consistent.
    #[instrument(skip_all, fields(kind = ?query.kind, locale = %query.locale, preview = query.preview))]
    pub async fn fetch_rows<T: DeserializeOwned>(
        &self,
        query: &ContentQuery,
    ) -> ContentResult<VisibleRows<T>> {
        self.load(query, |raw| {
            let hidden = visibility::hidden_count(&raw, query.preview);
            let rows = decode(query, visibility::retain_visible(raw, query.preview))?;
            Ok(VisibleRows { rows, hidden })
        })
        .await
    }

    /// Cache holds the repository's raw answer; `shape` runs on every read.
    /// An answer is stored only once `shape` has accepted it.
    async fn load<T, F>(&self, query: &ContentQuery, shape: F) -> ContentResult<T>
    where
        F: Fn(Value) -> ContentResult<T>,
    {
        if query.preview {
            let raw = self.repository.query(&query.to_request()).await?;
            return shape(raw);
        }

        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("cache hit");
            return shape(cached);
        }

        debug!("cache miss");
        let raw = self.repository.query(&query.to_request()).await?;
        let out = shape(raw.clone())?;
        self.cache.insert(key, raw, self.freshness.max_age(query.kind));
        Ok(out)
    }
}
