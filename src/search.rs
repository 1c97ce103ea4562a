//! Free-text search over published content.
//!
//! Search is a thin relevance + recency ranking executed by the content
//! repository: the query text becomes a wildcard match pattern, the
//! repository scores matching documents, and this module pages and shapes
//! the answer. There is no local index; content volume is small enough
//! for the repository to scan.
use chrono::{DateTime, Utc};
use futures::future::try_join;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{info, instrument, warn};

use crate::cache::QueryKind;
use crate::client::{ContentClient, ContentQuery, VisibleRows};
use crate::config::SearchSettings;
use crate::error::ContentResult;
use crate::locale::{Locale, RequestContext};
use crate::localized::LocalizedValue;
use crate::media::{MediaFields, MediaResolver, ResolvedImage};
use crate::paths::ensure_locale_prefix;
use crate::visibility;

/// Raw user input; every field is coerced, never rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Default::default()
        }
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub content_type: String,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub href: String,
    pub cover: ResolvedImage,
    pub published_at: Option<DateTime<Utc>>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub items: Vec<SearchHit>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

impl SearchResult {
    pub fn empty(page: u64) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            pages: 0,
        }
    }
}

/// Shape of one windowed search row.
#[derive(Debug, Deserialize)]
struct SearchRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_type")]
    content_type: String,
    /// Missing and `null` both rank as zero.
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    title: LocalizedValue<String>,
    #[serde(default)]
    excerpt: LocalizedValue<String>,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    media: MediaFields,
}

impl SearchRecord {
    fn score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// `"lago  di como"` → `"*lago*di*como*"`: every token, in order, anywhere
/// in the field. `None` for blank input.
pub fn match_pattern(q: &str) -> Option<String> {
    let tokens: Vec<&str> = q.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    Some(format!("*{}*", tokens.join("*")))
}

pub fn clamp_page(page: Option<i64>) -> u64 {
    match page {
        Some(p) if p >= 1 => p as u64,
        _ => 1,
    }
}

pub fn clamp_limit(limit: Option<i64>, settings: &SearchSettings) -> u64 {
    let (min, max) = (settings.min_limit as i64, settings.max_limit as i64);
    match limit {
        Some(l) => l.clamp(min, max) as u64,
        None => settings.default_limit as u64,
    }
}

/// Half-open window `[start, end)` for a 1-based page.
pub fn page_window(page: u64, limit: u64) -> (u64, u64) {
    let start = page.saturating_sub(1).saturating_mul(limit);
    (start, start.saturating_add(limit))
}

pub fn page_count(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

const MATCH_FIELDS: &str = "[title.it, title.en, excerpt.it, excerpt.en, pt::text(body.it), pt::text(body.en)] match $pattern";

const SCORE_AND_ORDER: &str = concat!(
    " | score(boost([title.it, title.en] match $pattern, 3),",
    " [excerpt.it, excerpt.en] match $pattern,",
    " [pt::text(body.it), pt::text(body.en)] match $pattern)",
    " | order(_score desc, publishedAt desc) [$start...$end]",
    " { _id, _type, _score, status, \"slug\": slug.current, title, excerpt, publishedAt, cover, country }",
);

fn filter_expression(preview: bool) -> String {
    format!(
        "_type in $types && {} && {}",
        visibility::filter_fragment(preview),
        MATCH_FIELDS
    )
}

pub fn count_expression(preview: bool) -> String {
    format!("count(*[{}])", filter_expression(preview))
}

pub fn window_expression(preview: bool) -> String {
    format!("*[{}]{}", filter_expression(preview), SCORE_AND_ORDER)
}

/// Score descending, then most recent first. Rows equal on both keep the
/// repository's order.
fn rank(records: &mut [SearchRecord]) {
    records.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
}

#[derive(Clone)]
pub struct SearchEngine {
    client: ContentClient,
    settings: SearchSettings,
    media: MediaResolver,
}

impl SearchEngine {
    pub fn new(client: ContentClient, settings: SearchSettings, media: MediaResolver) -> Self {
        Self {
            client,
            settings,
            media,
        }
    }

    fn section_for<'a>(&'a self, content_type: &'a str) -> &'a str {
        self.settings
            .content_types
            .iter()
            .find(|t| t.name == content_type)
            .map(|t| t.section.as_str())
            .unwrap_or(content_type)
    }

    fn href_for(&self, record: &SearchRecord, locale: Locale) -> String {
        let section = self.section_for(&record.content_type);
        let path = match record.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => format!("/{section}/{slug}"),
            None => format!("/{section}"),
        };
        ensure_locale_prefix(locale, &path)
    }

    fn to_hit(&self, record: SearchRecord, locale: Locale) -> SearchHit {
        let href = self.href_for(&record, locale);
        let score = record.score();
        let cover = self.media.resolve_cover(&record.media, locale);
        SearchHit {
            href,
            cover,
            title: record.title.into_picked(locale),
            excerpt: record.excerpt.into_picked(locale),
            id: record.id,
            content_type: record.content_type,
            published_at: record.published_at,
            score,
        }
    }

    /// Run one search. An empty query returns an empty first page without
    /// contacting the repository. The count and the page are fetched
    /// concurrently and the call fails if either does.
    #[instrument(skip_all, fields(locale = %ctx.locale, preview = ctx.preview))]
    pub async fn search(
        &self,
        request: &SearchRequest,
        ctx: RequestContext,
    ) -> ContentResult<SearchResult> {
        let page = clamp_page(request.page);
        let Some(pattern) = match_pattern(&request.q) else {
            return Ok(SearchResult::empty(page));
        };
        let limit = clamp_limit(request.limit, &self.settings);
        let (start, end) = page_window(page, limit);
        let types: Vec<String> = self
            .settings
            .content_types
            .iter()
            .map(|t| t.name.clone())
            .collect();

        let count_query = ContentQuery::new(QueryKind::Search, count_expression(ctx.preview), ctx)
            .param("pattern", pattern.clone())
            .param("types", types.clone());
        let window_query = ContentQuery::new(QueryKind::Search, window_expression(ctx.preview), ctx)
            .param("pattern", pattern)
            .param("types", types)
            .window(start, end);

        let (matched, window): (u64, VisibleRows<SearchRecord>) = try_join(
            self.client.fetch(&count_query),
            self.client.fetch_rows(&window_query),
        )
        .await?;

        // Rows the visibility rule dropped from the page are not counted.
        let total = matched.saturating_sub(window.hidden);
        if window.hidden > 0 {
            warn!(hidden = window.hidden, "repository returned rows outside the public view");
        }
        let mut records = window.rows;
        rank(&mut records);
        records.truncate(limit as usize);
        let items: Vec<SearchHit> = records
            .into_iter()
            .map(|record| self.to_hit(record, ctx.locale))
            .collect();

        info!(page, limit, total, returned = items.len(), "search completed");
        Ok(SearchResult {
            items,
            total,
            page,
            pages: page_count(total, limit),
        })
    }

    /// Search for an end-user page: failures are logged and shown as an
    /// empty result so no repository detail reaches the rendered page.
    pub async fn search_or_empty(&self, request: &SearchRequest, ctx: RequestContext) -> SearchResult {
        match self.search(request, ctx).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "search failed; returning empty result");
                SearchResult::empty(clamp_page(request.page))
            }
        }
    }
}
