//! Typed queries for the site's pages. Each call site owns its record shape
//! and picks the freshness class that matches how often that content changes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::QueryKind;
use crate::client::{ContentClient, ContentQuery};
use crate::error::ContentResult;
use crate::locale::{Locale, RequestContext};
use crate::localized::LocalizedValue;
use crate::media::{MediaFields, MediaResolver, ResolvedImage};
use crate::paths::{alternate_paths, ensure_locale_prefix};
use crate::visibility;

const POST_FIELDS: &str = "{ _id, status, \"slug\": slug.current, title, excerpt, publishedAt, cover, country }";
const DESTINATION_FIELDS: &str =
    "{ _id, status, \"slug\": slug.current, name, description, cover, gallery, country }";
const GALLERY_FIELDS: &str = "{ _id, status, \"slug\": slug.current, title, gallery, cover, country }";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: LocalizedValue<String>,
    #[serde(default)]
    pub excerpt: LocalizedValue<String>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub media: MediaFields,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Destination {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: LocalizedValue<String>,
    #[serde(default)]
    pub description: LocalizedValue<String>,
    #[serde(flatten)]
    pub media: MediaFields,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Gallery {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: LocalizedValue<String>,
    #[serde(flatten)]
    pub media: MediaFields,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Country {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: LocalizedValue<String>,
}

/// Display-ready destination page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DestinationView {
    pub name: Option<String>,
    pub description: Option<String>,
    pub href: String,
    pub alternates: Vec<(Locale, String)>,
    pub cover: ResolvedImage,
    pub gallery: Vec<ResolvedImage>,
}

impl Destination {
    pub fn view(&self, locale: Locale, media: &MediaResolver, gallery_limit: usize) -> DestinationView {
        let href = ensure_locale_prefix(locale, &format!("/destinations/{}", self.slug));
        DestinationView {
            name: self.name.pick(locale).cloned(),
            description: self.description.pick(locale).cloned(),
            alternates: alternate_paths(&href).to_vec(),
            href,
            cover: media.resolve_cover(&self.media, locale),
            gallery: media.resolve_gallery(&self.media, locale, gallery_limit),
        }
    }
}

pub fn latest_posts(ctx: RequestContext, start: u64, end: u64) -> ContentQuery {
    let expression = format!(
        "*[_type == \"post\" && {}] | order(publishedAt desc) [$start...$end] {}",
        visibility::filter_fragment(ctx.preview),
        POST_FIELDS
    );
    ContentQuery::new(QueryKind::Listing, expression, ctx).window(start, end)
}

pub fn destination_by_slug(ctx: RequestContext, slug: &str) -> ContentQuery {
    let expression = format!(
        "*[_type == \"destination\" && slug.current == $slug && {}][0] {}",
        visibility::filter_fragment(ctx.preview),
        DESTINATION_FIELDS
    );
    ContentQuery::new(QueryKind::Detail, expression, ctx).param("slug", slug)
}

pub fn gallery_by_slug(ctx: RequestContext, slug: &str) -> ContentQuery {
    let expression = format!(
        "*[_type == \"gallery\" && slug.current == $slug && {}][0] {}",
        visibility::filter_fragment(ctx.preview),
        GALLERY_FIELDS
    );
    ContentQuery::new(QueryKind::Detail, expression, ctx).param("slug", slug)
}

pub fn countries(ctx: RequestContext) -> ContentQuery {
    let expression = format!(
        "*[_type == \"country\" && {}] | order(slug.current asc) {{ _id, status, \"slug\": slug.current, name }}",
        visibility::filter_fragment(ctx.preview)
    );
    ContentQuery::new(QueryKind::Taxonomy, expression, ctx)
}

pub async fn fetch_latest_posts(
    client: &ContentClient,
    ctx: RequestContext,
    start: u64,
    end: u64,
) -> ContentResult<Vec<PostSummary>> {
    client.fetch(&latest_posts(ctx, start, end)).await
}

pub async fn fetch_destination(
    client: &ContentClient,
    ctx: RequestContext,
    slug: &str,
) -> ContentResult<Option<Destination>> {
    client.fetch(&destination_by_slug(ctx, slug)).await
}

pub async fn fetch_gallery(
    client: &ContentClient,
    ctx: RequestContext,
    slug: &str,
) -> ContentResult<Option<Gallery>> {
    client.fetch(&gallery_by_slug(ctx, slug)).await
}

pub async fn fetch_countries(client: &ContentClient, ctx: RequestContext) -> ContentResult<Vec<Country>> {
    client.fetch(&countries(ctx)).await
}
