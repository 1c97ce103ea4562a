mod common;

use common::RecordingRepository;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use travel_content::cache::QueryCache;
use travel_content::queries::{self, PostSummary};
use travel_content::repository::Perspective;
use travel_content::{
    ContentClient, ContentError, ContentQuery, FreshnessPolicy, Locale, QueryKind, RepositoryError,
    RequestContext,
};

fn client(repo: &RecordingRepository) -> ContentClient {
    ContentClient::new(Arc::new(repo.clone()), FreshnessPolicy::default())
}

fn posts() -> Value {
    json!([
        {
            "_id": "post-1",
            "status": "published",
            "slug": "lago-di-como",
            "title": { "it": "Lago di Como", "en": "Lake Como" },
            "publishedAt": "2024-05-01T08:00:00Z"
        },
        {
            "_id": "post-2",
            "status": "draft",
            "slug": "kyoto",
            "title": { "it": "Kyoto in autunno" }
        },
        {
            "_id": "post-3",
            "slug": "senza-stato",
            "title": { "en": "No status" }
        }
    ])
}

fn live(locale: Locale) -> RequestContext {
    RequestContext::new(locale, false)
}

#[tokio::test(start_paused = true)]
async fn live_results_are_cached_for_the_freshness_window() {
    let repo = RecordingRepository::with_handler(|_| Ok(posts()));
    let client = client(&repo);
    let query = queries::latest_posts(live(Locale::It), 0, 6);

    let first: Vec<PostSummary> = client.fetch(&query).await.unwrap();
    let second: Vec<PostSummary> = client.fetch(&query).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(repo.call_count().await, 1);

    tokio::time::advance(Duration::from_secs(6)).await;
    let _: Vec<PostSummary> = client.fetch(&query).await.unwrap();
    assert_eq!(repo.call_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn taxonomy_results_stay_cached_for_a_day() {
    let repo = RecordingRepository::with_handler(|_| {
        Ok(json!([{ "_id": "c-1", "slug": "italia", "name": { "it": "Italia" } }]))
    });
    let client = client(&repo);
    let ctx = live(Locale::It);

    queries::fetch_countries(&client, ctx).await.unwrap();
    tokio::time::advance(Duration::from_secs(3_600)).await;
    queries::fetch_countries(&client, ctx).await.unwrap();
    assert_eq!(repo.call_count().await, 1);

    tokio::time::advance(Duration::from_secs(86_400)).await;
    queries::fetch_countries(&client, ctx).await.unwrap();
    assert_eq!(repo.call_count().await, 2);
}

#[tokio::test]
async fn preview_bypasses_cache() {
    let repo = RecordingRepository::with_handler(|_| Ok(posts()));
    let client = client(&repo);
    let query = queries::latest_posts(RequestContext::new(Locale::It, true), 0, 6);

    let _: Vec<PostSummary> = client.fetch(&query).await.unwrap();
    let _: Vec<PostSummary> = client.fetch(&query).await.unwrap();
    assert_eq!(repo.call_count().await, 2);
    assert!(client.cache().is_empty());
    for call in repo.calls().await {
        assert_eq!(call.perspective, Perspective::Drafts);
    }
}

#[tokio::test]
async fn preview_reads_do_not_serve_live_cache() {
    let repo = RecordingRepository::with_handler(|_| Ok(posts()));
    let client = client(&repo);

    let live_posts: Vec<PostSummary> =
        client.fetch(&queries::latest_posts(live(Locale::It), 0, 6)).await.unwrap();
    let draft_posts: Vec<PostSummary> = client
        .fetch(&queries::latest_posts(RequestContext::new(Locale::It, true), 0, 6))
        .await
        .unwrap();
    assert_eq!(repo.call_count().await, 2);
    assert_eq!(live_posts.len(), 2);
    assert_eq!(draft_posts.len(), 3);
}

#[tokio::test]
async fn unpublished_records_are_only_visible_in_preview() {
    let repo = RecordingRepository::with_handler(|_| Ok(posts()));
    let client = client(&repo);

    let public: Vec<PostSummary> =
        client.fetch(&queries::latest_posts(live(Locale::It), 0, 6)).await.unwrap();
    let ids: Vec<&str> = public.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["post-1", "post-3"]);

    let draft: Vec<PostSummary> = client
        .fetch(&queries::latest_posts(RequestContext::new(Locale::It, true), 0, 6))
        .await
        .unwrap();
    assert!(draft.iter().any(|p| p.id == "post-2"));
}

#[tokio::test]
async fn hidden_single_document_resolves_to_none() {
    let repo = RecordingRepository::with_handler(|_| {
        Ok(json!({ "_id": "drafts.dest-1", "slug": "italia", "status": "draft" }))
    });
    let client = client(&repo);

    let public = queries::fetch_destination(&client, live(Locale::It), "italia").await.unwrap();
    assert!(public.is_none());

    let draft = queries::fetch_destination(&client, RequestContext::new(Locale::It, true), "italia")
        .await
        .unwrap();
    assert_eq!(draft.map(|d| d.slug).as_deref(), Some("italia"));
}

#[tokio::test]
async fn locales_are_cached_separately() {
    let repo = RecordingRepository::with_handler(|_| Ok(posts()));
    let client = client(&repo);

    let _: Vec<PostSummary> = client.fetch(&queries::latest_posts(live(Locale::It), 0, 6)).await.unwrap();
    let _: Vec<PostSummary> = client.fetch(&queries::latest_posts(live(Locale::En), 0, 6)).await.unwrap();
    assert_eq!(repo.call_count().await, 2);

    let calls = repo.calls().await;
    assert_eq!(calls[0].params["locale"], json!("it"));
    assert_eq!(calls[1].params["locale"], json!("en"));
    assert_eq!(calls[1].params["fallbackLocale"], json!("it"));
}

#[tokio::test]
async fn malformed_results_fail_and_are_not_cached() {
    let repo = RecordingRepository::with_responses(vec![
        Ok(json!({ "unexpected": "shape" })),
        Ok(posts()),
    ]);
    let client = client(&repo);
    let query = queries::latest_posts(live(Locale::It), 0, 6);

    let err = client.fetch::<Vec<PostSummary>>(&query).await.unwrap_err();
    assert!(matches!(err, ContentError::Malformed { .. }));

    let ok: Vec<PostSummary> = client.fetch(&query).await.unwrap();
    assert_eq!(ok.len(), 2);
    assert_eq!(repo.call_count().await, 2);
}

#[tokio::test]
async fn repository_failures_propagate_unchanged() {
    let repo = RecordingRepository::with_responses(vec![Err(RepositoryError::RateLimited(
        "slow down".into(),
    ))]);
    let client = client(&repo);
    let query = ContentQuery::new(QueryKind::Detail, "*[0]", live(Locale::It));

    let err = client.fetch::<Value>(&query).await.unwrap_err();
    match err {
        ContentError::Repository(RepositoryError::RateLimited(body)) => assert_eq!(body, "slow down"),
        other => panic!("wrong error: {other:?}"),
    }
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn missing_optional_fields_decode_as_absent() {
    let repo = RecordingRepository::with_handler(|_| Ok(json!([{ "_id": "post-9" }])));
    let client = client(&repo);

    let posts = queries::fetch_latest_posts(&client, live(Locale::En), 0, 6).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].slug, None);
    assert_eq!(posts[0].title.pick(Locale::En), None);
    assert_eq!(posts[0].published_at, None);
    assert!(posts[0].media.cover.is_none());
}

#[tokio::test]
async fn cache_capacity_bounds_live_entries() {
    let repo = RecordingRepository::with_handler(|_| Ok(posts()));
    let client = ContentClient::with_cache(
        Arc::new(repo.clone()),
        FreshnessPolicy::default(),
        QueryCache::with_capacity(NonZeroUsize::new(2).unwrap()),
    );
    let ctx = live(Locale::It);

    for start in [0, 6, 12] {
        let _: Vec<PostSummary> = client.fetch(&queries::latest_posts(ctx, start, start + 6)).await.unwrap();
    }
    assert_eq!(client.cache().len(), 2);
    assert_eq!(repo.call_count().await, 3);

    // The oldest page was evicted; the newest is still served from cache.
    let _: Vec<PostSummary> = client.fetch(&queries::latest_posts(ctx, 0, 6)).await.unwrap();
    assert_eq!(repo.call_count().await, 4);
    let _: Vec<PostSummary> = client.fetch(&queries::latest_posts(ctx, 12, 18)).await.unwrap();
    assert_eq!(repo.call_count().await, 4);
}
