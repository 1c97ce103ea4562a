use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use travel_content::cache::QueryCache;
use travel_content::config;
use travel_content::repository::HttpRepository;
use travel_content::{ContentClient, ContentQuery, FreshnessPolicy, Locale, QueryKind, RequestContext};

#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Query expression to run
    #[arg(long)]
    query: String,

    #[arg(long, default_value = "it")]
    locale: String,

    /// Read drafts (uses the repository token)
    #[arg(long)]
    drafts: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    cfg.apply_env();

    let repository = HttpRepository::from_settings(&cfg.repository)?;
    let client = ContentClient::with_cache(
        Arc::new(repository),
        FreshnessPolicy::from_settings(&cfg.cache),
        QueryCache::from_settings(&cfg.cache),
    );

    let ctx = RequestContext::new(Locale::normalize(Some(&args.locale)), args.drafts);
    let query = ContentQuery::new(QueryKind::Detail, args.query, ctx);
    let result: Value = client.fetch(&query).await.context("query failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
