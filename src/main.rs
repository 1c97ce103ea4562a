use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use travel_content::cache::QueryCache;
use travel_content::config;
use travel_content::media::MediaResolver;
use travel_content::paths::{ensure_locale_prefix, strip_locale_prefix, toggle_locale_path};
use travel_content::preview::{self, SharedSecret};
use travel_content::repository::HttpRepository;
use travel_content::{ContentClient, FreshnessPolicy, Locale, SearchEngine, SearchRequest};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a site search and print the result as JSON
    Search {
        /// Free-text query
        q: String,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
        /// Page path the search is issued from; its first segment selects the locale
        #[arg(long, default_value = "/it/search")]
        path: String,
        /// Preview secret; unlocks drafts when it matches the configured one
        #[arg(long)]
        preview_token: Option<String>,
    },
    /// Locale path helpers
    Path {
        #[command(subcommand)]
        op: PathOp,
    },
}

#[derive(Debug, Subcommand)]
enum PathOp {
    Ensure { locale: String, path: String },
    Strip { path: String },
    Toggle { path: String, current: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match args.command {
        Command::Path { op } => {
            let out = match op {
                PathOp::Ensure { locale, path } => {
                    ensure_locale_prefix(Locale::normalize(Some(&locale)), &path)
                }
                PathOp::Strip { path } => strip_locale_prefix(&path),
                PathOp::Toggle { path, current } => {
                    toggle_locale_path(&path, Locale::normalize(Some(&current)))
                }
            };
            println!("{}", out);
            Ok(())
        }
        Command::Search {
            q,
            page,
            limit,
            path,
            preview_token,
        } => {
            let mut cfg = config::load(Some(&args.config))?;
            cfg.apply_env();

            let repository = HttpRepository::from_settings(&cfg.repository)
                .context("failed to build repository client")?;
            let client = ContentClient::with_cache(
                Arc::new(repository),
                FreshnessPolicy::from_settings(&cfg.cache),
                QueryCache::from_settings(&cfg.cache),
            );
            let engine = SearchEngine::new(
                client,
                cfg.search.clone(),
                MediaResolver::new(cfg.media.clone()),
            );

            let authorizer = SharedSecret::new(cfg.preview.secret.clone());
            let ctx = preview::request_context(&authorizer, &path, preview_token.as_deref());
            info!(locale = %ctx.locale, preview = ctx.preview, "searching");

            let request = SearchRequest { q, page, limit };
            let result = engine.search(&request, ctx).await.context("search failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}
