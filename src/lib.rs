//! Localized content resolution and search for a bilingual (Italian/English)
//! travel site.
//!
//! - `locale`, `paths`, `localized`: which language variant to show and how
//!   paths encode it.
//! - `client`, `cache`, `visibility`, `repository`: fetching from the content
//!   repository with live (cached, published only) and preview (uncached,
//!   drafts visible) modes.
//! - `search`: free-text search with ranking, paging and totals.
//! - `media`: legacy image paths and cover/gallery fallbacks.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod locale;
pub mod localized;
pub mod media;
pub mod paths;
pub mod preview;
pub mod queries;
pub mod repository;
pub mod search;
pub mod visibility;

pub use crate::cache::{FreshnessPolicy, QueryKind};
pub use crate::client::{ContentClient, ContentQuery};
pub use crate::error::{ContentError, RepositoryError};
pub use crate::locale::{Locale, RequestContext};
pub use crate::localized::{pick, pick_pair, LocalizedValue};
pub use crate::search::{SearchEngine, SearchRequest, SearchResult};
