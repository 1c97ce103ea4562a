//! Image selection for destinations, posts and galleries.
//!
//! Produces site-relative image paths only; turning a path into a delivery
//! URL (resizing, formats) belongs to the image service.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{CountryMedia, MediaSettings};
use crate::locale::Locale;
use crate::localized::{Blank, LocalizedValue};

static LEGACY_DESTINATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/destinations/([^/]+)/([^/]+)$").expect("valid legacy destination pattern")
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

/// An image reference as stored on a content record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: LocalizedValue<String>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
}

impl Blank for ImageRef {
    fn is_blank(&self) -> bool {
        self.src.trim().is_empty()
    }
}

/// The media-bearing part of a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaFields {
    #[serde(default)]
    pub cover: Option<ImageRef>,
    #[serde(default)]
    pub gallery: Vec<ImageRef>,
    /// Country slug, used to look up default imagery.
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedImage {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

impl ResolvedImage {
    fn bare(src: String) -> Self {
        Self {
            src,
            alt: None,
            orientation: None,
        }
    }

    fn from_ref(image: &ImageRef, locale: Locale) -> Self {
        Self {
            src: normalize_legacy_path(image.src.trim()),
            alt: image.alt.pick(locale).cloned(),
            orientation: image.orientation,
        }
    }
}

/// Rewrite `/destinations/{country}/{file}` to
/// `/destinations/images/{country}/{file}`. Other paths pass through.
pub fn normalize_legacy_path(src: &str) -> String {
    match LEGACY_DESTINATION.captures(src) {
        Some(caps) if &caps[1] != "images" => {
            format!("/destinations/images/{}/{}", &caps[1], &caps[2])
        }
        _ => src.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct MediaResolver {
    settings: MediaSettings,
}

impl MediaResolver {
    pub fn new(settings: MediaSettings) -> Self {
        Self { settings }
    }

    pub fn placeholder(&self) -> &str {
        &self.settings.placeholder
    }

    fn country_defaults(&self, media: &MediaFields) -> Option<&CountryMedia> {
        let country = media.country.as_deref()?.trim();
        self.settings.countries.get(country)
    }

    /// Explicit cover, else the country's default cover, else the placeholder.
    pub fn resolve_cover(&self, media: &MediaFields, locale: Locale) -> ResolvedImage {
        if let Some(cover) = media.cover.as_ref().filter(|c| !c.is_blank()) {
            return ResolvedImage::from_ref(cover, locale);
        }
        let default_cover = self
            .country_defaults(media)
            .and_then(|d| d.cover.as_deref())
            .filter(|src| !src.is_blank());
        match default_cover {
            Some(src) => ResolvedImage::bare(normalize_legacy_path(src.trim())),
            None => ResolvedImage::bare(self.settings.placeholder.clone()),
        }
    }

    /// Explicit gallery if it has any usable image, else the country's
    /// default gallery; at most `limit` images either way.
    pub fn resolve_gallery(
        &self,
        media: &MediaFields,
        locale: Locale,
        limit: usize,
    ) -> Vec<ResolvedImage> {
        let explicit: Vec<ResolvedImage> = media
            .gallery
            .iter()
            .filter(|image| !image.is_blank())
            .take(limit)
            .map(|image| ResolvedImage::from_ref(image, locale))
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }

        self.country_defaults(media)
            .map(|d| {
                d.gallery
                    .iter()
                    .filter(|src| !src.is_blank())
                    .take(limit)
                    .map(|src| ResolvedImage::bare(normalize_legacy_path(src.trim())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
