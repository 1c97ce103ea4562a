//! Locale segments on site paths.
//!
//! Every localized page lives under `/{locale}/...`. These helpers add,
//! remove and swap that leading segment without touching the rest of the
//! path, query or fragment. All of them are total string → string functions.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::locale::Locale;

static EXTERNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:|//)").expect("valid external link pattern")
});

/// Links that leave the site (`https:`, `mailto:`, `tel:`, `//cdn...`).
pub fn is_external(path: &str) -> bool {
    EXTERNAL.is_match(path)
}

/// Split `/{tag}{rest}` into the recognized locale and `rest`. The tag must be
/// a whole segment: `/italia` is not an Italian prefix.
fn split_locale(path: &str) -> Option<(Locale, &str)> {
    let after_slash = path.strip_prefix('/')?;
    let tag = after_slash.get(..2)?;
    let locale = Locale::from_tag(tag)?;
    let rest = &after_slash[2..];
    match rest.chars().next() {
        None | Some('/') | Some('?') | Some('#') => Some((locale, rest)),
        _ => None,
    }
}

/// Locale carried by the path's leading segment, if any.
pub fn path_locale(path: &str) -> Option<Locale> {
    split_locale(path).map(|(locale, _)| locale)
}

pub fn ensure_locale_prefix(locale: Locale, path: &str) -> String {
    if is_external(path) || path.starts_with('#') {
        return path.to_string();
    }

    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if split_locale(&normalized).is_some() {
        return normalized;
    }

    let rest = &normalized[1..];
    if rest.is_empty() || rest.starts_with(['?', '#']) {
        return format!("/{locale}{rest}");
    }
    format!("/{locale}{normalized}")
}

/// Path without its locale segment. The result is always site-local:
/// `/it//host/x` becomes `/host/x`, never the protocol-relative `//host/x`.
pub fn strip_locale_prefix(path: &str) -> String {
    match split_locale(path) {
        Some((_, "")) => "/".to_string(),
        Some((_, rest)) if rest.starts_with('/') => format!("/{}", rest.trim_start_matches('/')),
        Some((_, rest)) => format!("/{rest}"),
        None => path.to_string(),
    }
}

/// Put `locale` in place of the path's locale segment, keeping the remainder
/// byte for byte. Unprefixed paths get the segment added.
fn relocalize(path: &str, locale: Locale) -> String {
    match split_locale(path) {
        Some((_, "" | "/")) => format!("/{locale}"),
        Some((_, rest)) => format!("/{locale}{rest}"),
        None => ensure_locale_prefix(locale, path),
    }
}

/// Same page in the other language.
pub fn toggle_locale_path(path: &str, current: Locale) -> String {
    relocalize(path, current.other())
}

/// The page under every supported locale, in [`Locale::ALL`] order.
pub fn alternate_paths(path: &str) -> [(Locale, String); 2] {
    Locale::ALL.map(|locale| (locale, relocalize(path, locale)))
}
