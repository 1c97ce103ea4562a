//! Supported content locales and the per-request context built from them.
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two languages the site is published in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    It,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::It, Locale::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::It => "it",
            Locale::En => "en",
        }
    }

    /// Coerce any input to a supported locale. Only `"en"` selects English;
    /// everything else, absent input included, falls back to Italian.
    pub fn normalize(value: Option<&str>) -> Locale {
        match value {
            Some("en") => Locale::En,
            _ => Locale::It,
        }
    }

    /// Exact tag match, used where an unknown tag must not be coerced.
    pub fn from_tag(tag: &str) -> Option<Locale> {
        match tag {
            "it" => Some(Locale::It),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn other(&self) -> Locale {
        match self {
            Locale::It => Locale::En,
            Locale::En => Locale::It,
        }
    }

    /// Locale encoded by the first path segment, defaulting when there is none.
    pub fn from_path(path: &str) -> Locale {
        let segment = path
            .trim_start_matches('/')
            .split(['/', '?', '#'])
            .next()
            .unwrap_or("");
        Locale::normalize(Some(segment))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped state threaded through every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestContext {
    pub locale: Locale,
    pub preview: bool,
}

impl RequestContext {
    pub fn new(locale: Locale, preview: bool) -> Self {
        Self { locale, preview }
    }

    /// Build the context for a page request from its path and the already
    /// validated preview flag.
    pub fn from_path(path: &str, preview: bool) -> Self {
        Self::new(Locale::from_path(path), preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_total() {
        assert_eq!(Locale::normalize(Some("en")), Locale::En);
        assert_eq!(Locale::normalize(Some("it")), Locale::It);
        assert_eq!(Locale::normalize(Some("fr")), Locale::It);
        assert_eq!(Locale::normalize(Some("EN")), Locale::It);
        assert_eq!(Locale::normalize(Some("")), Locale::It);
        assert_eq!(Locale::normalize(None), Locale::It);
    }

    #[test]
    fn other_flips() {
        assert_eq!(Locale::It.other(), Locale::En);
        assert_eq!(Locale::En.other(), Locale::It);
    }

    #[test]
    fn from_path_reads_first_segment() {
        assert_eq!(Locale::from_path("/en/blog/post"), Locale::En);
        assert_eq!(Locale::from_path("/en"), Locale::En);
        assert_eq!(Locale::from_path("/en?x=1"), Locale::En);
        assert_eq!(Locale::from_path("/it/blog"), Locale::It);
        assert_eq!(Locale::from_path("/english/blog"), Locale::It);
        assert_eq!(Locale::from_path("/"), Locale::It);
        assert_eq!(Locale::from_path(""), Locale::It);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&Locale::En).unwrap();
        assert_eq!(json, "\"en\"");
        let parsed: Locale = serde_json::from_str("\"it\"").unwrap();
        assert_eq!(parsed, Locale::It);
    }

    #[test]
    fn request_context_from_path() {
        let ctx = RequestContext::from_path("/en/destinations", true);
        assert_eq!(ctx.locale, Locale::En);
        assert!(ctx.preview);
    }
}
