//! Per-locale values and the fallback rule used to display them.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::locale::Locale;

/// Values that count as missing even when present in the record.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl<T: Blank + ?Sized> Blank for &T {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

/// A field stored once per language, e.g. `{"it": "Lago di Como", "en": "Lake Como"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizedValue<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<T>,
}

impl<T> Default for LocalizedValue<T> {
    fn default() -> Self {
        Self { it: None, en: None }
    }
}

impl<T> LocalizedValue<T> {
    pub fn new(it: Option<T>, en: Option<T>) -> Self {
        Self { it, en }
    }

    pub fn get(&self, locale: Locale) -> Option<&T> {
        match locale {
            Locale::It => self.it.as_ref(),
            Locale::En => self.en.as_ref(),
        }
    }
}

impl<T: Blank> LocalizedValue<T> {
    /// Requested locale, else the other one, else nothing.
    pub fn pick(&self, locale: Locale) -> Option<&T> {
        pick_pair(locale, self.it.as_ref(), self.en.as_ref())
    }

    pub fn into_picked(self, locale: Locale) -> Option<T> {
        pick_pair(locale, self.it, self.en)
    }
}

/// Record-first call shape.
pub fn pick<T: Blank>(record: &LocalizedValue<T>, locale: Locale) -> Option<&T> {
    record.pick(locale)
}

/// Locale-first call shape, for call sites that hold the two variants in
/// separate fields.
pub fn pick_pair<T: Blank>(locale: Locale, it: Option<T>, en: Option<T>) -> Option<T> {
    let (wanted, fallback) = match locale {
        Locale::It => (it, en),
        Locale::En => (en, it),
    };
    wanted
        .filter(|v| !v.is_blank())
        .or_else(|| fallback.filter(|v| !v.is_blank()))
}
