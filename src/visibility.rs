//! Which records a public (non-draft) view may show.
//!
//! A record is public when its `status` is `"published"` or when it has no
//! status at all, and its id is not a draft id. Draft views see everything.
use serde_json::Value;

pub const STATUS_FIELD: &str = "status";
pub const PUBLISHED: &str = "published";
const DRAFT_ID_PREFIX: &str = "drafts.";

/// Query-language clause applying the same rule inside the repository.
pub fn filter_fragment(preview: bool) -> &'static str {
    if preview {
        "true"
    } else {
        r#"(!defined(status) || status == "published") && !(_id in path("drafts.**"))"#
    }
}

pub fn is_draft_id(id: &str) -> bool {
    id.starts_with(DRAFT_ID_PREFIX)
}

pub fn is_visible(record: &Value, preview: bool) -> bool {
    if preview {
        return true;
    }
    let Some(fields) = record.as_object() else {
        return true;
    };
    if fields
        .get("_id")
        .and_then(Value::as_str)
        .is_some_and(is_draft_id)
    {
        return false;
    }
    match fields.get(STATUS_FIELD) {
        None | Some(Value::Null) => true,
        Some(Value::String(status)) => status == PUBLISHED,
        Some(_) => false,
    }
}

/// Drop records a public view must not see. Lists are filtered in place; a
/// single hidden document becomes `null`, i.e. "not found".
pub fn retain_visible(value: Value, preview: bool) -> Value {
    if preview {
        return value;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|record| is_visible(record, false))
                .collect(),
        ),
        Value::Object(_) if !is_visible(&value, false) => Value::Null,
        other => other,
    }
}

/// Rows of a list answer that a public view drops.
pub fn hidden_count(value: &Value, preview: bool) -> u64 {
    match value {
        Value::Array(items) if !preview => {
            items.iter().filter(|record| !is_visible(record, false)).count() as u64
        }
        _ => 0,
    }
}
