//! Coercion of heterogeneous persisted item shapes into canonical records.
//!
//! Older clients wrote category blocks as a single flattened object, as an
//! `Items` array with capitalized field names, or with images scattered across
//! `Images`/`images`/`Image`/`image`. Everything funnels through here so the
//! rest of the crate only ever sees `SelectionItem`.

use serde_json::Value;

use crate::model::SelectionItem;

/// True for references that may be persisted: strings with a case-insensitive
/// `http://` or `https://` prefix. Local preview handles fail this by
/// construction.
pub fn is_durable_url(s: &str) -> bool {
    // `get` instead of slicing: a multibyte char straddling the prefix
    // length must make this false, not panic.
    let lower_prefix = |p: &str| s.get(..p.len()).is_some_and(|pre| pre.eq_ignore_ascii_case(p));
    lower_prefix("https://") || lower_prefix("http://")
}

/// Normalizes a raw category payload of unknown shape into an ordered item
/// sequence.
///
/// Accepted shapes: a plain array of items, an object carrying `items` or
/// `Items`, or a bare legacy object treated as a single-element sequence.
/// Malformed array elements (non-objects) coerce to an empty item rather than
/// failing the whole payload.
pub fn normalize_block(raw: &Value) -> Vec<SelectionItem> {
    normalize_block_with(raw, &|_| None)
}

/// Same coercion, with a resolver hook applied to every image reference
/// before the durable-URL filter. The load path uses this to upgrade
/// historic bare storage paths to their durable URLs instead of losing
/// them; a hook returning `None` leaves the reference as written.
pub fn normalize_block_with(
    raw: &Value,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> Vec<SelectionItem> {
    let items: Vec<&Value> = match raw {
        Value::Array(arr) => arr.iter().collect(),
        Value::Object(map) => {
            if let Some(Value::Array(arr)) = map.get("items").or_else(|| map.get("Items")) {
                arr.iter().collect()
            } else {
                vec![raw]
            }
        }
        _ => Vec::new(),
    };
    items.iter().map(|v| item_from_value_with(v, resolve)).collect()
}

/// Builds one canonical item from a raw value. Non-objects become the empty
/// item.
pub fn item_from_value(raw: &Value) -> SelectionItem {
    item_from_value_with(raw, &|_| None)
}

fn item_from_value_with(raw: &Value, resolve: &dyn Fn(&str) -> Option<String>) -> SelectionItem {
    let Value::Object(map) = raw else {
        return SelectionItem::default();
    };
    SelectionItem {
        type_or_model: string_field(map, &["type_or_model", "Type", "type"]),
        link_or_sku: string_field(map, &["link_or_sku", "Link", "link"]),
        notes: string_field(map, &["notes", "Notes"]),
        images: image_urls_with(map, resolve),
    }
}

fn string_field(map: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        if let Some(Value::String(s)) = map.get(*key) {
            return s.clone();
        }
    }
    String::new()
}

/// Collects every image-field variant in first-seen order, keeps only durable
/// URLs, and drops duplicates.
pub fn image_urls(map: &serde_json::Map<String, Value>) -> Vec<String> {
    image_urls_with(map, &|_| None)
}

fn image_urls_with(
    map: &serde_json::Map<String, Value>,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> Vec<String> {
    let mut candidates: Vec<&str> = Vec::new();
    for key in ["images", "Images"] {
        if let Some(v) = map.get(key) {
            collect_strings(v, &mut candidates);
        }
    }
    for key in ["Image", "image"] {
        if let Some(Value::String(s)) = map.get(key) {
            candidates.push(s);
        }
    }

    let mut out: Vec<String> = Vec::new();
    for url in candidates {
        let url = resolve(url).unwrap_or_else(|| url.to_string());
        if is_durable_url(&url) && !out.iter().any(|u| u == &url) {
            out.push(url);
        }
    }
    out
}

fn collect_strings<'a>(v: &'a Value, out: &mut Vec<&'a str>) {
    match v {
        Value::Array(arr) => {
            for e in arr {
                if let Value::String(s) = e {
                    out.push(s);
                }
            }
        }
        // Some legacy docs stored the array as an index-keyed object.
        Value::Object(map) => {
            for e in map.values() {
                if let Value::String(s) = e {
                    out.push(s);
                }
            }
        }
        Value::String(s) => out.push(s),
        _ => {}
    }
}

/// Re-normalizes already-typed items, enforcing the durable-URL filter and
/// set semantics on `images`. Idempotent.
pub fn normalize_items(items: &[SelectionItem]) -> Vec<SelectionItem> {
    items
        .iter()
        .map(|it| {
            let mut images: Vec<String> = Vec::new();
            for url in &it.images {
                if is_durable_url(url) && !images.iter().any(|u| u == url) {
                    images.push(url.clone());
                }
            }
            SelectionItem {
                type_or_model: it.type_or_model.clone(),
                link_or_sku: it.link_or_sku.clone(),
                notes: it.notes.clone(),
                images,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
