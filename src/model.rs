use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Submission state of an owner's selections. The portal never enforces a
/// transition graph: any value may move to any other value, set by either the
/// owner or an admin, and unknown strings written by older clients round-trip
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Pending,
    Submitted,
    Reviewed,
    Final,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "pending",
            Status::Submitted => "submitted",
            Status::Reviewed => "reviewed",
            Status::Final => "final",
            Status::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Status::Pending,
            "submitted" => Status::Submitted,
            "reviewed" => Status::Reviewed,
            "final" => Status::Final,
            other => Status::Other(other.to_string()),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Status::parse(&s))
    }
}

/// Derived per-category item count stored on the header for the admin list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub count: usize,
}

/// Per-owner summary document driving the admin list view. `owner_id` is
/// assigned at creation and never changes; `category_summary` is recomputed on
/// every save and may be stale between saves (the category docs are the source
/// of truth for exact counts).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionHeader {
    pub owner_id: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub contact_email: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub category_summary: BTreeMap<String, CategoryCount>,

    #[serde(default)]
    pub updated_at: String,
}

impl SelectionHeader {
    pub fn total_count(&self) -> usize {
        self.category_summary.values().map(|c| c.count).sum()
    }
}

/// Detailed per-category record, keyed by the slugified category id. Item
/// order is exactly the display order; an item has no identity beyond its
/// index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDocument {
    pub category_label: String,

    #[serde(default)]
    pub items: Vec<SelectionItem>,

    #[serde(default)]
    pub updated_at: String,
}

/// One product selection entry. `images` keeps insertion order for display but
/// carries set semantics: a URL is never stored twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionItem {
    #[serde(default)]
    pub type_or_model: String,

    #[serde(default)]
    pub link_or_sku: String,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub images: Vec<String>,
}

impl SelectionItem {
    pub fn is_empty(&self) -> bool {
        self.type_or_model.is_empty()
            && self.link_or_sku.is_empty()
            && self.notes.is_empty()
            && self.images.is_empty()
    }

    /// Appends a URL with set semantics (no duplicate stored twice).
    pub fn push_image(&mut self, url: &str) {
        if !self.images.iter().any(|u| u == url) {
            self.images.push(url.to_string());
        }
    }
}

const CATEGORY_ID_MAX_LEN: usize = 150;

/// Slugified document id for a category label: runs of anything outside
/// `[A-Za-z0-9_-]` collapse to a single `_`, capped at 150 chars. An empty
/// label maps to `Uncategorized`.
pub fn category_id(label: &str) -> String {
    let label = if label.is_empty() {
        "Uncategorized"
    } else {
        label
    };
    let mut out = String::with_capacity(label.len());
    let mut in_run = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out.truncate(CATEGORY_ID_MAX_LEN);
    out
}

pub fn now_ts() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
