//! The Selection Document Store: the only component that reads or writes
//! persisted selection state. Owns the two-tier shape (header + per-category
//! docs), the merge/upsert contract and the cascading delete.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SelectionError;
use crate::images::ImageResolver;
use crate::model::{
    CategoryCount, CategoryDocument, SelectionHeader, SelectionItem, Status, category_id,
};
use crate::normalize;
use crate::remote::RemoteClient;

/// Caller-supplied header fields for a save. `status: None` leaves the stored
/// status untouched (merge semantics); the owner-facing save path passes
/// `Pending`.
#[derive(Clone, Debug, Default)]
pub struct HeaderFields {
    pub display_name: String,
    pub contact_email: String,
    pub status: Option<Status>,
}

pub struct SelectionStore<'a> {
    client: &'a RemoteClient,
}

impl<'a> SelectionStore<'a> {
    pub fn new(client: &'a RemoteClient) -> Self {
        Self { client }
    }

    fn resolver(&self) -> ImageResolver<'a> {
        ImageResolver::new(self.client)
    }

    /// Admin list of every header, newest first. With `exact` the
    /// `category_summary` of each header is recomputed from a live scan of
    /// that owner's category docs, the source of truth when a writer was
    /// interrupted mid-save.
    pub fn load_all(&self, exact: bool) -> Result<Vec<SelectionHeader>, SelectionError> {
        let raw = self.client.list_headers()?;
        let mut out: Vec<SelectionHeader> = raw.iter().map(header_from_value).collect();
        if exact {
            for header in &mut out {
                let categories = self.load_categories(&header.owner_id)?;
                header.category_summary = summarize(&categories);
            }
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }

    /// Every category document for one owner, ascending by label,
    /// case-insensitive. Image references stored as bare storage paths by
    /// historic clients are resolved to durable URLs on the way out.
    pub fn load_categories(&self, owner: &str) -> Result<Vec<CategoryDocument>, SelectionError> {
        let entries = self.client.list_categories(owner)?;
        let resolver = self.resolver();
        let upgrade = |r: &str| resolver.upgrade_legacy_ref(r);
        let mut out: Vec<CategoryDocument> = entries
            .iter()
            .map(|e| category_from_value(&e.id, &e.doc, &upgrade))
            .collect();
        out.sort_by(|a, b| {
            a.category_label
                .to_lowercase()
                .cmp(&b.category_label.to_lowercase())
        });
        Ok(out)
    }

    pub fn load_header(&self, owner: &str) -> Result<SelectionHeader, SelectionError> {
        let v = self.client.get_header(owner)?;
        Ok(header_from_value(&v))
    }

    /// One atomic-intent upsert: a header merge-write (with the recomputed
    /// summary) plus a merge-write per category holding at least one item.
    /// Categories that became empty are intentionally NOT deleted here;
    /// deletion only ever happens through the explicit delete operations.
    pub fn save_all(
        &self,
        owner: &str,
        fields: &HeaderFields,
        categories: &BTreeMap<String, Vec<SelectionItem>>,
    ) -> Result<(), SelectionError> {
        let mut summary = serde_json::Map::new();
        for (label, items) in categories {
            summary.insert(
                label.clone(),
                serde_json::json!({ "count": items.len() }),
            );
        }

        let mut header = serde_json::Map::new();
        header.insert("owner_id".into(), Value::String(owner.to_string()));
        header.insert(
            "display_name".into(),
            Value::String(fields.display_name.clone()),
        );
        header.insert(
            "contact_email".into(),
            Value::String(fields.contact_email.clone()),
        );
        if let Some(status) = &fields.status {
            header.insert("status".into(), Value::String(status.as_str().to_string()));
        }
        header.insert("category_summary".into(), Value::Object(summary));

        let mut docs = BTreeMap::new();
        for (label, items) in categories {
            if items.is_empty() {
                continue;
            }
            docs.insert(
                category_id(label),
                serde_json::json!({
                    "category_label": label,
                    "items": items,
                }),
            );
        }

        self.client.batch_save(owner, &Value::Object(header), &docs)
    }

    /// Removes one item by its current index, shifting later items down, then
    /// best-effort deletes that item's stored images. `NotFound` if the
    /// category doc is missing or the index is out of current bounds.
    pub fn delete_item(
        &self,
        owner: &str,
        category_id: &str,
        index: usize,
    ) -> Result<(), SelectionError> {
        let doc = self.client.get_category(owner, category_id)?;
        let resolver = self.resolver();
        let mut items = normalize::normalize_block_with(&doc, &|r| resolver.upgrade_legacy_ref(r));
        if index >= items.len() {
            return Err(SelectionError::NotFound(format!(
                "item {index} in {category_id}"
            )));
        }
        let removed = items.remove(index);
        self.client.merge_category(
            owner,
            category_id,
            &serde_json::json!({ "items": items }),
        )?;

        // Documents are already consistent; image cleanup may leak.
        self.resolver().delete_images(&removed.images);
        Ok(())
    }

    /// Deletes the header, every category doc and the owner's storage tree.
    /// The document batch is all-or-nothing and commits first; only then is
    /// the storage purge attempted, best-effort (storage leaks are
    /// acceptable, orphaned documents are not). Calling this twice is a
    /// no-op success the second time.
    pub fn delete_owner(&self, owner: &str) -> Result<(), SelectionError> {
        self.client.delete_owner_docs(owner)?;
        self.resolver().delete_tree(owner);
        Ok(())
    }

    /// Single-field merge-write plus `updated_at` bump. The Store does not
    /// validate the value against the known status set; any string moves to
    /// any other string.
    pub fn set_status(&self, owner: &str, status: &Status) -> Result<(), SelectionError> {
        self.client.merge_header(
            owner,
            &serde_json::json!({ "status": status.as_str() }),
        )
    }

    /// Appends an already-durable URL to one item slot, padding missing slots
    /// and keeping set semantics. Rejected before any write if the URL is not
    /// `https?://`.
    pub fn append_image(
        &self,
        owner: &str,
        category_id: &str,
        index: usize,
        url: &str,
    ) -> Result<(), SelectionError> {
        if !normalize::is_durable_url(url) {
            return Err(SelectionError::Validation(format!(
                "not an http(s) url: {url}"
            )));
        }
        self.client.append_image(owner, category_id, index, url)
    }

    /// Uploads a file and appends its durable URL to the given item slot.
    pub fn persist_item_image(
        &self,
        owner: &str,
        category: &str,
        index: usize,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SelectionError> {
        let url = self.resolver().upload(owner, category, filename, bytes)?;
        self.append_image(owner, &category_id(category), index, &url)?;
        Ok(url)
    }
}

fn header_from_value(v: &Value) -> SelectionHeader {
    serde_json::from_value(v.clone()).unwrap_or_else(|_| SelectionHeader {
        owner_id: v
            .get("owner_id")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        display_name: String::new(),
        contact_email: String::new(),
        status: Status::default(),
        category_summary: BTreeMap::new(),
        updated_at: String::new(),
    })
}

fn category_from_value(
    id: &str,
    doc: &Value,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> CategoryDocument {
    let label = doc
        .get("category_label")
        .or_else(|| doc.get("category"))
        .and_then(|x| x.as_str())
        .unwrap_or(id)
        .to_string();
    CategoryDocument {
        category_label: label,
        items: normalize::normalize_block_with(doc, resolve),
        updated_at: doc
            .get("updated_at")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

fn summarize(categories: &[CategoryDocument]) -> BTreeMap<String, CategoryCount> {
    categories
        .iter()
        .map(|c| {
            (
                c.category_label.clone(),
                CategoryCount {
                    count: c.items.len(),
                },
            )
        })
        .collect()
}
