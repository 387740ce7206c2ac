//! The editable in-memory working copy a UI binds against. Every mutation
//! returns a new snapshot; nothing is mutated in place, so callers get
//! undo/redo and predictable re-render semantics for free.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::images;
use crate::model::{CategoryDocument, SelectionHeader, SelectionItem};
use crate::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemField {
    TypeOrModel,
    LinkOrSku,
    Notes,
}

impl ItemField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "type" | "type_or_model" => Some(ItemField::TypeOrModel),
            "link" | "link_or_sku" => Some(ItemField::LinkOrSku),
            "notes" => Some(ItemField::Notes),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelectionSession {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub contact_email: String,

    /// Keyed by category label. Item order is display order.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<SelectionItem>>,

    /// In-flight image uploads. Saves are refused until this reaches zero so
    /// a transient preview reference can never be persisted.
    #[serde(default)]
    pending_uploads: usize,
}

impl SelectionSession {
    /// Rebuilds a session from loaded documents.
    pub fn load(header: Option<&SelectionHeader>, categories: &[CategoryDocument]) -> Self {
        let mut session = SelectionSession::default();
        if let Some(h) = header {
            session.display_name = h.display_name.clone();
            session.contact_email = h.contact_email.clone();
        }
        for doc in categories {
            session.categories.insert(
                doc.category_label.clone(),
                normalize::normalize_items(&doc.items),
            );
        }
        session
    }

    pub fn pending_uploads(&self) -> usize {
        self.pending_uploads
    }

    pub fn items(&self, category: &str) -> &[SelectionItem] {
        self.categories.get(category).map_or(&[], |v| v.as_slice())
    }

    pub fn set_field(&self, category: &str, index: usize, field: ItemField, value: &str) -> Self {
        let mut next = self.clone();
        let items = next.ensure_slot(category, index);
        match field {
            ItemField::TypeOrModel => items[index].type_or_model = value.to_string(),
            ItemField::LinkOrSku => items[index].link_or_sku = value.to_string(),
            ItemField::Notes => items[index].notes = value.to_string(),
        }
        next
    }

    pub fn add_item(&self, category: &str) -> Self {
        let mut next = self.clone();
        next.categories
            .entry(category.to_string())
            .or_default()
            .push(SelectionItem::default());
        next
    }

    /// Removes the item at `index`, shifting later items down. Out-of-bounds
    /// indices are a no-op: the caller's reference was already stale.
    pub fn remove_item(&self, category: &str, index: usize) -> Self {
        let mut next = self.clone();
        if let Some(items) = next.categories.get_mut(category)
            && index < items.len()
        {
            items.remove(index);
        }
        next
    }

    /// First phase of an image attach: a preview reference becomes visible
    /// immediately and the pending-upload count goes up. The caller uploads
    /// and then calls `complete_upload` or `fail_upload`.
    pub fn attach_preview(&self, category: &str, index: usize, filename: &str) -> (Self, String) {
        let preview = images::issue_preview(filename);
        let mut next = self.clone();
        let items = next.ensure_slot(category, index);
        items[index].images.push(preview.clone());
        next.pending_uploads += 1;
        (next, preview)
    }

    /// Swaps a preview reference for its durable URL, keeping set semantics:
    /// if the URL is already present the preview is simply dropped.
    pub fn complete_upload(&self, preview_ref: &str, url: &str) -> Self {
        let mut next = self.clone();
        for items in next.categories.values_mut() {
            for item in items.iter_mut() {
                if let Some(pos) = item.images.iter().position(|r| r == preview_ref) {
                    if item.images.iter().any(|u| u == url) {
                        item.images.remove(pos);
                    } else {
                        item.images[pos] = url.to_string();
                    }
                }
            }
        }
        next.pending_uploads = next.pending_uploads.saturating_sub(1);
        next
    }

    /// Marks an upload as failed. The preview reference stays in place so the
    /// user sees what they attached; it is dropped at persist time. The
    /// session is never silently rolled back.
    pub fn fail_upload(&self, _preview_ref: &str) -> Self {
        let mut next = self.clone();
        next.pending_uploads = next.pending_uploads.saturating_sub(1);
        next
    }

    /// Canonical, persistable view of every category. Refuses while uploads
    /// are in flight; any leftover non-durable reference (from a failed
    /// upload) is dropped from `images`, the item itself kept.
    pub fn to_persistable(
        &self,
    ) -> Result<BTreeMap<String, Vec<SelectionItem>>, SelectionError> {
        if self.pending_uploads > 0 {
            return Err(SelectionError::UploadsPending(self.pending_uploads));
        }
        let mut out = BTreeMap::new();
        for (label, items) in &self.categories {
            out.insert(label.clone(), normalize::normalize_items(items));
        }
        Ok(out)
    }

    fn ensure_slot(&mut self, category: &str, index: usize) -> &mut Vec<SelectionItem> {
        let items = self.categories.entry(category.to_string()).or_default();
        while items.len() <= index {
            items.push(SelectionItem::default());
        }
        items
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
