//! Image reference resolution: local preview handles, durable uploads keyed
//! by owner and category, and the inverse URL-to-path mapping used only by
//! deletion.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SelectionError;
use crate::model::category_id;
use crate::normalize::is_durable_url;
use crate::remote::{RemoteClient, decode_storage_path};

pub const PREVIEW_SCHEME: &str = "preview://";

static PREVIEW_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Issues a process-local preview reference for a just-selected file. Usable
/// for immediate display, revoked implicitly at process exit, and never
/// persisted: it fails the durable-URL filter by construction.
pub fn issue_preview(filename: &str) -> String {
    let n = PREVIEW_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{PREVIEW_SCHEME}{n}/{filename}")
}

pub fn is_preview_ref(reference: &str) -> bool {
    reference.starts_with(PREVIEW_SCHEME)
}

pub struct ImageResolver<'a> {
    client: &'a RemoteClient,
}

impl<'a> ImageResolver<'a> {
    pub fn new(client: &'a RemoteClient) -> Self {
        Self { client }
    }

    /// Uploads bytes under the owner/category prefix and returns the durable
    /// URL. A transient failure triggers one retry with a freshly re-issued
    /// credential before the error is surfaced.
    pub fn upload(
        &self,
        owner: &str,
        category: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SelectionError> {
        let path = upload_path(owner, category, filename, &bytes);
        match self.client.upload_object(&path, bytes.clone()) {
            Ok(url) => Ok(url),
            Err(err) if err.is_transient() => {
                eprintln!("[picksheet] upload failed ({err}); refreshing credential and retrying");
                self.client.refresh_token()?;
                self.client.upload_object(&path, bytes)
            }
            Err(err) => Err(err),
        }
    }

    /// Pass-through for already-durable URLs; bare storage paths (written by
    /// historic clients) are resolved to their durable URL.
    pub fn resolve_to_url(&self, reference: &str) -> String {
        if is_durable_url(reference) {
            reference.to_string()
        } else {
            self.client.object_url(reference)
        }
    }

    /// Durable replacement for a historic bare storage path, `None` when the
    /// reference is already durable or not a storage path at all (preview
    /// handles and other schemes stay as written, to be filtered out).
    pub fn upgrade_legacy_ref(&self, reference: &str) -> Option<String> {
        if reference.is_empty() || reference.contains("://") {
            return None;
        }
        Some(self.resolve_to_url(reference))
    }

    /// Recursively removes every stored object under the owner's prefix.
    /// Individual failures are logged and skipped; the walk never fails the
    /// caller.
    pub fn delete_tree(&self, owner: &str) {
        self.delete_prefix(&format!("uploads/{owner}"));
    }

    fn delete_prefix(&self, prefix: &str) {
        let listing = match self.client.list_prefix(prefix) {
            Ok(l) => l,
            Err(err) => {
                eprintln!("[picksheet] list {prefix} failed: {err}");
                return;
            }
        };
        for path in &listing.items {
            if let Err(err) = self.client.delete_object(path) {
                eprintln!("[picksheet] delete {path} failed: {err}");
            }
        }
        for sub in &listing.prefixes {
            self.delete_prefix(sub);
        }
    }

    /// Best-effort deletion of one item's images after the document write has
    /// been confirmed. URLs that don't map back to a storage path are
    /// silently skipped (nothing to delete).
    pub fn delete_images(&self, urls: &[String]) {
        for url in urls {
            if let Some(path) = extract_storage_path(url)
                && let Err(err) = self.client.delete_object(&path)
            {
                eprintln!("[picksheet] delete image {path} failed: {err}");
            }
        }
    }
}

/// Inverse mapping from a durable URL to its storage path, via the
/// `/o/{encoded-path}` shape. `None` (not an error) for anything else.
pub fn extract_storage_path(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/o/")?;
    let encoded = rest.split(['?', '#']).next()?;
    if encoded.is_empty() {
        return None;
    }
    decode_storage_path(encoded)
}

/// Object path for an upload: `uploads/{owner}/{slug}/{hash16}_{name}`. The
/// content-hash prefix makes a concurrent re-upload of the same bytes land on
/// the same object instead of racing.
fn upload_path(owner: &str, category: &str, filename: &str, bytes: &[u8]) -> String {
    let digest = blake3::hash(bytes).to_hex().to_string();
    let name = sanitize_filename(filename);
    format!(
        "uploads/{owner}/{}/{}_{name}",
        category_id(category),
        &digest[..16]
    )
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "tests/images_tests.rs"]
mod tests;
