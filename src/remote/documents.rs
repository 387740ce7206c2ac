use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::*;

/// One category document as listed by the server, paired with its slug id.
#[derive(Clone, Debug, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub doc: Value,
}

impl RemoteClient {
    pub fn list_headers(&self) -> RemoteResult<Vec<Value>> {
        let resp = self
            .client
            .get(self.url("/owners"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("list owners", e))?;
        let out: Vec<Value> = self
            .ensure_ok(resp, "list owners")?
            .json()
            .map_err(|e| Self::transport("parse owners", e))?;
        Ok(out)
    }

    pub fn get_header(&self, owner: &str) -> RemoteResult<Value> {
        let resp = self
            .client
            .get(self.url(&format!("/owners/{owner}")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("get header", e))?;
        let v: Value = self
            .ensure_ok(resp, &format!("header for {owner}"))?
            .json()
            .map_err(|e| Self::transport("parse header", e))?;
        Ok(v)
    }

    /// Merge-write on the header: fields absent from `patch` are preserved.
    pub fn merge_header(&self, owner: &str, patch: &Value) -> RemoteResult<()> {
        let resp = self
            .client
            .patch(self.url(&format!("/owners/{owner}")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(patch)
            .send()
            .map_err(|e| Self::transport("merge header", e))?;
        let _ = self.ensure_ok(resp, "merge header")?;
        Ok(())
    }

    pub fn list_categories(&self, owner: &str) -> RemoteResult<Vec<CategoryEntry>> {
        let resp = self
            .client
            .get(self.url(&format!("/owners/{owner}/categories")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("list categories", e))?;
        let out: Vec<CategoryEntry> = self
            .ensure_ok(resp, &format!("categories for {owner}"))?
            .json()
            .map_err(|e| Self::transport("parse categories", e))?;
        Ok(out)
    }

    pub fn get_category(&self, owner: &str, category_id: &str) -> RemoteResult<Value> {
        let resp = self
            .client
            .get(self.url(&format!("/owners/{owner}/categories/{category_id}")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("get category", e))?;
        let v: Value = self
            .ensure_ok(resp, &format!("category {category_id}"))?
            .json()
            .map_err(|e| Self::transport("parse category", e))?;
        Ok(v)
    }

    pub fn merge_category(&self, owner: &str, category_id: &str, patch: &Value) -> RemoteResult<()> {
        let resp = self
            .client
            .patch(self.url(&format!("/owners/{owner}/categories/{category_id}")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(patch)
            .send()
            .map_err(|e| Self::transport("merge category", e))?;
        let _ = self.ensure_ok(resp, "merge category")?;
        Ok(())
    }

    /// One all-or-nothing upsert: a header merge plus a merge per category.
    /// The server applies the whole set under a single owner write lock.
    pub fn batch_save(
        &self,
        owner: &str,
        header_patch: &Value,
        categories: &BTreeMap<String, Value>,
    ) -> RemoteResult<()> {
        let resp = self
            .client
            .post(self.url(&format!("/owners/{owner}/batch")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&serde_json::json!({
                "header": header_patch,
                "categories": categories,
            }))
            .send()
            .map_err(|e| Self::transport("batch save", e))?;
        let _ = self.ensure_ok(resp, "batch save")?;
        Ok(())
    }

    /// Atomic append of a durable URL into one item slot, padding missing
    /// slots server-side. Concurrent appends to the same slot both survive.
    pub fn append_image(
        &self,
        owner: &str,
        category_id: &str,
        index: usize,
        url: &str,
    ) -> RemoteResult<()> {
        let resp = self
            .client
            .post(self.url(&format!(
                "/owners/{owner}/categories/{category_id}/append-image"
            )))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&serde_json::json!({ "index": index, "url": url }))
            .send()
            .map_err(|e| Self::transport("append image", e))?;
        let _ = self.ensure_ok(resp, "append image")?;
        Ok(())
    }

    /// Deletes the header and every category document in one server-side
    /// batch. Idempotent: deleting an absent owner succeeds.
    pub fn delete_owner_docs(&self, owner: &str) -> RemoteResult<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/owners/{owner}")))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("delete owner", e))?;
        let _ = self.ensure_ok(resp, "delete owner")?;
        Ok(())
    }
}
