use serde::Deserialize;

use super::*;

/// One level of a storage-prefix listing: object paths directly under the
/// prefix plus child prefixes to recurse into.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StorageListing {
    #[serde(default)]
    pub items: Vec<String>,

    #[serde(default)]
    pub prefixes: Vec<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl RemoteClient {
    /// Stores bytes under `path` and returns the durable fetchable URL.
    pub fn upload_object(&self, path: &str, bytes: Vec<u8>) -> RemoteResult<String> {
        let resp = self
            .client
            .put(self.url(&format!("/o/{}", encode_storage_path(path))))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .body(bytes)
            .send()
            .map_err(|e| Self::transport("upload object", e))?;
        let out: UploadResponse = self
            .ensure_ok(resp, "upload object")?
            .json()
            .map_err(|e| Self::transport("parse upload response", e))?;
        Ok(out.url)
    }

    pub fn delete_object(&self, path: &str) -> RemoteResult<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/o/{}", encode_storage_path(path))))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("delete object", e))?;
        let _ = self.ensure_ok(resp, "delete object")?;
        Ok(())
    }

    /// Non-recursive listing; callers walk `prefixes` themselves.
    pub fn list_prefix(&self, prefix: &str) -> RemoteResult<StorageListing> {
        let resp = self
            .client
            .get(self.url("/storage"))
            .query(&[("prefix", prefix)])
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("list storage prefix", e))?;
        let out: StorageListing = self
            .ensure_ok(resp, "list storage prefix")?
            .json()
            .map_err(|e| Self::transport("parse storage listing", e))?;
        Ok(out)
    }

    /// The durable URL the server would hand out for `path`.
    pub fn object_url(&self, path: &str) -> String {
        format!(
            "{}/o/{}?alt=media",
            self.base_url,
            encode_storage_path(path)
        )
    }
}

/// Percent-encodes a storage path for the `/o/{path}` URL shape. Slashes are
/// encoded too, so the whole path rides in a single URI segment.
pub fn encode_storage_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() * 3);
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Inverse of `encode_storage_path`. `None` for malformed percent sequences.
pub fn decode_storage_path(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
#[path = "../tests/remote/objects_tests.rs"]
mod tests;
