use std::collections::BTreeMap;

use serde_json::Value;

use super::*;

/// One owner's full selection tree: the header plus every category document,
/// keyed by slug id. Kept in memory behind the state lock and persisted as a
/// single JSON file, so a document batch commits atomically.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub(super) struct OwnerRecord {
    pub header: Value,

    #[serde(default)]
    pub categories: BTreeMap<String, Value>,
}

pub(super) fn owners_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("owners")
}

pub(super) fn owner_path(data_dir: &std::path::Path, owner: &str) -> PathBuf {
    owners_dir(data_dir).join(format!("{owner}.json"))
}

pub(super) fn storage_root(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("storage")
}

pub(super) fn load_owners_from_disk(
    data_dir: &std::path::Path,
) -> Result<HashMap<String, OwnerRecord>> {
    let mut out = HashMap::new();
    let dir = owners_dir(data_dir);
    if !dir.is_dir() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(&dir).context("read owners dir")? {
        let entry = entry.context("read owners dir entry")?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Some(owner) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let bytes =
            std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let record: OwnerRecord = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        out.insert(owner.to_string(), record);
    }
    Ok(out)
}

pub(super) fn persist_owner(
    data_dir: &std::path::Path,
    owner: &str,
    record: &OwnerRecord,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(record).context("serialize owner record")?;
    write_atomic_overwrite(&owner_path(data_dir, owner), &bytes).context("write owner record")?;
    Ok(())
}

pub(super) fn remove_owner_file(data_dir: &std::path::Path, owner: &str) -> Result<()> {
    let path = owner_path(data_dir, owner);
    if path.exists() {
        std::fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}

/// Shallow merge-write: every top-level field of `patch` overwrites the
/// target, everything absent from `patch` survives.
pub(super) fn merge_into(target: &mut Value, patch: &Value) {
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) else {
        return;
    };
    for (k, v) in patch {
        target.insert(k.clone(), v.clone());
    }
}

/// Server-assigned timestamp, monotonically non-decreasing against the
/// previous value of the same document: a clock step backwards (or two writes
/// in the same instant) still moves the timestamp forward by a millisecond.
pub(super) fn next_updated_at(prev: Option<&str>) -> String {
    let now = time::OffsetDateTime::now_utc();
    let ts = match prev.and_then(|p| {
        time::OffsetDateTime::parse(p, &time::format_description::well_known::Rfc3339).ok()
    }) {
        Some(prev) if now <= prev => prev + time::Duration::milliseconds(1),
        _ => now,
    };
    ts.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}

pub(super) fn doc_updated_at(doc: &Value) -> Option<&str> {
    doc.get("updated_at").and_then(|v| v.as_str())
}

pub(super) fn write_atomic_overwrite(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/bin/picksheet_server/persistence_tests.rs"]
mod tests;
