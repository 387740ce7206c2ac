use std::collections::BTreeSet;

use axum::body::Bytes;

use super::*;

/// Relative storage paths only: no empty segments, no traversal.
fn validate_storage_path(path: &str) -> Result<()> {
    if path.is_empty() {
        anyhow::bail!("empty storage path");
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            anyhow::bail!("invalid storage path {path:?}");
        }
    }
    Ok(())
}

/// Non-admins are confined to their own upload tree.
fn can_access_storage(subject: &Subject, path: &str) -> bool {
    if subject.admin {
        return true;
    }
    let own = format!("uploads/{}", subject.handle);
    path == own || path.starts_with(&format!("{own}/"))
}

fn object_file(data_dir: &std::path::Path, path: &str) -> PathBuf {
    let mut out = storage_root(data_dir);
    for segment in path.split('/') {
        out.push(segment);
    }
    out
}

pub(super) async fn put_object(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(path): Path<String>,
    body: Bytes,
) -> Response {
    if let Err(err) = validate_storage_path(&path) {
        return bad_request(err);
    }
    if !can_access_storage(&subject, &path) {
        return forbidden();
    }
    if let Err(err) = write_atomic_overwrite(&object_file(&state.data_dir, &path), &body) {
        return internal_error(err);
    }
    let url = format!(
        "{}/o/{}?alt=media",
        state.base_url,
        picksheet::remote::encode_storage_path(&path)
    );
    Json(serde_json::json!({ "url": url })).into_response()
}

pub(super) async fn get_object(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(path): Path<String>,
) -> Response {
    if let Err(err) = validate_storage_path(&path) {
        return bad_request(err);
    }
    if !can_access_storage(&subject, &path) {
        return forbidden();
    }
    match std::fs::read(object_file(&state.data_dir, &path)) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => not_found(),
        Err(err) => internal_error(err.into()),
    }
}

pub(super) async fn delete_object(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(path): Path<String>,
) -> Response {
    if let Err(err) = validate_storage_path(&path) {
        return bad_request(err);
    }
    if !can_access_storage(&subject, &path) {
        return forbidden();
    }
    match std::fs::remove_file(object_file(&state.data_dir, &path)) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return internal_error(err.into()),
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

#[derive(serde::Deserialize)]
pub(super) struct PrefixQuery {
    #[serde(default)]
    prefix: String,
}

/// One level of the storage tree under `prefix`: object paths as `items`,
/// child directories as `prefixes`.
pub(super) async fn list_storage(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Query(query): Query<PrefixQuery>,
) -> Response {
    let prefix = query.prefix.trim_matches('/');
    if !prefix.is_empty() {
        if let Err(err) = validate_storage_path(prefix) {
            return bad_request(err);
        }
    }
    if !subject.admin && !can_access_storage(&subject, prefix) {
        return forbidden();
    }

    let mut dir = storage_root(&state.data_dir);
    if !prefix.is_empty() {
        for segment in prefix.split('/') {
            dir.push(segment);
        }
    }

    let mut items: Vec<String> = Vec::new();
    let mut prefixes: BTreeSet<String> = BTreeSet::new();
    if dir.is_dir() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => return internal_error(err.into()),
        };
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let full = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    prefixes.insert(full);
                }
                Ok(_) => items.push(full),
                Err(_) => {}
            }
        }
    }
    items.sort();

    Json(serde_json::json!({
        "items": items,
        "prefixes": prefixes.into_iter().collect::<Vec<_>>(),
    }))
    .into_response()
}
