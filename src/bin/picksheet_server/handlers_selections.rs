use serde_json::Value;

use super::*;

/// Admin-only listing of every selection header.
pub(super) async fn list_owners(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Response {
    if !subject.admin {
        return forbidden();
    }
    let owners = state.owners.read().await;
    let headers: Vec<Value> = owners.values().map(|r| r.header.clone()).collect();
    Json(headers).into_response()
}

pub(super) async fn get_owner(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(owner): Path<String>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    let owners = state.owners.read().await;
    match owners.get(&owner) {
        Some(record) => Json(record.header.clone()).into_response(),
        None => not_found(),
    }
}

/// Merge-write on the header; creates the owner record if absent. The
/// server owns `owner_id` and `updated_at`, whatever the patch says.
pub(super) async fn patch_owner(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(owner): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    if !patch.is_object() {
        return bad_request(anyhow::anyhow!("header patch must be a JSON object"));
    }

    let mut owners = state.owners.write().await;
    let record = owners.entry(owner.clone()).or_default();
    let ts = next_updated_at(doc_updated_at(&record.header));
    merge_into(&mut record.header, &patch);
    merge_into(
        &mut record.header,
        &serde_json::json!({ "owner_id": owner, "updated_at": ts }),
    );
    if let Err(err) = persist_owner(&state.data_dir, &owner, record) {
        return internal_error(err);
    }
    Json(record.header.clone()).into_response()
}

/// Removes the header and every category document in one step. Repeating the
/// call on an already-absent owner succeeds.
pub(super) async fn delete_owner(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(owner): Path<String>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    let mut owners = state.owners.write().await;
    let existed = owners.remove(&owner).is_some();
    if let Err(err) = remove_owner_file(&state.data_dir, &owner) {
        return internal_error(err);
    }
    Json(serde_json::json!({ "deleted": existed })).into_response()
}

#[derive(serde::Deserialize)]
pub(super) struct BatchBody {
    header: Value,
    categories: std::collections::BTreeMap<String, Value>,
}

/// Applies a header merge plus a merge per category under one write lock,
/// then persists the owner file once. Shapes are validated before anything
/// mutates, so a rejected batch leaves no partial write behind.
pub(super) async fn batch_owner(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(owner): Path<String>,
    Json(body): Json<BatchBody>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    if !body.header.is_object() {
        return bad_request(anyhow::anyhow!("batch header must be a JSON object"));
    }
    for (id, doc) in &body.categories {
        if id.is_empty() {
            return bad_request(anyhow::anyhow!("empty category id in batch"));
        }
        if !doc.is_object() {
            return bad_request(anyhow::anyhow!("category {id:?} must be a JSON object"));
        }
    }

    let mut owners = state.owners.write().await;
    let record = owners.entry(owner.clone()).or_default();

    let ts = next_updated_at(doc_updated_at(&record.header));
    merge_into(&mut record.header, &body.header);
    merge_into(
        &mut record.header,
        &serde_json::json!({ "owner_id": owner, "updated_at": ts }),
    );
    for (id, patch) in &body.categories {
        let doc = record.categories.entry(id.clone()).or_insert(Value::Null);
        let ts = next_updated_at(doc_updated_at(doc));
        merge_into(doc, patch);
        merge_into(doc, &serde_json::json!({ "updated_at": ts }));
    }

    if let Err(err) = persist_owner(&state.data_dir, &owner, record) {
        return internal_error(err);
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

pub(super) async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(owner): Path<String>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    let owners = state.owners.read().await;
    let entries: Vec<Value> = owners
        .get(&owner)
        .map(|record| {
            record
                .categories
                .iter()
                .map(|(id, doc)| serde_json::json!({ "id": id, "doc": doc }))
                .collect()
        })
        .unwrap_or_default();
    Json(entries).into_response()
}

pub(super) async fn get_category(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path((owner, category)): Path<(String, String)>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    let owners = state.owners.read().await;
    match owners.get(&owner).and_then(|r| r.categories.get(&category)) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => not_found(),
    }
}

pub(super) async fn patch_category(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path((owner, category)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    if !patch.is_object() {
        return bad_request(anyhow::anyhow!("category patch must be a JSON object"));
    }

    let mut owners = state.owners.write().await;
    let record = owners.entry(owner.clone()).or_default();
    let doc = record
        .categories
        .entry(category.clone())
        .or_insert(Value::Null);
    let ts = next_updated_at(doc_updated_at(doc));
    merge_into(doc, &patch);
    merge_into(doc, &serde_json::json!({ "updated_at": ts }));
    if let Err(err) = persist_owner(&state.data_dir, &owner, record) {
        return internal_error(err);
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

#[derive(serde::Deserialize)]
pub(super) struct AppendImageBody {
    index: usize,
    url: String,
}

/// Pushes one image URL into an item's slot in place. This is the only write
/// path for freshly uploaded images, so two clients landing on the same slot
/// concurrently both keep their URL.
pub(super) async fn append_image(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path((owner, category)): Path<(String, String)>,
    Json(body): Json<AppendImageBody>,
) -> Response {
    if !subject.can_access_owner(&owner) {
        return forbidden();
    }
    let lower = body.url.to_ascii_lowercase();
    if !lower.starts_with("https://") && !lower.starts_with("http://") {
        return bad_request(anyhow::anyhow!("image url must be http(s)"));
    }

    let mut owners = state.owners.write().await;
    let record = owners.entry(owner.clone()).or_default();
    let doc = record
        .categories
        .entry(category.clone())
        .or_insert(Value::Null);
    if !doc.is_object() {
        *doc = serde_json::json!({ "category_label": category });
    }
    let ts = next_updated_at(doc_updated_at(doc));

    let map = doc.as_object_mut().expect("category doc is an object");
    let items = map
        .entry("items")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !items.is_array() {
        *items = Value::Array(Vec::new());
    }
    let items = items.as_array_mut().expect("items is an array");
    while items.len() <= body.index {
        items.push(serde_json::json!({}));
    }
    let slot = &mut items[body.index];
    if !slot.is_object() {
        *slot = serde_json::json!({});
    }
    let images = slot
        .as_object_mut()
        .expect("item slot is an object")
        .entry("images")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !images.is_array() {
        *images = Value::Array(Vec::new());
    }
    let images = images.as_array_mut().expect("images is an array");
    if !images.iter().any(|v| v.as_str() == Some(body.url.as_str())) {
        images.push(Value::String(body.url.clone()));
    }

    map.insert("updated_at".to_string(), Value::String(ts));
    if let Err(err) = persist_owner(&state.data_dir, &owner, record) {
        return internal_error(err);
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}
