use super::*;

#[derive(serde::Deserialize)]
pub(super) struct NotifyBody {
    #[serde(default)]
    display_name: String,

    #[serde(default)]
    email: String,
}

/// Submit notification sink. Records the event in the data directory; the
/// real deployment would relay it on.
pub(super) async fn notify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NotifyBody>,
) -> Response {
    let _guard = state.notify_lock.lock().await;
    let path = state.data_dir.join("notifications.json");
    let mut entries: Vec<serde_json::Value> = match std::fs::read(&path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    entries.push(serde_json::json!({
        "display_name": body.display_name,
        "email": body.email,
        "received_at": now_ts(),
    }));
    let bytes = match serde_json::to_vec_pretty(&entries) {
        Ok(bytes) => bytes,
        Err(err) => return internal_error(err.into()),
    };
    if let Err(err) = write_atomic_overwrite(&path, &bytes) {
        return internal_error(err);
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}
