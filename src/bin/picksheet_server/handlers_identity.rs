use super::*;

pub(super) async fn whoami(Extension(subject): Extension<Subject>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user_id": subject.user_id,
        "handle": subject.handle,
        "admin": subject.admin,
    }))
}

/// Issues a fresh bearer token for the calling user. Existing tokens stay
/// valid so other clients of the same user keep working.
pub(super) async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Response {
    let secret = match new_token_secret() {
        Ok(s) => s,
        Err(err) => return internal_error(err),
    };
    let token_hash = hash_token(&secret);
    let token = AccessToken {
        id: token_hash.clone(),
        user_id: subject.user_id.clone(),
        token_hash: token_hash.clone(),
        created_at: now_ts(),
        revoked_at: None,
    };

    let (users_snapshot, tokens_snapshot) = {
        let mut tokens = state.tokens.write().await;
        tokens.insert(token.id.clone(), token.clone());
        let mut idx = state.token_hash_index.write().await;
        idx.insert(token_hash, token.id.clone());
        let users = state.users.read().await;
        (users.clone(), tokens.clone())
    };

    if let Err(err) = persist_identity_to_disk(&state.data_dir, &users_snapshot, &tokens_snapshot)
    {
        return internal_error(err);
    }

    Json(serde_json::json!({ "token": secret })).into_response()
}
