use super::*;

pub(super) fn now_ts() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}

pub(super) fn hash_token(secret: &str) -> String {
    blake3::hash(secret.as_bytes()).to_hex().to_string()
}

pub(super) fn new_token_secret() -> Result<String> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!("getrandom: {e}"))?;
    Ok(buf.iter().map(|b| format!("{b:02x}")).collect())
}

pub(super) fn identity_users_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("users.json")
}

pub(super) fn identity_tokens_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("tokens.json")
}

pub(super) fn load_identity_from_disk(
    data_dir: &std::path::Path,
) -> Result<(HashMap<String, User>, HashMap<String, AccessToken>)> {
    let users: HashMap<String, User> = if identity_users_path(data_dir).exists() {
        let bytes = std::fs::read(identity_users_path(data_dir)).context("read users.json")?;
        let list: Vec<User> = serde_json::from_slice(&bytes).context("parse users.json")?;
        list.into_iter().map(|u| (u.id.clone(), u)).collect()
    } else {
        HashMap::new()
    };

    let tokens: HashMap<String, AccessToken> = if identity_tokens_path(data_dir).exists() {
        let bytes = std::fs::read(identity_tokens_path(data_dir)).context("read tokens.json")?;
        let list: Vec<AccessToken> = serde_json::from_slice(&bytes).context("parse tokens.json")?;
        list.into_iter().map(|t| (t.id.clone(), t)).collect()
    } else {
        HashMap::new()
    };

    Ok((users, tokens))
}

pub(super) fn persist_identity_to_disk(
    data_dir: &std::path::Path,
    users: &HashMap<String, User>,
    tokens: &HashMap<String, AccessToken>,
) -> Result<()> {
    let mut user_list: Vec<User> = users.values().cloned().collect();
    user_list.sort_by(|a, b| a.handle.cmp(&b.handle));
    let users_bytes = serde_json::to_vec_pretty(&user_list).context("serialize users")?;
    write_atomic_overwrite(&identity_users_path(data_dir), &users_bytes)
        .context("write users.json")?;

    let mut token_list: Vec<AccessToken> = tokens.values().cloned().collect();
    token_list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let tokens_bytes = serde_json::to_vec_pretty(&token_list).context("serialize tokens")?;
    write_atomic_overwrite(&identity_tokens_path(data_dir), &tokens_bytes)
        .context("write tokens.json")?;

    Ok(())
}

pub(super) fn seed_identity(handle: &str, token_secret: &str, admin: bool) -> (User, AccessToken) {
    let created_at = now_ts();
    let user_id = {
        let mut h = blake3::Hasher::new();
        h.update(handle.as_bytes());
        h.update(b"\n");
        h.update(created_at.as_bytes());
        h.finalize().to_hex().to_string()
    };
    let user = User {
        id: user_id.clone(),
        handle: handle.to_string(),
        admin,
        created_at: created_at.clone(),
    };

    let token_hash = hash_token(token_secret);
    let token = AccessToken {
        id: token_hash.clone(),
        user_id,
        token_hash,
        created_at,
        revoked_at: None,
    };
    (user, token)
}
