//! Development central authority for the picksheet portal: selection
//! documents with merge-write and batch semantics, object storage with
//! durable `/o/{path}` URLs, bearer-token identity and the submit
//! notification sink.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Extension, Query, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router, extract::Path};
use clap::Parser;
use tokio::sync::{Mutex, RwLock};

#[path = "picksheet_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "picksheet_server/identity_store.rs"]
mod identity_store;
use self::identity_store::*;
#[path = "picksheet_server/persistence.rs"]
mod persistence;
use self::persistence::*;
#[path = "picksheet_server/handlers_identity.rs"]
mod handlers_identity;
use self::handlers_identity::*;
#[path = "picksheet_server/handlers_selections.rs"]
mod handlers_selections;
use self::handlers_selections::*;
#[path = "picksheet_server/handlers_storage.rs"]
mod handlers_storage;
use self::handlers_storage::*;
#[path = "picksheet_server/handlers_notify.rs"]
mod handlers_notify;
use self::handlers_notify::*;

#[derive(Clone, Debug)]
struct Subject {
    user_id: String,
    handle: String,
    admin: bool,
}

impl Subject {
    /// Owners may only touch their own tree; admins act on anyone's behalf.
    fn can_access_owner(&self, owner: &str) -> bool {
        self.admin || self.handle == owner
    }
}

#[derive(Clone)]
struct AppState {
    data_dir: PathBuf,

    /// Advertised in durable storage URLs; fixed once the listener is bound.
    base_url: String,

    owners: Arc<RwLock<HashMap<String, OwnerRecord>>>,

    users: Arc<RwLock<HashMap<String, User>>>,
    tokens: Arc<RwLock<HashMap<String, AccessToken>>>,
    token_hash_index: Arc<RwLock<HashMap<String, String>>>,

    notify_lock: Arc<Mutex<()>>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct User {
    id: String,
    handle: String,

    #[serde(default)]
    admin: bool,

    created_at: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct AccessToken {
    id: String,
    user_id: String,

    // Stored hash of the bearer token secret.
    token_hash: String,

    created_at: String,

    #[serde(default)]
    revoked_at: Option<String>,
}

#[derive(Parser)]
#[command(name = "picksheet-server")]
#[command(about = "Selection portal central authority (development)", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// Data directory
    #[arg(long, default_value = "./picksheet-data")]
    data_dir: PathBuf,

    /// Development admin user handle
    #[arg(long, default_value = "dev")]
    dev_user: String,

    /// Development admin bearer token
    #[arg(long, default_value = "dev")]
    dev_token: String,

    /// Additional non-admin users, as `handle:token` (repeatable)
    #[arg(long = "extra-user")]
    extra_users: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("create data dir {}", args.data_dir.display()))?;

    let (mut users, mut tokens) =
        load_identity_from_disk(&args.data_dir).context("load identity")?;

    if users.is_empty() || tokens.is_empty() {
        let (u, t) = seed_identity(&args.dev_user, &args.dev_token, true);
        users.insert(u.id.clone(), u);
        tokens.insert(t.id.clone(), t);
        for spec in &args.extra_users {
            let Some((handle, secret)) = spec.split_once(':') else {
                anyhow::bail!("--extra-user must be handle:token, got {spec:?}");
            };
            let (u, t) = seed_identity(handle, secret, false);
            users.insert(u.id.clone(), u);
            tokens.insert(t.id.clone(), t);
        }
        persist_identity_to_disk(&args.data_dir, &users, &tokens).context("persist identity")?;
    }

    let token_hash_index: HashMap<String, String> = tokens
        .values()
        .map(|t| (t.token_hash.clone(), t.id.clone()))
        .collect();

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;
    let local_addr = listener.local_addr().context("read listener local addr")?;

    let state = Arc::new(AppState {
        data_dir: args.data_dir.clone(),
        base_url: format!("http://{local_addr}"),
        owners: Arc::new(RwLock::new(HashMap::new())),
        users: Arc::new(RwLock::new(users)),
        tokens: Arc::new(RwLock::new(tokens)),
        token_hash_index: Arc::new(RwLock::new(token_hash_index)),
        notify_lock: Arc::new(Mutex::new(())),
    });

    // Best-effort hydrate so the dev server survives restarts.
    let loaded = load_owners_from_disk(&args.data_dir).context("load owners from disk")?;
    {
        let mut owners = state.owners.write().await;
        *owners = loaded;
    }

    let authed = Router::new()
        .route("/whoami", get(whoami))
        .route("/token/refresh", post(refresh_token))
        .route("/owners", get(list_owners))
        .route(
            "/owners/:owner",
            get(get_owner).patch(patch_owner).delete(delete_owner),
        )
        .route("/owners/:owner/batch", post(batch_owner))
        .route("/owners/:owner/categories", get(list_categories))
        .route(
            "/owners/:owner/categories/:category",
            get(get_category).patch(patch_category),
        )
        .route(
            "/owners/:owner/categories/:category/append-image",
            post(append_image),
        )
        .route(
            "/o/:path",
            put(put_object).get(get_object).delete(delete_object),
        )
        .route("/storage", get(list_storage))
        .route("/notify", post(notify))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .merge(authed)
        .with_state(state);

    eprintln!("picksheet-server listening on {}", local_addr);
    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn require_bearer(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return unauthorized();
    };
    let Ok(value) = value.to_str() else {
        return unauthorized();
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return unauthorized();
    };

    let token_hash = hash_token(token);
    let token_id = {
        let idx = state.token_hash_index.read().await;
        idx.get(&token_hash).cloned()
    };
    let Some(token_id) = token_id else {
        return unauthorized();
    };

    let subject = {
        let tokens = state.tokens.read().await;
        let Some(t) = tokens.get(&token_id) else {
            return unauthorized();
        };
        if t.revoked_at.is_some() {
            return unauthorized();
        }
        let users = state.users.read().await;
        let Some(u) = users.get(&t.user_id) else {
            return unauthorized();
        };
        Subject {
            user_id: u.id.clone(),
            handle: u.handle.clone(),
            admin: u.admin,
        }
    };

    let mut req = req;
    req.extensions_mut().insert(subject);
    next.run(req).await
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
