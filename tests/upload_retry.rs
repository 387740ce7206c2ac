//! Upload retry behavior against a storage endpoint that fails transiently.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{post, put};
use axum::{Json, Router};

use picksheet::error::SelectionError;
use picksheet::images::ImageResolver;
use picksheet::remote::RemoteClient;

struct FlakyStorage {
    fail_first: usize,
    puts: AtomicUsize,
    refreshes: AtomicUsize,
}

async fn refresh(State(state): State<Arc<FlakyStorage>>) -> Json<serde_json::Value> {
    state.refreshes.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({ "token": "reissued" }))
}

async fn put_object(State(state): State<Arc<FlakyStorage>>) -> axum::response::Response {
    let n = state.puts.fetch_add(1, Ordering::SeqCst);
    if n < state.fail_first {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "storage briefly unavailable" })),
        )
            .into_response()
    } else {
        Json(serde_json::json!({
            "url": "https://cdn.example/o/uploads%2FU1%2FTile%2Fphoto.png?alt=media",
        }))
        .into_response()
    }
}

/// Minimal storage endpoint that rejects the first `fail_first` uploads
/// with a 503 and counts every put and token refresh it sees.
fn spawn_flaky_storage(fail_first: usize) -> Result<(SocketAddr, Arc<FlakyStorage>)> {
    let state = Arc::new(FlakyStorage {
        fail_first,
        puts: AtomicUsize::new(0),
        refreshes: AtomicUsize::new(0),
    });
    let app_state = Arc::clone(&state);
    let rt = tokio::runtime::Runtime::new().context("build runtime")?;
    let listener = rt
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .context("bind listener")?;
    let addr = listener.local_addr().context("listener addr")?;
    let app = Router::new()
        .route("/token/refresh", post(refresh))
        .route("/o/:path", put(put_object))
        .with_state(app_state);
    thread::spawn(move || {
        rt.block_on(async move {
            let _ = axum::serve(listener, app).await;
        });
    });
    Ok((addr, state))
}

#[test]
fn transient_upload_failure_retries_once_with_a_reissued_credential() -> Result<()> {
    let (addr, storage) = spawn_flaky_storage(1)?;
    let client = RemoteClient::new(format!("http://{addr}"), "stale")?;
    let resolver = ImageResolver::new(&client);

    let url = resolver.upload("U1", "Tile", "photo.png", b"pixels".to_vec())?;
    assert!(url.starts_with("https://"));
    assert_eq!(storage.puts.load(Ordering::SeqCst), 2);
    assert_eq!(storage.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(client.current_token(), "reissued");
    Ok(())
}

#[test]
fn persistent_failure_surfaces_after_a_single_retry() -> Result<()> {
    let (addr, storage) = spawn_flaky_storage(usize::MAX)?;
    let client = RemoteClient::new(format!("http://{addr}"), "stale")?;
    let resolver = ImageResolver::new(&client);

    let err = resolver
        .upload("U1", "Tile", "photo.png", b"pixels".to_vec())
        .expect_err("upload against a failing endpoint");
    assert!(matches!(err, SelectionError::Transient(_)));
    assert_eq!(storage.puts.load(Ordering::SeqCst), 2);
    assert_eq!(storage.refreshes.load(Ordering::SeqCst), 1);
    Ok(())
}
