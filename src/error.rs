use thiserror::Error;

/// Typed failures surfaced by the Store, Resolver and Session layers. The two
/// binaries fold these into `anyhow` at their edges.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Operation attempted without a signed-in identity. Fails fast, before
    /// any request is issued; never retried.
    #[error("not signed in (run `picksheet login` first)")]
    AuthRequired,

    /// Delete/update target that no longer exists (document or item index).
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before any write (e.g. a non-https image URL).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Save refused while image uploads are still in flight; retry once the
    /// pending count reaches zero.
    #[error("{0} upload(s) still in flight")]
    UploadsPending(usize),

    /// Network or storage failure. The upload path retries once with a
    /// refreshed credential before surfacing this; document I/O surfaces it
    /// immediately.
    #[error("transient i/o failure: {0}")]
    Transient(String),
}

impl SelectionError {
    pub fn transient(err: impl std::fmt::Display) -> Self {
        SelectionError::Transient(err.to_string())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SelectionError::Transient(_))
    }
}
