//! Blocking HTTP client for the picksheet central authority: selection
//! documents, storage objects, identity and the submit notification sink.
//! Every network-facing method classifies failures into `SelectionError`.

use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::error::SelectionError;

mod documents;
mod http_client;
mod identity;
mod notify;
mod objects;

pub use self::documents::CategoryEntry;
pub use self::identity::WhoAmI;
pub use self::objects::{StorageListing, decode_storage_path, encode_storage_path};

pub struct RemoteClient {
    base_url: String,

    // Swapped in place when an upload retry re-issues the credential, so
    // callers keep sharing one client.
    token: Mutex<String>,

    client: reqwest::blocking::Client,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("picksheet")
            .build()
            .context("build reqwest client")?;
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            token: Mutex::new(token.into()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn current_token(&self) -> String {
        self.token.lock().expect("token lock poisoned").clone()
    }
}

pub(crate) type RemoteResult<T> = std::result::Result<T, SelectionError>;
