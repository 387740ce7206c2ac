//! Client-side state directory (`.picksheet`): remote configuration, bearer
//! token and the current draft. Tokens live in state.json, never in
//! config.json, so config files stay safe to share or commit.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::session::SelectionSession;

const STATE_DIR: &str = ".picksheet";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub remote: Option<RemoteSettings>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub base_url: String,

    /// Legacy location; migrated into state.json on first read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientState {
    pub version: u32,

    /// Bearer tokens keyed by remote base URL.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

#[derive(Clone)]
pub struct LocalState {
    root: PathBuf,
}

impl LocalState {
    pub fn state_dir(root: &Path) -> PathBuf {
        root.join(STATE_DIR)
    }

    pub fn open(root: &Path) -> Result<Self> {
        let dir = Self::state_dir(root);
        if !dir.is_dir() {
            return Err(anyhow!(
                "no {} directory found at {} (run `picksheet init`)",
                STATE_DIR,
                dir.display()
            ));
        }
        Ok(Self { root: dir })
    }

    pub fn init(root: &Path, force: bool) -> Result<Self> {
        let dir = Self::state_dir(root);
        if dir.exists() && !force {
            return Err(anyhow!(
                "{} already exists at {} (use --force to re-init)",
                STATE_DIR,
                dir.display()
            ));
        }
        fs::create_dir_all(&dir).context("create state dir")?;

        let cfg = ClientConfig {
            version: 1,
            remote: None,
        };
        let bytes = serde_json::to_vec_pretty(&cfg).context("serialize client config")?;
        write_atomic(&dir.join("config.json"), &bytes).context("write config.json")?;

        let state = ClientState {
            version: 1,
            tokens: HashMap::new(),
        };
        let bytes = serde_json::to_vec_pretty(&state).context("serialize client state")?;
        write_atomic(&dir.join("state.json"), &bytes).context("write state.json")?;

        Ok(Self { root: dir })
    }

    pub fn read_config(&self) -> Result<ClientConfig> {
        let bytes = fs::read(self.root.join("config.json")).context("read config.json")?;
        let mut cfg: ClientConfig = serde_json::from_slice(&bytes).context("parse config.json")?;

        // Migration: older configs carried the token inline; move it to state.
        if let Some(remote) = cfg.remote.as_mut()
            && let Some(token) = remote.token.take()
        {
            let base_url = remote.base_url.clone();
            self.set_token(&base_url, &token)
                .context("migrate token to state")?;
            self.write_config(&cfg)
                .context("write config after token migration")?;
        }

        Ok(cfg)
    }

    pub fn write_config(&self, cfg: &ClientConfig) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cfg).context("serialize config")?;
        write_atomic(&self.root.join("config.json"), &bytes).context("write config.json")?;
        Ok(())
    }

    pub fn read_state(&self) -> Result<ClientState> {
        let path = self.root.join("state.json");
        if !path.exists() {
            return Ok(ClientState {
                version: 1,
                tokens: HashMap::new(),
            });
        }
        let bytes = fs::read(&path).context("read state.json")?;
        let st: ClientState = serde_json::from_slice(&bytes).context("parse state.json")?;
        Ok(st)
    }

    pub fn write_state(&self, st: &ClientState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(st).context("serialize state")?;
        write_atomic(&self.root.join("state.json"), &bytes).context("write state.json")?;
        Ok(())
    }

    pub fn token(&self, base_url: &str) -> Result<Option<String>> {
        let st = self.read_state()?;
        if st.version != 1 {
            anyhow::bail!("unsupported client state version {}", st.version);
        }
        Ok(st.tokens.get(base_url).cloned())
    }

    pub fn set_token(&self, base_url: &str, token: &str) -> Result<()> {
        let mut st = self.read_state()?;
        if st.version != 1 {
            anyhow::bail!("unsupported client state version {}", st.version);
        }
        st.tokens.insert(base_url.to_string(), token.to_string());
        self.write_state(&st)
    }

    pub fn clear_token(&self, base_url: &str) -> Result<()> {
        let mut st = self.read_state()?;
        st.tokens.remove(base_url);
        self.write_state(&st)
    }

    fn draft_path(&self) -> PathBuf {
        self.root.join("draft.json")
    }

    pub fn read_draft(&self) -> Result<SelectionSession> {
        let path = self.draft_path();
        if !path.exists() {
            return Ok(SelectionSession::default());
        }
        let bytes = fs::read(&path).context("read draft.json")?;
        let s: SelectionSession = serde_json::from_slice(&bytes).context("parse draft.json")?;
        Ok(s)
    }

    pub fn write_draft(&self, session: &SelectionSession) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(session).context("serialize draft")?;
        write_atomic(&self.draft_path(), &bytes).context("write draft.json")?;
        Ok(())
    }

    pub fn clear_draft(&self) -> Result<()> {
        let path = self.draft_path();
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
        }
        Ok(())
    }
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
