use serde::Deserialize;

use super::*;

#[derive(Clone, Debug, Deserialize)]
pub struct WhoAmI {
    pub user_id: String,
    pub handle: String,

    #[serde(default)]
    pub admin: bool,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: String,
}

impl RemoteClient {
    pub fn whoami(&self) -> RemoteResult<WhoAmI> {
        let resp = self
            .client
            .get(self.url("/whoami"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("whoami", e))?;
        let w: WhoAmI = self
            .ensure_ok(resp, "whoami")?
            .json()
            .map_err(|e| Self::transport("parse whoami", e))?;
        Ok(w)
    }

    /// Exchanges the current bearer token for a freshly issued one and swaps
    /// it in place. The old token stays valid server-side; only this client's
    /// view changes.
    pub fn refresh_token(&self) -> RemoteResult<()> {
        let resp = self
            .client
            .post(self.url("/token/refresh"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .send()
            .map_err(|e| Self::transport("refresh token", e))?;
        let r: RefreshResponse = self
            .ensure_ok(resp, "refresh token")?
            .json()
            .map_err(|e| Self::transport("parse refresh response", e))?;
        *self.token.lock().expect("token lock poisoned") = r.token;
        Ok(())
    }
}
