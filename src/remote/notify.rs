use super::*;

impl RemoteClient {
    /// Fire-and-forget submit notification. Callers log failures and move on;
    /// a submit must never roll back because the notification sink is down.
    pub fn notify_submitted(&self, display_name: &str, email: &str) -> RemoteResult<()> {
        let resp = self
            .client
            .post(self.url("/notify"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .json(&serde_json::json!({
                "display_name": display_name,
                "email": email,
            }))
            .send()
            .map_err(|e| Self::transport("notify", e))?;
        let _ = self.ensure_ok(resp, "notify")?;
        Ok(())
    }
}
