use super::*;

impl RemoteClient {
    pub(super) fn auth(&self) -> String {
        format!("Bearer {}", self.token.lock().expect("token lock poisoned"))
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps HTTP status classes onto the error taxonomy: 401 fails fast as a
    /// credential problem, 404 is a missing target, 400 a rejected input, and
    /// everything else (5xx included) a transient failure worth retrying
    /// where the contract allows it.
    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        label: &str,
    ) -> RemoteResult<reqwest::blocking::Response> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SelectionError::AuthRequired);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SelectionError::NotFound(label.to_string()));
        }
        if status == reqwest::StatusCode::BAD_REQUEST {
            let detail = resp
                .json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| label.to_string());
            return Err(SelectionError::Validation(detail));
        }
        if !status.is_success() {
            return Err(SelectionError::Transient(format!("{label}: status {status}")));
        }
        Ok(resp)
    }

    pub(super) fn transport(label: &str, err: reqwest::Error) -> SelectionError {
        SelectionError::Transient(format!("{label}: {err}"))
    }
}
