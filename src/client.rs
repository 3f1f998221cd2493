use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::FetchError;
use crate::config::AdminApiConfig;
use crate::utils::http::send_checked_json;

const ADMIN_TOKEN_HEADER: &str = "Kong-Admin-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal read-only boundary against the admin API. Owns the base URL and
/// the optional admin token injected into every outgoing request.
#[derive(Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: String,
    admin_token: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client build should not fail");

        Self {
            http,
            base_url: base_url.into(),
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.admin_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn from_config(config: &AdminApiConfig) -> crate::Result<Self> {
        config.validate()?;
        let mut out = Self::new(config.base_url.clone());
        if let Some(token) = &config.admin_token {
            out = out.with_admin_token(token.clone());
        }
        Ok(out)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Issues `GET {base_url}{path}`. `path` must start with `/` and may
    /// carry a query string (cursors returned by the admin API do).
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, FetchError> {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = &self.admin_token {
            request = request.header(ADMIN_TOKEN_HEADER, token);
        }
        send_checked_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_doubling_slashes() {
        let client = AdminClient::new("http://localhost:8001/");
        assert_eq!(client.url("/services"), "http://localhost:8001/services");

        let client = AdminClient::new("http://localhost:8001");
        assert_eq!(
            client.url("/services?size=10"),
            "http://localhost:8001/services?size=10"
        );
    }

    #[test]
    fn blank_admin_token_is_not_kept() {
        let client = AdminClient::new("http://localhost:8001").with_admin_token("  ");
        assert!(client.admin_token.is_none());

        let client = AdminClient::new("http://localhost:8001").with_admin_token("tok");
        assert_eq!(client.admin_token.as_deref(), Some("tok"));
    }
}
