use serde::{Deserialize, Serialize};

use crate::{GateviewError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 15;

const ENV_BASE_URL: &str = "KONG_ADMIN_BASE_URL";
const ENV_ADMIN_TOKEN: &str = "KONG_ADMIN_TOKEN";
const ENV_PAGE_SIZE: &str = "KONG_ADMIN_PAGE_SIZE";
const ENV_CACHE_TTL_SECONDS: &str = "KONG_CACHE_TTL_SECONDS";

#[derive(Clone, Serialize, Deserialize)]
pub struct AdminApiConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

impl std::fmt::Debug for AdminApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApiConfig")
            .field("base_url", &self.base_url)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("page_size", &self.page_size)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .finish()
    }
}

impl AdminApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            admin_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    /// Reads the configuration from `KONG_ADMIN_BASE_URL`, `KONG_ADMIN_TOKEN`,
    /// `KONG_ADMIN_PAGE_SIZE` and `KONG_CACHE_TTL_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let base_url = env_nonempty(ENV_BASE_URL)
            .ok_or_else(|| GateviewError::Config(format!("{ENV_BASE_URL} is not set")))?;

        let mut out = Self::new(base_url);
        out.admin_token = env_nonempty(ENV_ADMIN_TOKEN);
        if let Some(raw) = env_nonempty(ENV_PAGE_SIZE) {
            out.page_size = raw.parse().map_err(|_| {
                GateviewError::Config(format!("{ENV_PAGE_SIZE} is not a positive integer: {raw}"))
            })?;
        }
        if let Some(raw) = env_nonempty(ENV_CACHE_TTL_SECONDS) {
            out.cache_ttl_seconds = raw.parse().map_err(|_| {
                GateviewError::Config(format!(
                    "{ENV_CACHE_TTL_SECONDS} is not a non-negative integer: {raw}"
                ))
            })?;
        }
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(GateviewError::Config("base_url must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(GateviewError::Config("page_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_omitted() {
        let config: AdminApiConfig =
            serde_json::from_str(r#"{"base_url":"http://localhost:8001"}"#).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.cache_ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
        assert!(config.admin_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_base_url_is_rejected() {
        let config = AdminApiConfig::new("   ");
        assert!(matches!(config.validate(), Err(GateviewError::Config(_))));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut config = AdminApiConfig::new("http://localhost:8001");
        config.page_size = 0;
        assert!(matches!(config.validate(), Err(GateviewError::Config(_))));
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let mut config = AdminApiConfig::new("http://localhost:8001");
        config.admin_token = Some("kong-secret".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("kong-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
