//! Session model for an authenticated org

use anyhow::{Context, Result};

pub const INSTANCE_URL_ENV: &str = "SF_INSTANCE_URL";
pub const ACCESS_TOKEN_ENV: &str = "SF_ACCESS_TOKEN";
pub const API_VERSION_ENV: &str = "SF_API_VERSION";

/// An authenticated session: where the org lives and the bearer token for it
#[derive(Clone)]
pub struct Session {
    /// Instance URL without trailing slash (e.g. "https://acme.my.salesforce.com")
    pub instance_url: String,
    pub access_token: String,
    /// REST API version without the leading "v" (e.g. "60.0")
    pub api_version: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl Session {
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let instance_url: String = instance_url.into();
        let api_version: String = api_version.into();
        Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: api_version.trim_start_matches('v').to_string(),
        }
    }

    /// Read the session from the environment (a `.env` file is loaded by `main`)
    pub fn from_env(default_version: &str) -> Result<Self> {
        let instance_url = std::env::var(INSTANCE_URL_ENV)
            .with_context(|| format!("{} is not set", INSTANCE_URL_ENV))?;
        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .with_context(|| format!("{} is not set", ACCESS_TOKEN_ENV))?;
        let api_version =
            std::env::var(API_VERSION_ENV).unwrap_or_else(|_| default_version.to_string());

        if instance_url.trim().is_empty() || access_token.trim().is_empty() {
            anyhow::bail!(
                "{} and {} must not be empty",
                INSTANCE_URL_ENV,
                ACCESS_TOKEN_ENV
            );
        }

        Ok(Self::new(instance_url, access_token, api_version))
    }

    /// Base URL of the versioned REST API
    pub fn data_url(&self) -> String {
        format!("{}/services/data/v{}", self.instance_url, self.api_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_url_and_version() {
        let session = Session::new("https://acme.my.salesforce.com/", "token", "v60.0");

        assert_eq!(
            session.data_url(),
            "https://acme.my.salesforce.com/services/data/v60.0"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("https://acme.my.salesforce.com", "secret-token", "60.0");

        assert!(!format!("{:?}", session).contains("secret-token"));
    }
}
