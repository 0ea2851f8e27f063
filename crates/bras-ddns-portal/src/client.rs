//! HTTP client for the Bras portal

use async_trait::async_trait;
use bras_ddns_core::config::BrasConfig;
use bras_ddns_core::traits::{OnlineSession, Portal};
use bras_ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::credential::Credential;
use crate::types::{Envelope, OnlineResults};

const CHALLENGE_PATH: &str = "/api/portal/v1/challenge";
const LOGIN_PATH: &str = "/api/portal/v1/login";
const ONLINE_PATH: &str = "/api/selfservice/v1/online";

/// Default HTTP timeout for portal requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Bras portal client
///
/// Owns the HTTP session (cookie store) used for every call, so the
/// login and the online-session query share one session.
pub struct BrasPortal {
    username: String,

    /// ⚠️ NEVER log this value
    password: String,

    base_url: String,

    /// Session handle; cookies persist across calls
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for BrasPortal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrasPortal")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BrasPortal {
    /// Create a portal client from configuration
    pub fn new(config: &BrasConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(
            client,
            &config.base_url,
            &config.username,
            &config.password,
        ))
    }

    /// Create a portal client around an existing HTTP client
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch a one-time login challenge
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /api/portal/v1/challenge
    /// ```
    pub async fn fetch_challenge(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url(CHALLENGE_PATH))
            .send()
            .await
            .map_err(|e| Error::http(format!("Challenge request failed: {}", e)))?;

        let envelope: Envelope<String> = read_envelope(response, "challenge").await?;
        if !envelope.is_ok() {
            return Err(Error::api(
                "portal",
                format!("challenge refused, {}", envelope.describe()),
            ));
        }

        let challenge = envelope
            .results
            .ok_or_else(|| Error::api("portal", "challenge response carries no results"))?;
        tracing::debug!("Got portal challenge ({} chars)", challenge.len());
        Ok(challenge)
    }

    /// Log in with a credential built from a fresh challenge
    ///
    /// # API Calls
    ///
    /// ```http
    /// GET /api/portal/v1/challenge
    ///
    /// POST /api/portal/v1/login
    /// {"domain": "default", "username": ..., "password": ..., "challenge": ...}
    /// ```
    pub async fn login_with_challenge(&self) -> Result<()> {
        let challenge = self.fetch_challenge().await?;
        let credential = Credential::with_challenge(&self.username, &self.password, challenge)?;
        self.submit(&credential).await
    }

    /// POST a credential to the login endpoint
    pub async fn submit(&self, credential: &Credential) -> Result<()> {
        tracing::debug!("Logging in to portal as {}", credential.username());

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(credential)
            .send()
            .await
            .map_err(|e| Error::http(format!("Login request failed: {}", e)))?;

        let envelope: Envelope<serde_json::Value> = read_envelope(response, "login").await?;
        if !envelope.is_ok() {
            return Err(Error::api(
                "portal",
                format!("login refused, {}", envelope.describe()),
            ));
        }

        Ok(())
    }

    /// Query the sessions online for this account
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /api/selfservice/v1/online
    /// ```
    pub async fn fetch_online(&self) -> Result<Vec<OnlineSession>> {
        let response = self
            .client
            .get(self.url(ONLINE_PATH))
            .send()
            .await
            .map_err(|e| Error::http(format!("Online request failed: {}", e)))?;

        let envelope: Envelope<OnlineResults> = read_envelope(response, "online").await?;
        let reason = envelope.describe();
        let results = envelope.results.ok_or_else(|| {
            Error::api(
                "portal",
                format!("online query returned no results, {}", reason),
            )
        })?;

        tracing::debug!(
            "Portal reports {} online session(s) (total {})",
            results.rows.len(),
            results.total
        );

        Ok(results
            .rows
            .into_iter()
            .map(|row| OnlineSession {
                ipv4: row.ipv4(),
                mac: row.mac,
                ipv6: row.user_ipv6.filter(|ip| !ip.is_empty()),
            })
            .collect())
    }
}

/// Check the HTTP status and parse the envelope
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<Envelope<T>> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::api(
            "portal",
            format!("{} responded with HTTP {}", what, status),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::http(format!("Failed to read {} response: {}", what, e)))?;

    serde_json::from_str(&body)
        .map_err(|e| Error::parse(format!("Cannot read portal {} response: {}", what, e)))
}

#[async_trait]
impl Portal for BrasPortal {
    async fn login(&self) -> Result<()> {
        self.login_with_challenge().await
    }

    async fn online_sessions(&self) -> Result<Vec<OnlineSession>> {
        self.fetch_online().await
    }

    fn portal_name(&self) -> &'static str {
        "bras"
    }
}
