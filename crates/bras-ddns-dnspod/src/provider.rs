//! DnsPod record updater

use async_trait::async_trait;
use bras_ddns_core::config::DnsPodConfig;
use bras_ddns_core::traits::{DnsProvider, RecordMetadata, RecordType, UpdateResult};
use bras_ddns_core::{DiscoveredAddresses, Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::types::{BaseResponse, RecordListResponse, Status};

const RECORD_LIST: &str = "Record.List";
const RECORD_DDNS: &str = "Record.Ddns";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// DnsPod provider
///
/// Keeps the records of one `sub_domain` fetched by [`fetch_records`] and
/// rewrites them through `Record.Ddns` when the discovered address differs
/// from the cached value. Records are never created.
///
/// [`fetch_records`]: DnsProvider::fetch_records
pub struct DnsPodProvider {
    /// `<id>,<token>`
    /// ⚠️ NEVER log this value
    login_token: String,

    domain: String,

    sub_domain: String,

    base_url: String,

    client: reqwest::Client,

    /// Fail on `status.code != 1` instead of warning
    strict_status: bool,

    /// Records of `sub_domain` with type A or AAAA
    records: Mutex<Vec<RecordMetadata>>,
}

// Custom Debug implementation that hides the login token
impl std::fmt::Debug for DnsPodProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsPodProvider")
            .field("login_token", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("sub_domain", &self.sub_domain)
            .field("base_url", &self.base_url)
            .field("strict_status", &self.strict_status)
            .finish()
    }
}

impl DnsPodProvider {
    /// Create a provider from configuration
    pub fn new(config: &DnsPodConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a provider around an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: &DnsPodConfig) -> Self {
        Self {
            login_token: config.login_token(),
            domain: config.domain.clone(),
            sub_domain: config.sub_domain.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            strict_status: config.strict_status,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the cached records
    pub async fn cached_records(&self) -> Vec<RecordMetadata> {
        self.records.lock().await.clone()
    }

    /// POST one API action with the common form fields
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /<action>
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// login_token=...&domain=...&sub_domain=...&lang=cn&format=json&...
    /// ```
    async fn post_api<T: DeserializeOwned>(
        &self,
        action: &str,
        extra: &[(&str, &str)],
    ) -> Result<T> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(extra.len() + 5);
        form.extend_from_slice(extra);
        form.extend_from_slice(&[
            ("login_token", self.login_token.as_str()),
            ("domain", self.domain.as_str()),
            ("sub_domain", self.sub_domain.as_str()),
            ("lang", "cn"),
            ("format", "json"),
        ]);

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, action))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api(
                "dnspod",
                format!("{} responded with HTTP {}", action, status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", action, e)))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::parse(format!("Cannot read dnspod {} response: {}", action, e)))
    }

    /// Returns whether the call succeeded, or fails when strict
    fn check_status(&self, action: &str, status: &Status) -> Result<bool> {
        if status.is_ok() {
            return Ok(true);
        }
        if self.strict_status {
            return Err(Error::provider_status(status.code, status.message.clone()));
        }
        tracing::warn!(
            "{} responded with code {}: {}",
            action,
            status.code,
            status.message
        );
        Ok(false)
    }
}

#[async_trait]
impl DnsProvider for DnsPodProvider {
    /// # API Call
    ///
    /// ```http
    /// POST /Record.List
    /// ```
    async fn fetch_records(&self) -> Result<Vec<RecordMetadata>> {
        let response: RecordListResponse = self.post_api(RECORD_LIST, &[]).await?;
        self.check_status(RECORD_LIST, &response.status)?;

        let records = response.records.ok_or_else(|| {
            Error::not_found(format!(
                "no records in {} response for {}.{}",
                RECORD_LIST, self.sub_domain, self.domain
            ))
        })?;

        let managed: Vec<RecordMetadata> = records
            .into_iter()
            .filter(|r| r.name == self.sub_domain)
            .filter_map(|r| r.into_metadata())
            .collect();

        tracing::debug!(
            "Caching {} record(s) for {}.{}",
            managed.len(),
            self.sub_domain,
            self.domain
        );

        let mut cache = self.records.lock().await;
        *cache = managed.clone();
        Ok(managed)
    }

    /// # API Call
    ///
    /// ```http
    /// POST /Record.Ddns
    /// record_id=...&record_line_id=...&value=...
    /// ```
    async fn update_records(&self, addresses: &DiscoveredAddresses) -> Result<Vec<UpdateResult>> {
        let mut cache = self.records.lock().await;
        if cache.is_empty() {
            return Ok(Vec::new());
        }

        let wanted = [
            (addresses.ipv4.map(|ip| ip.to_string()), RecordType::A),
            (addresses.ipv6.map(|ip| ip.to_string()), RecordType::Aaaa),
        ];

        let mut results = Vec::new();
        for (address, record_type) in wanted {
            let Some(address) = address else {
                continue;
            };
            let Some(record) = cache.iter_mut().find(|r| r.record_type == record_type) else {
                continue;
            };

            if record.value == address {
                results.push(UpdateResult::Unchanged {
                    record_id: record.id.clone(),
                    record_type,
                    current: address,
                });
                continue;
            }

            tracing::info!(
                " -> Updating record #{} (type {}) to {}",
                record.id,
                record_type,
                address
            );

            let response: BaseResponse = self
                .post_api(
                    RECORD_DDNS,
                    &[
                        ("record_id", record.id.as_str()),
                        ("record_line_id", record.line_id.as_str()),
                        ("value", address.as_str()),
                    ],
                )
                .await?;

            // Leave the cache alone on a soft failure so the next cycle retries
            if !self.check_status(RECORD_DDNS, &response.status)? {
                continue;
            }

            let previous = std::mem::replace(&mut record.value, address.clone());
            results.push(UpdateResult::Updated {
                record_id: record.id.clone(),
                record_type,
                previous,
                new: address,
            });
        }

        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "dnspod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DnsPodConfig {
        DnsPodConfig {
            id: "12345".to_string(),
            token: "super_secret_token_xyz".to_string(),
            domain: "example.com".to_string(),
            sub_domain: "home".to_string(),
            base_url: "https://dnsapi.test/".to_string(),
            strict_status: false,
        }
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let provider = DnsPodProvider::new(&config()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("super_secret_token_xyz"));
        assert!(debug_str.contains("DnsPodProvider"));
    }

    #[test]
    fn test_base_url_trimmed() {
        let provider = DnsPodProvider::new(&config()).unwrap();
        assert_eq!(provider.base_url, "https://dnsapi.test");
        assert_eq!(provider.login_token, "12345,super_secret_token_xyz");
    }

    #[test]
    fn test_strict_status() {
        let mut cfg = config();
        let lenient = DnsPodProvider::new(&cfg).unwrap();
        let failed = Status {
            code: -15,
            message: "domain locked".to_string(),
        };
        assert!(!lenient.check_status(RECORD_LIST, &failed).unwrap());

        cfg.strict_status = true;
        let strict = DnsPodProvider::new(&cfg).unwrap();
        assert!(matches!(
            strict.check_status(RECORD_LIST, &failed),
            Err(Error::ProviderStatus { code: -15, .. })
        ));
    }

    #[tokio::test]
    async fn test_update_without_cache_is_noop() {
        let provider = DnsPodProvider::new(&config()).unwrap();
        let addrs = DiscoveredAddresses::new(Some("192.0.2.1".parse().unwrap()), None);
        assert!(provider.update_records(&addrs).await.unwrap().is_empty());
    }
}
