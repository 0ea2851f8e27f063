// # DNS Provider Trait
//
// Defines the interface for pushing discovered addresses to a DDNS provider.
//
// ## Implementations
//
// - DnsPod: `bras-ddns-dnspod` crate
//
// ## Usage
//
// ```rust,ignore
// use bras_ddns_core::{DiscoveredAddresses, DnsProvider};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     // Fetch once per process, then update as often as needed
//     provider.fetch_records().await?;
//     provider.update_records(&DiscoveredAddresses::new(
//         Some("192.0.2.1".parse()?),
//         None,
//     )).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Address record types a provider may rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 record
    A,
    /// IPv6 record
    Aaaa,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::parse(format!(
                "unsupported record type: {}",
                other
            ))),
        }
    }
}

/// Metadata about a cached DNS record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record name (sub domain)
    pub name: String,
    /// The record type
    pub record_type: RecordType,
    /// Provider line the record is served on
    pub line_id: String,
    /// The current value as last seen or written
    pub value: String,
}

/// Result of considering one record for an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// Record was rewritten
    Updated {
        record_id: String,
        record_type: RecordType,
        previous: String,
        new: String,
    },
    /// Record already had the discovered address (no call made)
    Unchanged {
        record_id: String,
        record_type: RecordType,
        current: String,
    },
}

impl UpdateResult {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateResult::Updated { .. })
    }
}

/// Trait for DNS provider implementations
///
/// Providers cache the records they fetched and only rewrite a record when
/// its cached value differs from the discovered address. A record type that
/// was never fetched is never written: providers must not create records.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch the managed records and replace the cache
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<RecordMetadata>)`: the records now cached
    /// - `Err(Error)`: if the listing failed
    async fn fetch_records(&self) -> Result<Vec<RecordMetadata>, crate::Error>;

    /// Push discovered addresses to the cached records
    ///
    /// Absent addresses and record types with nothing cached are skipped.
    ///
    /// # Idempotency
    ///
    /// Calling this twice with the same addresses performs at most one
    /// remote update per record.
    async fn update_records(
        &self,
        addresses: &crate::DiscoveredAddresses,
    ) -> Result<Vec<UpdateResult>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parse() {
        assert_eq!("A".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("CNAME".parse::<RecordType>().is_err());
        assert!("aaaa".parse::<RecordType>().is_err());
    }
}
