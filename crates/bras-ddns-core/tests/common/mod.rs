//! Test doubles and common utilities for engine contract tests
//!
//! This module provides minimal test doubles that verify the engine's
//! orchestration without touching the network.
#![allow(dead_code)]

use bras_ddns_core::error::{Error, Result};
use bras_ddns_core::traits::{
    AddressSelector, DiscoveredAddresses, DnsProvider, OnlineSession, Portal, RecordMetadata,
    RecordType, UpdateResult,
};
use bras_ddns_core::EngineConfig;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counters shared between a MockPortal and the test
#[derive(Default)]
pub struct PortalStats {
    pub login_calls: AtomicUsize,
    pub online_calls: AtomicUsize,
    /// Cycles currently inside login()
    pub active: AtomicUsize,
    /// Highest value `active` ever reached
    pub max_active: AtomicUsize,
    /// When set, login() fails with an API error
    pub fail_login: AtomicBool,
}

impl PortalStats {
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// A portal that reports fixed sessions
pub struct MockPortal {
    sessions: Vec<OnlineSession>,
    login_delay: Duration,
    stats: Arc<PortalStats>,
}

impl MockPortal {
    pub fn new(ipv4: Ipv4Addr) -> Self {
        Self {
            sessions: vec![OnlineSession {
                mac: "aa:bb:cc:dd:ee:ff".to_string(),
                ipv4,
                ipv6: None,
            }],
            login_delay: Duration::ZERO,
            stats: Arc::new(PortalStats::default()),
        }
    }

    /// Make every login take `delay`
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn stats(&self) -> Arc<PortalStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait::async_trait]
impl Portal for MockPortal {
    async fn login(&self) -> Result<()> {
        self.stats.login_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        self.stats.active.fetch_sub(1, Ordering::SeqCst);

        if self.stats.fail_login.load(Ordering::SeqCst) {
            return Err(Error::api("portal", "reply_code 1: login refused"));
        }
        Ok(())
    }

    async fn online_sessions(&self) -> Result<Vec<OnlineSession>> {
        self.stats.online_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sessions.clone())
    }

    fn portal_name(&self) -> &'static str {
        "mock-portal"
    }
}

/// A selector that returns fixed addresses and records its candidates
pub struct StaticSelector {
    addresses: DiscoveredAddresses,
    seen: Arc<Mutex<Vec<Vec<Ipv4Addr>>>>,
}

impl StaticSelector {
    pub fn new(addresses: DiscoveredAddresses) -> Self {
        Self {
            addresses,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<Vec<Ipv4Addr>>>> {
        Arc::clone(&self.seen)
    }
}

impl AddressSelector for StaticSelector {
    fn select(&self, candidates: &[Ipv4Addr]) -> Result<DiscoveredAddresses> {
        self.seen.lock().unwrap().push(candidates.to_vec());
        Ok(self.addresses)
    }
}

/// Counters shared between a MockDnsProvider and the test
#[derive(Default)]
pub struct ProviderStats {
    pub fetch_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
}

impl ProviderStats {
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

/// A provider with an in-memory record list and the usual cache semantics
pub struct MockDnsProvider {
    remote: Vec<RecordMetadata>,
    cache: Mutex<Vec<RecordMetadata>>,
    stats: Arc<ProviderStats>,
}

impl MockDnsProvider {
    /// A provider holding a single A record with `value`
    pub fn with_a_record(value: &str) -> Self {
        Self {
            remote: vec![RecordMetadata {
                id: "1001".to_string(),
                name: "home".to_string(),
                record_type: RecordType::A,
                line_id: "0".to_string(),
                value: value.to_string(),
            }],
            cache: Mutex::new(Vec::new()),
            stats: Arc::new(ProviderStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ProviderStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn fetch_records(&self) -> Result<Vec<RecordMetadata>> {
        self.stats.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.cache.lock().unwrap() = self.remote.clone();
        Ok(self.remote.clone())
    }

    async fn update_records(&self, addresses: &DiscoveredAddresses) -> Result<Vec<UpdateResult>> {
        let mut cache = self.cache.lock().unwrap();
        let mut results = Vec::new();

        let Some(ipv4) = addresses.ipv4 else {
            return Ok(results);
        };
        let new = ipv4.to_string();

        if let Some(record) = cache.iter_mut().find(|r| r.record_type == RecordType::A) {
            if record.value == new {
                results.push(UpdateResult::Unchanged {
                    record_id: record.id.clone(),
                    record_type: RecordType::A,
                    current: new,
                });
            } else {
                self.stats.update_calls.fetch_add(1, Ordering::SeqCst);
                let previous = std::mem::replace(&mut record.value, new.clone());
                results.push(UpdateResult::Updated {
                    record_id: record.id.clone(),
                    record_type: RecordType::A,
                    previous,
                    new,
                });
            }
        }

        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "mock-dns"
    }
}

/// Helper to create an engine config that ticks fast enough for tests
pub fn fast_config(interval_ms: u64) -> EngineConfig {
    EngineConfig {
        interval: Duration::from_millis(interval_ms),
        event_channel_capacity: 1000,
    }
}

/// Addresses a StaticSelector hands out by default
pub fn discovered(ipv4: [u8; 4]) -> DiscoveredAddresses {
    DiscoveredAddresses::new(Some(Ipv4Addr::from(ipv4)), None)
}

/// Drain all events currently buffered in the channel
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<bras_ddns_core::EngineEvent>,
) -> Vec<bras_ddns_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
