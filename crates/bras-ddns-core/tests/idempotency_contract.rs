//! Contract Test: Idempotent Updates
//!
//! Constraints verified:
//! - Records are fetched exactly once per engine lifetime
//! - A record already holding the discovered address is not rewritten
//! - A changed address is written exactly once, then becomes a no-op
//!
//! If this test fails, the engine is refetching records or the
//! provider cache is not consulted.

mod common;

use bras_ddns_core::{DdnsEngine, EngineEvent};
use common::*;
use std::net::Ipv4Addr;

#[tokio::test]
async fn unchanged_address_issues_no_update() {
    let portal = MockPortal::new(Ipv4Addr::new(198, 51, 100, 1));
    let provider = MockDnsProvider::with_a_record("198.51.100.1");
    let provider_stats = provider.stats();

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(portal),
        Box::new(StaticSelector::new(discovered([198, 51, 100, 1]))),
        Some(Box::new(provider)),
        fast_config(60_000),
    )
    .expect("engine construction succeeds");

    engine.start().await.expect("startup cycle succeeds");

    assert_eq!(provider_stats.fetch_calls(), 1);
    assert_eq!(provider_stats.update_calls(), 0);

    let events = drain_events(&mut event_rx);
    assert!(events.iter().any(|e| matches!(e, EngineEvent::RecordUnchanged { .. })));
    assert!(!events.iter().any(|e| matches!(e, EngineEvent::RecordUpdated { .. })));
}

#[tokio::test]
async fn changed_address_updates_once_across_cycles() {
    let portal = MockPortal::new(Ipv4Addr::new(198, 51, 100, 9));
    let provider = MockDnsProvider::with_a_record("198.51.100.1");
    let provider_stats = provider.stats();

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(portal),
        Box::new(StaticSelector::new(discovered([198, 51, 100, 9]))),
        Some(Box::new(provider)),
        fast_config(60_000),
    )
    .expect("engine construction succeeds");

    engine.start().await.expect("startup cycle succeeds");
    engine.run_cycle().await.expect("second cycle succeeds");
    engine.run_cycle().await.expect("third cycle succeeds");

    // Fetched once at startup, written once, then cached
    assert_eq!(provider_stats.fetch_calls(), 1);
    assert_eq!(provider_stats.update_calls(), 1);

    let updated: Vec<_> = drain_events(&mut event_rx)
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::RecordUpdated { previous, new, .. } => Some((previous, new)),
            _ => None,
        })
        .collect();
    assert_eq!(
        updated,
        vec![("198.51.100.1".to_string(), "198.51.100.9".to_string())]
    );
}

#[tokio::test]
async fn no_provider_means_no_dns_work() {
    let portal = MockPortal::new(Ipv4Addr::new(203, 0, 113, 5));
    let portal_stats = portal.stats();

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(portal),
        Box::new(StaticSelector::new(discovered([203, 0, 113, 5]))),
        None,
        fast_config(60_000),
    )
    .expect("engine construction succeeds");

    let addresses = engine.start().await.expect("startup cycle succeeds");
    assert_eq!(addresses.ipv4, Some(Ipv4Addr::new(203, 0, 113, 5)));
    assert_eq!(portal_stats.login_calls(), 1);

    let events = drain_events(&mut event_rx);
    assert_eq!(events.first(), Some(&EngineEvent::Started { ddns_enabled: false }));
    assert!(!events.iter().any(|e| matches!(e, EngineEvent::RecordsFetched { .. })));
}
