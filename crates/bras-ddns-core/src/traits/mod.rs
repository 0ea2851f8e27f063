//! Core traits for the Bras DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Portal`]: Log in to the access controller and list online sessions
//! - [`AddressSelector`]: Map portal addresses onto a local interface
//! - [`DnsProvider`]: Rewrite DNS records via provider APIs

pub mod portal;
pub mod address_selector;
pub mod dns_provider;

pub use portal::{OnlineSession, Portal};
pub use address_selector::{AddressSelector, DiscoveredAddresses};
pub use dns_provider::{DnsProvider, RecordMetadata, RecordType, UpdateResult};
