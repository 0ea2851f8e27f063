// # bras-ddns-core
//
// Core library for the Bras portal login + DDNS update loop.
//
// ## Architecture Overview
//
// This library provides the pieces shared by every component crate:
// - **Portal**: Trait for logging in to the access controller and listing sessions
// - **AddressSelector**: Trait for mapping portal addresses onto a local interface
// - **DnsProvider**: Trait for rewriting DNS records via provider APIs
// - **DdnsEngine**: Runs the login → discover → update cycle on a timer
// - **AppConfig**: The JSON configuration file
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **One Cycle at a Time**: Overlapping ticks are skipped, never run concurrently
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: Records are only rewritten when the cached value differs

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{
    AddressSelector, DiscoveredAddresses, DnsProvider, OnlineSession, Portal, RecordMetadata,
    RecordType, UpdateResult,
};
pub use engine::{DdnsEngine, EngineEvent};
pub use config::{AppConfig, BrasConfig, DnsPodConfig, EngineConfig, GeneralConfig};
pub use error::{Error, Result};
