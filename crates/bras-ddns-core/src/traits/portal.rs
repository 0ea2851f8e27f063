// # Portal Trait
//
// Defines the interface for the captive-portal access controller.
//
// ## Implementations
//
// - Bras (p.nju.edu.cn style portals): `bras-ddns-portal` crate
//
// ## Usage
//
// ```rust,ignore
// use bras_ddns_core::Portal;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let portal = /* Portal implementation */;
//
//     portal.login().await?;
//     for session in portal.online_sessions().await? {
//         println!("{} {}", session.mac, session.ipv4);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// One active session reported by the portal for the logged-in account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineSession {
    /// MAC address of the session's device
    pub mac: String,
    /// IPv4 address assigned to the session
    pub ipv4: Ipv4Addr,
    /// IPv6 address as reported by the portal, if any
    pub ipv6: Option<String>,
}

/// Trait for portal implementations
///
/// The session lives server-side and is tied to the account, so the only
/// client-side state an implementation may hold is its HTTP session handle.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Authenticate against the portal
    ///
    /// A fresh challenge is fetched and consumed on every call.
    async fn login(&self) -> Result<(), crate::Error>;

    /// List the sessions currently online for the account
    async fn online_sessions(&self) -> Result<Vec<OnlineSession>, crate::Error>;

    /// Get the portal name (for logging/debugging)
    fn portal_name(&self) -> &'static str;
}
