//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Logging in to the portal
//! - Discovering the addresses bound to the authenticated interface
//! - Pushing those addresses to the DNS provider
//! - Repeating the above on a fixed interval until shutdown
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!        tick ──────▶│  DdnsEngine  │──── EngineEvent ───▶ (monitoring)
//!                    └──────────────┘
//!                           │
//!         ┌─────────────────┼─────────────────────┐
//!         │                 │                     │
//!         ▼                 ▼                     ▼
//! ┌─────────────┐  ┌─────────────────┐   ┌──────────────┐
//! │   Portal    │  │ AddressSelector │   │ DnsProvider  │
//! │ (login,     │  │ (local iface)   │   │ (records)    │
//! │  sessions)  │  └─────────────────┘   └──────────────┘
//! └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Portal login (fresh challenge every time)
//! 2. Query online sessions, select the matching local interface
//! 3. On the first cycle only, fetch the provider's records
//! 4. Update records whose cached value differs
//!
//! At most one cycle runs at a time. A tick that fires while the previous
//! cycle is still in flight is skipped.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::traits::{AddressSelector, DiscoveredAddresses, DnsProvider, Portal, RecordType, UpdateResult};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started its initial cycle
    Started {
        ddns_enabled: bool,
    },

    /// Portal login succeeded
    LoggedIn {
        portal: String,
    },

    /// Addresses discovered for this cycle
    AddressesDiscovered {
        addresses: DiscoveredAddresses,
    },

    /// Provider records fetched and cached
    RecordsFetched {
        count: usize,
    },

    /// A record was rewritten
    RecordUpdated {
        record_id: String,
        record_type: RecordType,
        previous: String,
        new: String,
    },

    /// A record already had the discovered address
    RecordUnchanged {
        record_id: String,
        record_type: RecordType,
    },

    /// A tick fired while the previous cycle was still running
    CycleSkipped,

    /// A periodic cycle failed
    CycleFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Run the initial cycle with [`DdnsEngine::start()`]; any error is fatal
/// 3. Arm the timer with [`DdnsEngine::run()`]
/// 4. Engine runs until a shutdown signal is received
///
/// ## Failure Handling
///
/// Errors in periodic cycles are logged and reported as
/// [`EngineEvent::CycleFailed`]; the timer keeps running. There is no retry:
/// the next tick is the next attempt.
pub struct DdnsEngine {
    inner: Arc<EngineInner>,

    /// Time between two periodic cycles
    interval: Duration,
}

struct EngineInner {
    portal: Box<dyn Portal>,
    selector: Box<dyn AddressSelector>,

    /// `None` when DNS updates are not configured
    provider: Option<Box<dyn DnsProvider>>,

    /// Set while a cycle is in flight
    cycle_running: AtomicBool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

/// Holds the "cycle in progress" flag; released on drop
struct CycleGuard {
    inner: Arc<EngineInner>,
}

impl CycleGuard {
    fn acquire(inner: &Arc<EngineInner>) -> Option<Self> {
        inner
            .cycle_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                inner: Arc::clone(inner),
            })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.inner.cycle_running.store(false, Ordering::Release);
    }
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `portal`: Portal implementation
    /// - `selector`: Address selector implementation
    /// - `provider`: DNS provider, or `None` to only keep the portal session alive
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        portal: Box<dyn Portal>,
        selector: Box<dyn AddressSelector>,
        provider: Option<Box<dyn DnsProvider>>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        if config.interval.is_zero() {
            return Err(Error::config("engine interval must be > 0"));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));

        let engine = Self {
            inner: Arc::new(EngineInner {
                portal,
                selector,
                provider,
                cycle_running: AtomicBool::new(false),
                event_tx: tx,
            }),
            interval: config.interval,
        };

        Ok((engine, rx))
    }

    /// Run the initial cycle
    ///
    /// Logs in, discovers addresses and, when a provider is configured,
    /// fetches its records once before updating them. Unlike periodic
    /// cycles, any failure here is returned to the caller.
    pub async fn start(&self) -> Result<DiscoveredAddresses> {
        let _guard = CycleGuard::acquire(&self.inner)
            .ok_or_else(|| Error::Other("a cycle is already in progress".to_string()))?;

        info!("Started at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        self.inner.emit_event(EngineEvent::Started {
            ddns_enabled: self.inner.provider.is_some(),
        });

        self.inner.cycle(true).await
    }

    /// Run one periodic cycle immediately
    ///
    /// Returns an error if another cycle is still in flight.
    pub async fn run_cycle(&self) -> Result<DiscoveredAddresses> {
        let _guard = CycleGuard::acquire(&self.inner)
            .ok_or_else(|| Error::Other("a cycle is already in progress".to_string()))?;
        self.inner.cycle(false).await
    }

    /// Whether a cycle is currently in flight
    pub fn is_cycle_running(&self) -> bool {
        self.inner.cycle_running.load(Ordering::Acquire)
    }

    /// Run the periodic loop
    ///
    /// Ticks every configured interval until SIGINT or SIGTERM.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Signal handlers could not be installed
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the periodic loop with a controlled shutdown signal
    ///
    /// With `None` this behaves like [`DdnsEngine::run()`].
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                    Ok("shutdown signal")
                }
                None => wait_for_signal().await,
            }
        };
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Timer started ({:?} interval), press Ctrl+C to interrupt", self.interval);

        let mut in_flight: Option<JoinHandle<()>> = None;

        let reason = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match CycleGuard::acquire(&self.inner) {
                        Some(guard) => {
                            in_flight = Some(tokio::spawn(async move {
                                guard.inner.periodic_cycle().await;
                                drop(guard);
                            }));
                        }
                        None => {
                            warn!("Previous cycle still running, skipping this tick");
                            self.inner.emit_event(EngineEvent::CycleSkipped);
                        }
                    }
                }

                signal = &mut shutdown => {
                    break signal?;
                }
            }
        };

        info!("Received {}, stopping timer", reason);

        // The in-flight cycle is not cancelled; let it complete or fail on its own
        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("Waiting for in-flight cycle to finish");
            }
            if let Err(e) = handle.await {
                error!("In-flight cycle panicked: {}", e);
            }
        }

        self.inner.emit_event(EngineEvent::Stopped {
            reason: reason.to_string(),
        });
        info!("Exited gracefully");

        Ok(())
    }
}

impl EngineInner {
    /// Periodic cycle body: failures are logged, never propagated
    async fn periodic_cycle(&self) {
        info!("Loop at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

        if let Err(e) = self.cycle(false).await {
            error!("Cycle failed: {}", e);
            self.emit_event(EngineEvent::CycleFailed {
                error: e.to_string(),
            });
        }
    }

    /// Login, discover, and (if configured) update
    ///
    /// # Parameters
    ///
    /// - `fetch_records`: fetch the provider's records before updating
    async fn cycle(&self, fetch_records: bool) -> Result<DiscoveredAddresses> {
        self.portal.login().await?;
        info!("{} login OK", self.portal.portal_name());
        self.emit_event(EngineEvent::LoggedIn {
            portal: self.portal.portal_name().to_string(),
        });

        let addresses = self.discover().await?;

        if let Some(ref provider) = self.provider {
            if fetch_records {
                let records = provider.fetch_records().await?;
                info!("{} query OK", provider.provider_name());
                for record in &records {
                    info!(" -> #{} {} {}", record.id, record.name, record.record_type);
                }
                self.emit_event(EngineEvent::RecordsFetched {
                    count: records.len(),
                });
            }

            let results = provider.update_records(&addresses).await?;
            for result in results {
                self.report_update(result);
            }
        }

        Ok(addresses)
    }

    /// Map the portal's online sessions onto a local interface
    async fn discover(&self) -> Result<DiscoveredAddresses> {
        let sessions = self.portal.online_sessions().await?;
        let candidates: Vec<Ipv4Addr> = sessions.iter().map(|session| session.ipv4).collect();
        debug!("Portal reports {} online session(s): {:?}", sessions.len(), candidates);

        let addresses = self.selector.select(&candidates)?;
        match addresses.ipv4 {
            Some(ip) => info!(" -> IPv4: {}", ip),
            None => info!(" -> IPv4: none"),
        }
        match addresses.ipv6 {
            Some(ip) => info!(" -> IPv6: {}", ip),
            None => info!(" -> IPv6: none"),
        }
        if addresses.is_none() {
            warn!("No local interface carries a portal-reported address");
        }

        self.emit_event(EngineEvent::AddressesDiscovered { addresses });
        Ok(addresses)
    }

    fn report_update(&self, result: UpdateResult) {
        match result {
            UpdateResult::Updated {
                record_id,
                record_type,
                previous,
                new,
            } => {
                self.emit_event(EngineEvent::RecordUpdated {
                    record_id,
                    record_type,
                    previous,
                    new,
                });
            }
            UpdateResult::Unchanged {
                record_id,
                record_type,
                current,
            } => {
                debug!("Record #{} ({}) already at {}", record_id, record_type, current);
                self.emit_event(EngineEvent::RecordUnchanged {
                    record_id,
                    record_type,
                });
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Wait for SIGINT or SIGTERM
#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Other(format!("Failed to setup SIGTERM handler: {}", e)))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Other(format!("Failed to setup SIGINT handler: {}", e)))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("SIGINT")
}
