// # bras-ddnsd - Bras DDNS Daemon
//
// Thin integration layer: reads the configuration file, builds the portal
// client, interface selector and (optionally) the DnsPod updater, then hands
// them to `DdnsEngine`. All cycle logic lives in bras-ddns-core.
//
// ## Configuration
//
// - `BRAS_DDNS_CONFIG`: path to the JSON configuration (default `config.json`)
// - `BRAS_DDNS_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// ```json
// {
//   "general": { "interval": 10 },
//   "bras": { "username": "...", "password": "..." },
//   "dnspod": { "id": "...", "token": "...", "domain": "example.com", "sub_domain": "home" }
// }
// ```
//
// Without a `dnspod` section the daemon only keeps the portal session alive.

use anyhow::{Context, Result};
use bras_ddns_core::traits::DnsProvider;
use bras_ddns_core::{AppConfig, DdnsEngine, EngineEvent};
use bras_ddns_dnspod::DnsPodProvider;
use bras_ddns_iface::InterfaceSelector;
use bras_ddns_portal::BrasPortal;
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration error
/// - 2: Startup or runtime error
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration could not be loaded or is invalid
    ConfigError = 1,
    /// Initial cycle or runtime failure
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn log_level() -> Level {
    match env::var("BRAS_DDNS_LOG_LEVEL")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(log_level()).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let path = env::var("BRAS_DDNS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match AppConfig::from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };
    info!(
        "Configuration loaded from {} (DDNS {})",
        path,
        if config.ddns_enabled() { "enabled" } else { "disabled" }
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Build the components, run the initial cycle, then tick until interrupted
async fn run_daemon(config: AppConfig) -> Result<()> {
    let portal = BrasPortal::new(&config.bras).context("building portal client")?;
    let selector = InterfaceSelector::system();
    let provider: Option<Box<dyn DnsProvider>> = match config.dnspod {
        Some(ref dnspod) => Some(Box::new(
            DnsPodProvider::new(dnspod).context("building DnsPod client")?,
        )),
        None => None,
    };

    let (engine, events) = DdnsEngine::new(
        Box::new(portal),
        Box::new(selector),
        provider,
        config.engine_config(),
    )?;

    tokio::spawn(log_events(events));

    engine.start().await.context("initial cycle failed")?;
    engine.run().await?;

    Ok(())
}

/// Drain engine events so the channel never fills
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Engine event: {:?}", event);
    }
}
