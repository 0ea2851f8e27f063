// # DnsPod Record Updater
//
// This crate implements the `DnsProvider` trait against the DnsPod legacy
// API at `https://dnsapi.cn`.
//
// ## Flow
//
// 1. `Record.List` once at startup, keeping the A/AAAA records whose name
//    is the configured sub domain
// 2. `Record.Ddns` per record whose cached value differs from the
//    discovered address
//
// All calls are form-encoded POSTs carrying `login_token=<id>,<token>`.
// Responses wrap a `status` object; `status.code == 1` is success. Any
// other code is logged and ignored unless `strict_status` is set.
//
// ## Security Requirements
//
// - The login token NEVER appears in logs or `Debug` output

pub mod provider;
pub mod types;

pub use provider::DnsPodProvider;
