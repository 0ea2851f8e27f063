// # Bras Portal Client
//
// This crate implements the `Portal` trait for Bras captive-portal
// access controllers.
//
// ## Flow
//
// 1. `GET /api/portal/v1/challenge` → one-time hex challenge
// 2. Derive the password from the challenge (see [`credential`])
// 3. `POST /api/portal/v1/login` with the credential as JSON
// 4. `GET /api/selfservice/v1/online` → sessions bound to the account
//
// Every response is a `{reply_code, reply_msg, results}` envelope;
// `reply_code == 0` is success.
//
// ## Session
//
// The portal session lives server-side and is tied to the account. The
// client keeps one `reqwest::Client` with a cookie store for all calls.
//
// ## Security Requirements
//
// - The password NEVER appears in logs or `Debug` output

pub mod client;
pub mod credential;
pub mod types;

pub use client::BrasPortal;
pub use credential::Credential;
