//! Bras portal API wire types

use serde::Deserialize;
use std::net::Ipv4Addr;

/// Generic `{reply_code, reply_msg, results}` envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub reply_code: Option<i64>,
    #[serde(default)]
    pub reply_msg: Option<String>,
    pub results: Option<T>,
}

impl<T> Envelope<T> {
    /// `reply_code == 0`
    pub fn is_ok(&self) -> bool {
        self.reply_code == Some(0)
    }

    /// Human-readable reason for a non-zero reply code
    pub fn describe(&self) -> String {
        let code = self
            .reply_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "missing".to_string());
        match self.reply_msg.as_deref() {
            Some(msg) if !msg.is_empty() => format!("reply_code {}: {}", code, msg),
            _ => format!("reply_code {}", code),
        }
    }
}

/// `results` of the online-session query
#[derive(Debug, Deserialize)]
pub struct OnlineResults {
    #[serde(default)]
    pub rows: Vec<OnlineRow>,
    #[serde(default)]
    pub total: i64,
}

/// One row of the online-session query
#[derive(Debug, Deserialize)]
pub struct OnlineRow {
    #[serde(default)]
    pub mac: String,
    /// Address as a 32-bit integer in network byte order
    pub user_ipv4: u32,
    #[serde(default)]
    pub user_ipv6: Option<String>,
}

impl OnlineRow {
    pub fn ipv4(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.user_ipv4)
    }
}
