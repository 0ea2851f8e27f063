//! Login credential for the Bras portal
//!
//! The portal's challenge-response scheme: pick a random byte `id`, MD5 the
//! buffer `id ‖ latin1(password) ‖ hex_decode(challenge)`, and send
//! `hex(id) ‖ hex(md5)` as the password. The scheme is weak, but the portal
//! accepts nothing else.

use bras_ddns_core::{Error, Result};
use md5::{Digest, Md5};
use serde::Serialize;

/// Authentication domain expected by the portal
pub const LOGIN_DOMAIN: &str = "default";

/// Body of the login request
///
/// Immutable once built; a challenge-derived password is only valid for the
/// challenge it was built from.
#[derive(Clone, Serialize)]
pub struct Credential {
    domain: &'static str,
    username: String,
    password: String,
    challenge: Option<String>,
}

impl Credential {
    /// Credential that sends the password as-is, without a challenge
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            domain: LOGIN_DOMAIN,
            username: username.into(),
            password: password.into(),
            challenge: None,
        }
    }

    /// Derive the password from `challenge` with a random id byte
    ///
    /// # Errors
    ///
    /// `Error::Parse` if the challenge is not an even-length hex string.
    pub fn with_challenge(
        username: impl Into<String>,
        password: &str,
        challenge: impl Into<String>,
    ) -> Result<Self> {
        Self::with_challenge_id(username, password, challenge, rand::random::<u8>())
    }

    /// Derive the password from `challenge` with a fixed id byte
    pub fn with_challenge_id(
        username: impl Into<String>,
        password: &str,
        challenge: impl Into<String>,
        id: u8,
    ) -> Result<Self> {
        let challenge = challenge.into();
        let challenge_bytes = hex::decode(&challenge)
            .map_err(|e| Error::parse(format!("malformed challenge {:?}: {}", challenge, e)))?;

        let mut buffer = Vec::with_capacity(1 + password.len() + challenge_bytes.len());
        buffer.push(id);
        buffer.extend(password.chars().map(latin1_byte));
        buffer.extend_from_slice(&challenge_bytes);

        let digest = Md5::digest(&buffer);

        Ok(Self {
            domain: LOGIN_DOMAIN,
            username: username.into(),
            password: format!("{:02x}{}", id, hex::encode(digest)),
            challenge: Some(challenge),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password field as sent on the wire
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Single-byte encoding; characters outside Latin-1 become `?`
fn latin1_byte(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(b'?')
}
