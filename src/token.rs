//! Probe correlation tokens
//!
//! A [`ProbeToken`] is the sole correlation key between the message a
//! probe sends and the messages it later observes over IMAP. The
//! encode/parse pair here is a small serialization contract: the token
//! travels in the `X-Mailprobe-Token` header (and as a trailing body
//! line, so body-mode extraction round-trips), and extraction must
//! survive whatever header folding and casing intermediate servers
//! apply. Extraction goes through [`mailparse`] rather than naive line
//! matching for exactly that reason.

use mailparse::MailHeaderMap;
use std::fmt;
use uuid::Uuid;

/// Header carrying the probe token in outbound messages.
pub const TOKEN_HEADER: &str = "X-Mailprobe-Token";

/// Where to look for the token when inspecting a fetched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenLocation {
    /// The `X-Mailprobe-Token` header (default).
    #[default]
    Header,
    /// A `X-Mailprobe-Token: <value>` line in the message body. Useful
    /// when a forwarding hop rewrites headers but preserves the body.
    Body,
}

/// An opaque unique correlation token.
///
/// Generated once per run with 122 bits of randomness, so collisions
/// across runs and across concurrently scheduled checks against the
/// same mailbox are not a practical concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeToken(String);

impl ProbeToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The token's wire form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProbeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProbeToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Extract a token from raw RFC 2822 message bytes.
///
/// Returns `None` when the message cannot be parsed or carries no
/// token where `location` says to look. Tokens are treated as opaque:
/// a stale token from an earlier run still extracts here and is
/// rejected later by comparison, not by shape.
#[must_use]
pub fn extract_token(raw: &[u8], location: TokenLocation) -> Option<ProbeToken> {
    let parsed = mailparse::parse_mail(raw).ok()?;

    let value = match location {
        TokenLocation::Header => parsed.headers.get_first_value(TOKEN_HEADER)?,
        TokenLocation::Body => {
            let body = parsed.get_body().ok()?;
            body.lines().find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.trim()
                    .eq_ignore_ascii_case(TOKEN_HEADER)
                    .then(|| value.to_string())
            })?
        }
    };

    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(ProbeToken(value.to_string()))
}
