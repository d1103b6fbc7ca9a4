//! Outbound probe message construction
//!
//! Builds the RFC 2822 message a probe injects into the SMTP path. The
//! message is immutable once built and owned by the coordinator until
//! it is handed to the sender. The token is embedded twice, as the
//! `X-Mailprobe-Token` header and as the last body line, so both
//! header-mode and body-mode extraction round-trip.

use crate::error::{Error, Result};
use crate::token::{ProbeToken, TOKEN_HEADER};
use chrono::Utc;
use lettre::address::{Address, Envelope};

/// Subject line of every probe message.
pub const PROBE_SUBJECT: &str = "Mail delivery probe";

const PROBE_BODY: &str = "This is an automated delivery probe. It was submitted over SMTP\r\n\
to verify that mail reaches the monitored mailbox. It carries a\r\n\
one-time correlation token and can be deleted safely.\r\n";

/// The outbound email of one probe run.
#[derive(Debug, Clone)]
pub struct ProbeMessage {
    envelope: Envelope,
    raw: Vec<u8>,
}

impl ProbeMessage {
    /// Build a probe message carrying `token` from `mail_from` to
    /// `mail_to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] when either address does not parse
    /// or the envelope cannot be formed.
    pub fn build(mail_from: &str, mail_to: &str, token: &ProbeToken) -> Result<Self> {
        let from: Address = mail_from
            .parse()
            .map_err(|e| Error::Message(format!("Invalid sender address '{mail_from}': {e}")))?;
        let to: Address = mail_to
            .parse()
            .map_err(|e| Error::Message(format!("Invalid recipient address '{mail_to}': {e}")))?;

        let envelope = Envelope::new(Some(from), vec![to])
            .map_err(|e| Error::Message(format!("Invalid envelope: {e}")))?;

        let date = Utc::now().to_rfc2822();
        let raw = format!(
            "From: {mail_from}\r\n\
             To: {mail_to}\r\n\
             Subject: {PROBE_SUBJECT}\r\n\
             Date: {date}\r\n\
             Message-ID: <{token}@mailprobe>\r\n\
             {TOKEN_HEADER}: {token}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             {PROBE_BODY}\
             \r\n\
             {TOKEN_HEADER}: {token}\r\n"
        )
        .into_bytes();

        Ok(Self { envelope, raw })
    }

    /// The SMTP envelope (reverse path + single recipient).
    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The complete RFC 2822 message bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}
