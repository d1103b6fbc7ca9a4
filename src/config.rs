//! Probe configuration
//!
//! One [`ProbeConfig`] is assembled and validated at startup, then
//! passed by value into the coordinator. Passwords may come from the
//! `SMTP_PASS` / `IMAP_PASS` environment variables (a `.env` file is
//! honored) so they stay out of process listings.

use crate::error::{Error, Result};
use crate::folder::{Folder, FolderSpec};
use crate::token::TokenLocation;
use lettre::address::Address;
use std::env;
use std::time::Duration;

/// SMTP submission endpoint.
///
/// Port 587 uses STARTTLS, any other port implicit TLS. `insecure`
/// disables TLS entirely for test servers on localhost.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub insecure: bool,
}

/// IMAP mailbox endpoint (implicit TLS).
///
/// `insecure` skips server certificate verification for self-signed
/// setups.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub insecure: bool,
}

/// Everything one probe run needs.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub mail_from: String,
    pub mail_to: String,
    pub smtp: SmtpConfig,
    pub imap: ImapConfig,
    /// Spam folder searched after INBOX, if any.
    pub spam_folder: Option<String>,
    /// Where to look for the token in fetched messages.
    pub token_location: TokenLocation,
    /// Delete the matched probe message after classification.
    pub cleanup: bool,
    /// Also delete stale probe messages left by interrupted runs.
    pub cleanup_stale: bool,
    /// Wall-clock bound on the poll loop.
    pub deadline: Duration,
    /// Sleep between folder sweeps.
    pub poll_interval: Duration,
}

impl ProbeConfig {
    /// Check the parts the coordinator relies on: well-formed
    /// addresses and a nonzero deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.mail_from
            .parse::<Address>()
            .map_err(|e| Error::Config(format!("Invalid --mail-from '{}': {e}", self.mail_from)))?;
        self.mail_to
            .parse::<Address>()
            .map_err(|e| Error::Config(format!("Invalid --mail-to '{}': {e}", self.mail_to)))?;

        if self.deadline.is_zero() {
            return Err(Error::Config("Deadline must be at least one second".into()));
        }
        if let Some(name) = &self.spam_folder
            && name.trim().is_empty()
        {
            return Err(Error::Config("Spam folder name is empty".into()));
        }
        Ok(())
    }

    /// The ordered folder search plan: INBOX, then the spam folder if
    /// one is configured.
    #[must_use]
    pub fn folder_spec(&self) -> FolderSpec {
        self.spam_folder.as_deref().map_or_else(FolderSpec::inbox_only, |name| {
            FolderSpec::with_spam(Folder::from(name))
        })
    }
}

/// Read a password from the environment, loading `.env` first.
///
/// Used as the fallback when the corresponding CLI flag is absent.
///
/// # Errors
///
/// Returns [`Error::Config`] when the variable is not set.
pub fn password_from_env(var: &str) -> Result<String> {
    dotenvy::dotenv().ok();
    env::var(var).map_err(|_| Error::Config(format!("{var} not set")))
}
