//! SMTP-to-IMAP mail delivery probe
//!
//! Injects a uniquely tagged message into an SMTP path, then polls an
//! IMAP mailbox until the tag shows up in the inbox, shows up in a
//! spam folder, or a deadline elapses. The outcome maps onto the
//! monitoring-plugin exit-code convention (OK / WARNING / CRITICAL /
//! UNKNOWN), so a scheduler like Icinga or Nagios can run the probe
//! binary directly.
//!
//! The [`Probe`] coordinator drives one run against two narrow
//! collaborator interfaces: a [`Sender`] that submits the message and
//! a [`MailboxReader`] that searches and deletes. [`SmtpSender`] and
//! [`ImapReader`] are the production implementations.

mod config;
mod error;
mod folder;
mod message;
mod probe;
mod reader;
mod sender;
mod token;
mod verdict;

pub use config::{ImapConfig, ProbeConfig, SmtpConfig, password_from_env};
pub use error::{Error, Result};
pub use folder::{Folder, FolderClass, FolderSpec, Placement};
pub use message::{PROBE_SUBJECT, ProbeMessage};
pub use probe::Probe;
pub use reader::{ImapReader, MailboxReader, ObservedMessage};
pub use sender::{Sender, SmtpSender};
pub use token::{ProbeToken, TOKEN_HEADER, TokenLocation, extract_token};
pub use verdict::{ProbeReport, Stage, Verdict};
