//! Probe verdicts and monitoring-plugin output
//!
//! A [`Verdict`] is the single terminal outcome of a run. Mapping to
//! an exit code and a one-line status message follows the monitoring
//! plugin convention: 0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN. A send
//! failure is CRITICAL (the delivery path is definitely broken); an
//! IMAP failure is UNKNOWN (the path may be fine, the probe cannot
//! tell).

use crate::folder::Folder;
use serde::Serialize;
use std::fmt;

/// The transport phase a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// SMTP submission.
    Send,
    /// IMAP search during polling.
    Imap,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Imap => "imap",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classified outcome of one probe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Token found in the primary folder.
    Delivered { folder: Folder },
    /// Token found only in a spam folder.
    Misdelivered { folder: Folder },
    /// Deadline elapsed without a match.
    NotFound,
    /// A transport operation failed before classification.
    TransportError { stage: Stage, detail: String },
}

impl Verdict {
    /// Monitoring-plugin exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Delivered { .. } => 0,
            Self::Misdelivered { .. } => 1,
            Self::NotFound
            | Self::TransportError {
                stage: Stage::Send, ..
            } => 2,
            Self::TransportError {
                stage: Stage::Imap, ..
            } => 3,
        }
    }
}

/// A run's verdict plus non-fatal warnings (cleanup failures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub verdict: Verdict,
    pub warnings: Vec<String>,
}

impl ProbeReport {
    #[must_use]
    pub const fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn transport(stage: Stage, detail: impl Into<String>) -> Self {
        Self::new(Verdict::TransportError {
            stage,
            detail: detail.into(),
        })
    }

    /// Monitoring-plugin exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }

    /// The single status line a monitoring system consumes.
    #[must_use]
    pub fn status_line(&self) -> String {
        let mut line = match &self.verdict {
            Verdict::Delivered { folder } => {
                format!("OK - probe delivered to {folder}")
            }
            Verdict::Misdelivered { folder } => {
                format!("WARNING - probe landed in {folder}")
            }
            Verdict::NotFound => "CRITICAL - probe not found before deadline".to_string(),
            Verdict::TransportError {
                stage: Stage::Send,
                detail,
            } => format!("CRITICAL - send failed: {detail}"),
            Verdict::TransportError {
                stage: Stage::Imap,
                detail,
            } => format!("UNKNOWN - imap failed: {detail}"),
        };

        if !self.warnings.is_empty() {
            line.push_str(&format!(" ({})", self.warnings.join("; ")));
        }
        line
    }
}
