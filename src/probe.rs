//! The probe coordinator
//!
//! Drives one full probe run: send the tagged message, poll the
//! mailbox folders in priority order until the token shows up or the
//! deadline elapses, classify the outcome, optionally clean up, and
//! produce exactly one [`ProbeReport`].
//!
//! The run is a straight-line state machine:
//!
//! ```text
//! Init -> Sending -> {SendFailed | Polling}
//!      -> Polling -> {Delivered | Misdelivered | NotFound | TransportError}
//!      -> (optional Cleanup) -> Done
//! ```
//!
//! A single pass over the folders would race ordinary SMTP/IMAP
//! propagation delay, so the poll loop repeats full sweeps with a
//! bounded sleep in between, governed by a monotonic deadline. A sweep
//! that is underway when the deadline expires always completes; no new
//! sweep starts afterwards.

use crate::config::ProbeConfig;
use crate::folder::{Folder, FolderSpec, Placement};
use crate::message::ProbeMessage;
use crate::reader::MailboxReader;
use crate::sender::Sender;
use crate::token::ProbeToken;
use crate::verdict::{ProbeReport, Stage, Verdict};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// A token match located during polling.
struct Match {
    folder: Folder,
    placement: Placement,
    uid: u32,
}

/// One-shot coordinator for a single probe run.
pub struct Probe<S, R> {
    sender: S,
    reader: R,
    config: ProbeConfig,
}

impl<S: Sender, R: MailboxReader> Probe<S, R> {
    #[must_use]
    pub const fn new(sender: S, reader: R, config: ProbeConfig) -> Self {
        Self {
            sender,
            reader,
            config,
        }
    }

    /// Run the probe to completion.
    ///
    /// Infallible by design: every failure mode folds into the
    /// returned report's verdict, so each run yields exactly one
    /// verdict.
    pub async fn run(&self) -> ProbeReport {
        let token = ProbeToken::generate();
        info!("Starting delivery probe with token {}", token);

        let message =
            match ProbeMessage::build(&self.config.mail_from, &self.config.mail_to, &token) {
                Ok(message) => message,
                Err(e) => return ProbeReport::transport(Stage::Send, e.to_string()),
            };

        // No retry here: the monitoring scheduler owns retry cadence.
        if let Err(e) = self.sender.submit(&message).await {
            warn!("Submission failed: {}", e);
            return ProbeReport::transport(Stage::Send, e.to_string());
        }

        let spec = self.config.folder_spec();
        let found = match self.poll(&spec, &token).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Polling aborted: {}", e);
                return ProbeReport::transport(Stage::Imap, e.to_string());
            }
        };

        let verdict = found.as_ref().map_or(Verdict::NotFound, |m| match m.placement {
            Placement::Primary => Verdict::Delivered {
                folder: m.folder.clone(),
            },
            Placement::Spam => Verdict::Misdelivered {
                folder: m.folder.clone(),
            },
        });

        let mut report = ProbeReport::new(verdict);
        if self.config.cleanup {
            self.cleanup(&spec, &token, found.as_ref(), &mut report)
                .await;
        }
        report
    }

    /// Sweep the folders in priority order until the token is found
    /// or the deadline elapses.
    ///
    /// Within a sweep, earlier folders are always searched first and a
    /// match stops the sweep immediately, so a hit in a spam folder
    /// can never preempt a pending INBOX check.
    async fn poll(&self, spec: &FolderSpec, token: &ProbeToken) -> crate::Result<Option<Match>> {
        let deadline = Instant::now() + self.config.deadline;
        let mut sweeps = 0u32;

        loop {
            sweeps += 1;
            debug!("Folder sweep {}", sweeps);

            for entry in spec.entries() {
                let observed = self.reader.search(&entry.folder).await?;
                for message in observed {
                    if message.token.as_ref() == Some(token) {
                        info!("Token found in {} (UID {})", entry.folder, message.uid);
                        return Ok(Some(Match {
                            folder: entry.folder.clone(),
                            placement: entry.placement,
                            uid: message.uid,
                        }));
                    }
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("Deadline elapsed after {} sweeps", sweeps);
                return Ok(None);
            }
            sleep(self.config.poll_interval.min(remaining)).await;
        }
    }

    /// Delete the matched message, and with `cleanup_stale` also the
    /// leftovers of interrupted earlier runs.
    ///
    /// Deletion is by exact identity of the current run's match;
    /// stale deletion only touches messages that carry a probe token,
    /// never ordinary mail. Failures become warnings on the report
    /// and leave the verdict untouched.
    async fn cleanup(
        &self,
        spec: &FolderSpec,
        token: &ProbeToken,
        matched: Option<&Match>,
        report: &mut ProbeReport,
    ) {
        if let Some(m) = matched
            && let Err(e) = self.reader.delete(&m.folder, m.uid).await
        {
            warn!("Cleanup failed for UID {} in {}: {}", m.uid, m.folder, e);
            report
                .warnings
                .push(format!("cleanup failed for UID {} in {}: {e}", m.uid, m.folder));
        }

        if !self.config.cleanup_stale {
            return;
        }

        for entry in spec.entries() {
            let observed = match self.reader.search(&entry.folder).await {
                Ok(observed) => observed,
                Err(e) => {
                    report
                        .warnings
                        .push(format!("stale cleanup search in {} failed: {e}", entry.folder));
                    continue;
                }
            };

            for message in observed {
                // Only messages carrying a token are probe leftovers;
                // the current run's token was handled above.
                let is_stale = message
                    .token
                    .as_ref()
                    .is_some_and(|t| t != token);
                if !is_stale {
                    continue;
                }

                info!("Removing stale probe UID {} in {}", message.uid, entry.folder);
                if let Err(e) = self.reader.delete(&entry.folder, message.uid).await {
                    report.warnings.push(format!(
                        "stale cleanup failed for UID {} in {}: {e}",
                        message.uid, entry.folder
                    ));
                }
            }
        }
    }
}
