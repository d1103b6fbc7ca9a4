//! Probe submission over SMTP
//!
//! [`Sender`] is the narrow interface the coordinator sees: submit one
//! message, report success or failure. [`SmtpSender`] implements it
//! with lettre. The connection lives only inside [`Sender::submit`];
//! there is no pooling and no retry. A failed submission fails the
//! run and the monitoring scheduler decides when to try again.

use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use crate::message::ProbeMessage;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info};

/// Accepts a probe message for delivery.
#[allow(async_fn_in_trait)]
pub trait Sender {
    /// Submit the message. `Ok(())` means the receiving server took
    /// responsibility for it.
    async fn submit(&self, message: &ProbeMessage) -> Result<()>;
}

/// SMTP submission via lettre.
pub struct SmtpSender {
    config: SmtpConfig,
}

impl SmtpSender {
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Port 587 negotiates STARTTLS, anything else speaks implicit
    /// TLS. `insecure` drops TLS entirely (local test servers).
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let cfg = &self.config;

        let builder = if cfg.insecure {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
        } else if cfg.port == 587 {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
                .map_err(|e| Error::Smtp(format!("Invalid SMTP host '{}': {e}", cfg.host)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
                .map_err(|e| Error::Smtp(format!("Invalid SMTP host '{}': {e}", cfg.host)))?
        };

        Ok(builder
            .port(cfg.port)
            .credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ))
            .build())
    }
}

impl Sender for SmtpSender {
    async fn submit(&self, message: &ProbeMessage) -> Result<()> {
        debug!(
            "Submitting probe to {}:{}",
            self.config.host, self.config.port
        );

        let transport = self.transport()?;
        transport
            .send_raw(message.envelope(), message.raw())
            .await
            .map_err(|e| Error::Smtp(format!("Submission failed: {e}")))?;

        info!("Probe message accepted by SMTP server");
        Ok(())
    }
}
