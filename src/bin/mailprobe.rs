#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for probing SMTP-to-IMAP mail delivery
//!
//! Submits a tagged probe message, polls the IMAP mailbox for it, and
//! exits with a monitoring-plugin code: 0 delivered, 1 in spam,
//! 2 not found or send failure, 3 mailbox unreachable.

use clap::Parser;
use mailprobe::{
    ImapConfig, ImapReader, Probe, ProbeConfig, SmtpConfig, SmtpSender, TokenLocation,
    password_from_env,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailprobe")]
#[command(about = "Check SMTP-to-IMAP delivery health")]
struct Args {
    /// Sender address for the probe message
    #[arg(long)]
    mail_from: String,

    /// Recipient address for the probe message
    #[arg(long)]
    mail_to: String,

    /// Hostname of the SMTP server
    #[arg(long)]
    smtp_host: String,

    /// SMTP port (587 uses STARTTLS, anything else implicit TLS)
    #[arg(long, default_value = "465")]
    smtp_port: u16,

    /// SMTP login user name
    #[arg(long)]
    smtp_user: String,

    /// SMTP login password (falls back to SMTP_PASS)
    #[arg(long)]
    smtp_pass: Option<String>,

    /// Disable TLS for SMTP (local test servers only)
    #[arg(long)]
    smtp_insecure: bool,

    /// Hostname of the IMAP server
    #[arg(long)]
    imap_host: String,

    /// IMAP port (implicit TLS)
    #[arg(long, default_value = "993")]
    imap_port: u16,

    /// IMAP login user name
    #[arg(long)]
    imap_user: String,

    /// IMAP login password (falls back to IMAP_PASS)
    #[arg(long)]
    imap_pass: Option<String>,

    /// Skip IMAP certificate verification (self-signed servers)
    #[arg(long)]
    imap_insecure: bool,

    /// Name of the spam folder to search after INBOX
    #[arg(long)]
    imap_spam: Option<String>,

    /// Search the token in the message body instead of the header
    #[arg(long)]
    imap_body: bool,

    /// Delete the probe message after classification
    #[arg(long)]
    imap_cleanup: bool,

    /// With --imap-cleanup, also delete stale probes from prior runs
    #[arg(long)]
    cleanup_stale: bool,

    /// Give up polling after this many seconds
    #[arg(long, default_value = "120", overrides_with = "deadline")]
    deadline: u64,

    /// Seconds to sleep between folder sweeps
    #[arg(long, default_value = "10")]
    poll_interval: u64,

    /// Verbose diagnostics on stderr
    #[arg(long)]
    debug: bool,

    /// Print the report as JSON instead of a status line
    #[arg(long)]
    json: bool,
}

fn build_config(args: &Args) -> anyhow::Result<ProbeConfig> {
    let smtp_pass = match &args.smtp_pass {
        Some(pass) => pass.clone(),
        None => password_from_env("SMTP_PASS")?,
    };
    let imap_pass = match &args.imap_pass {
        Some(pass) => pass.clone(),
        None => password_from_env("IMAP_PASS")?,
    };

    let config = ProbeConfig {
        mail_from: args.mail_from.clone(),
        mail_to: args.mail_to.clone(),
        smtp: SmtpConfig {
            host: args.smtp_host.clone(),
            port: args.smtp_port,
            username: args.smtp_user.clone(),
            password: smtp_pass,
            insecure: args.smtp_insecure,
        },
        imap: ImapConfig {
            host: args.imap_host.clone(),
            port: args.imap_port,
            username: args.imap_user.clone(),
            password: imap_pass,
            insecure: args.imap_insecure,
        },
        spam_folder: args.imap_spam.clone(),
        token_location: if args.imap_body {
            TokenLocation::Body
        } else {
            TokenLocation::Header
        },
        cleanup: args.imap_cleanup,
        cleanup_stale: args.cleanup_stale,
        deadline: Duration::from_secs(args.deadline),
        poll_interval: Duration::from_secs(args.poll_interval),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("mailprobe=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            // Startup problems are UNKNOWN: the delivery path was
            // never exercised.
            println!("UNKNOWN - {e}");
            return ExitCode::from(3);
        }
    };

    let sender = SmtpSender::new(config.smtp.clone());
    let reader = ImapReader::new(config.imap.clone(), config.token_location);
    let report = Probe::new(sender, reader, config).run().await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("report serializes")
        );
    } else {
        println!("{}", report.status_line());
    }

    ExitCode::from(report.exit_code())
}
