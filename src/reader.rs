//! Mailbox inspection over IMAP
//!
//! [`MailboxReader`] is the narrow interface the coordinator polls
//! through: search a folder, delete by identifier. [`ImapReader`]
//! implements it with async-imap over rustls. Every logical operation
//! opens a fresh session and logs out before returning, so at most one
//! IMAP connection is open at a time and never outside the poll or
//! cleanup phase.

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use crate::folder::Folder;
use crate::token::{ProbeToken, TokenLocation, extract_token};
use async_imap::Session;
use futures::StreamExt;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

type ImapSession = Session<Compat<tokio_rustls::client::TlsStream<TcpStream>>>;

/// A message seen in a folder during one search.
///
/// `token` is the decoded correlation token, `None` when the message
/// carries none or cannot be parsed. `uid` is the folder-scoped IMAP
/// UID used for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMessage {
    pub uid: u32,
    pub folder: Folder,
    pub token: Option<ProbeToken>,
}

/// Lists and deletes messages in a mailbox.
#[allow(async_fn_in_trait)]
pub trait MailboxReader {
    /// All messages currently in `folder`, with their decoded tokens.
    /// An empty folder is `Ok(vec![])`, not an error.
    async fn search(&self, folder: &Folder) -> Result<Vec<ObservedMessage>>;

    /// Delete one message by folder and UID.
    async fn delete(&self, folder: &Folder, uid: u32) -> Result<()>;
}

/// IMAP mailbox reader (implicit TLS).
pub struct ImapReader {
    config: ImapConfig,
    location: TokenLocation,
}

impl ImapReader {
    #[must_use]
    pub const fn new(config: ImapConfig, location: TokenLocation) -> Self {
        Self { config, location }
    }

    fn tls_connector(&self) -> TlsConnector {
        let config = if self.config.insecure {
            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAllVerifier))
                .with_no_client_auth()
        } else {
            let roots = rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth()
        };
        TlsConnector::from(Arc::new(config))
    }

    async fn connect(&self) -> Result<ImapSession> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        debug!("Connecting to IMAP server at {}", addr);

        let tcp_stream = TcpStream::connect(&addr).await?;

        let connector = self.tls_connector();
        let server_name = ServerName::try_from(self.config.host.clone())
            .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream.compat());

        let session = client
            .login(&self.config.username, &self.config.password)
            .await
            .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

        info!("Connected to IMAP server");
        Ok(session)
    }

    async fn select(&self, session: &mut ImapSession, folder: &Folder) -> Result<()> {
        session
            .select(folder.as_str())
            .await
            .map_err(|e| Error::Imap(format!("Failed to select {folder}: {e}")))?;
        Ok(())
    }

    async fn fetch_raw(&self, session: &mut ImapSession, uid: u32) -> Result<Vec<u8>> {
        let uid_set = format!("{uid}");
        let mut messages = session
            .uid_fetch(&uid_set, "(BODY.PEEK[])")
            .await
            .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?;

        if let Some(msg_result) = messages.next().await {
            let msg = msg_result.map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;
            if let Some(body) = msg.body() {
                return Ok(body.to_vec());
            }
        }

        Err(Error::Imap(format!("No body found for UID {uid}")))
    }
}

impl MailboxReader for ImapReader {
    async fn search(&self, folder: &Folder) -> Result<Vec<ObservedMessage>> {
        let mut session = self.connect().await?;
        self.select(&mut session, folder).await?;

        let uids = session
            .uid_search("ALL")
            .await
            .map_err(|e| Error::Imap(format!("Search in {folder} failed: {e}")))?;

        let mut uid_list: Vec<u32> = uids.into_iter().collect();
        uid_list.sort_unstable();

        debug!("Inspecting {} messages in {}", uid_list.len(), folder);

        let mut observed = Vec::new();
        for uid in uid_list {
            // One undecodable message must not hide the rest of the
            // folder; it simply extracts no token.
            match self.fetch_raw(&mut session, uid).await {
                Ok(raw) => observed.push(ObservedMessage {
                    uid,
                    folder: folder.clone(),
                    token: extract_token(&raw, self.location),
                }),
                Err(e) => {
                    warn!("Failed to fetch UID {} in {}: {}", uid, folder, e);
                }
            }
        }

        session.logout().await.ok();
        Ok(observed)
    }

    async fn delete(&self, folder: &Folder, uid: u32) -> Result<()> {
        let mut session = self.connect().await?;
        self.select(&mut session, folder).await?;

        let uid_set = format!("{uid}");
        let mut updates = session
            .uid_store(&uid_set, "+FLAGS (\\Deleted)")
            .await
            .map_err(|e| Error::Imap(format!("Store failed for UID {uid}: {e}")))?;
        while let Some(update) = updates.next().await {
            update.map_err(|e| Error::Imap(format!("Store failed for UID {uid}: {e}")))?;
        }
        drop(updates);

        {
            let expunged = session
                .expunge()
                .await
                .map_err(|e| Error::Imap(format!("Expunge failed in {folder}: {e}")))?;
            let mut expunged = std::pin::pin!(expunged);
            while let Some(seq) = expunged.next().await {
                seq.map_err(|e| Error::Imap(format!("Expunge failed in {folder}: {e}")))?;
            }
        }

        info!("Deleted UID {} in {}", uid, folder);

        session.logout().await.ok();
        Ok(())
    }
}

/// Certificate verifier that accepts all certificates, for
/// self-signed IMAP endpoints behind `insecure`.
#[derive(Debug)]
struct AcceptAllVerifier;

impl rustls::client::danger::ServerCertVerifier for AcceptAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
