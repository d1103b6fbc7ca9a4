//! Test data model for the fake IMAP server
//!
//! Builder-style construction of mailbox state:
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .folder("INBOX")
//!         .email(1, raw_rfc2822_bytes)
//!     .folder("Junk")
//!     .build();
//! ```
//!
//! Besides pre-seeded messages, folders accept live delivery via
//! [`Mailbox::deliver`] -- that is how the fake SMTP server completes
//! the probe loop.

/// A complete mailbox: named folders holding test emails.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, matching real IMAP).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }

    /// Append a message to a folder, assigning the next free UID.
    /// Returns the assigned UID, or `None` for an unknown folder.
    pub fn deliver(&mut self, name: &str, raw: Vec<u8>) -> Option<u32> {
        let folder = self.get_folder_mut(name)?;
        let uid = folder.emails.iter().map(|e| e.uid).max().unwrap_or(0) + 1;
        folder.emails.push(TestEmail {
            uid,
            deleted: false,
            raw,
        });
        Some(uid)
    }
}

/// A single IMAP folder (e.g. "INBOX", "Junk").
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub emails: Vec<TestEmail>,
}

/// A test email stored in a folder.
///
/// - `uid`: folder-scoped IMAP UID, stable across deletes.
/// - `deleted`: whether `\Deleted` is set; EXPUNGE removes these.
/// - `raw`: the complete RFC 2822 message returned by FETCH BODY[].
#[derive(Debug, Clone)]
pub struct TestEmail {
    pub uid: u32,
    pub deleted: bool,
    pub raw: Vec<u8>,
}

/// Builder for constructing a `Mailbox` step by step.
pub struct MailboxBuilder {
    folders: Vec<Folder>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
        }
    }

    /// Add a new folder. Subsequent `.email()` calls add to this folder.
    pub fn folder(mut self, name: &str) -> Self {
        self.folders.push(Folder {
            name: name.to_string(),
            emails: Vec::new(),
        });
        self
    }

    /// Add an email to the most recently added folder.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn email(mut self, uid: u32, raw: &[u8]) -> Self {
        self.folders
            .last_mut()
            .expect("call .folder() before .email()")
            .emails
            .push(TestEmail {
                uid,
                deleted: false,
                raw: raw.to_vec(),
            });
        self
    }

    /// Consume the builder and return the finished `Mailbox`.
    pub fn build(self) -> Mailbox {
        Mailbox {
            folders: self.folders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliver_assigns_increasing_uids() {
        let mut mailbox = MailboxBuilder::new().folder("INBOX").build();

        assert_eq!(mailbox.deliver("INBOX", b"one".to_vec()), Some(1));
        assert_eq!(mailbox.deliver("INBOX", b"two".to_vec()), Some(2));
        assert_eq!(mailbox.get_folder("INBOX").unwrap().emails.len(), 2);
    }

    #[test]
    fn deliver_continues_after_seeded_uids() {
        let mut mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .email(41, b"seeded")
            .build();

        assert_eq!(mailbox.deliver("INBOX", b"new".to_vec()), Some(42));
    }

    #[test]
    fn deliver_to_unknown_folder_is_none() {
        let mut mailbox = MailboxBuilder::new().folder("INBOX").build();
        assert_eq!(mailbox.deliver("Gone", b"x".to_vec()), None);
    }
}
