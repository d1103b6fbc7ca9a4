//! IMAP folders and the ordered search plan
//!
//! [`Folder`] is a strongly-typed IMAP mailbox name. [`FolderSpec`] is
//! the ordered list of folders a probe sweeps, each tagged with the
//! [`Placement`] a match there implies. Order is a preference
//! hierarchy: the primary folder is always searched before any spam
//! folder within a sweep.

use serde::{Serialize, Serializer};
use std::fmt;

/// An IMAP mailbox folder.
///
/// The INBOX folder (RFC 3501 required, case-insensitive) and common
/// spam folders have dedicated variants. Server-specific folders use
/// [`Folder::custom`].
///
/// # Examples
///
/// ```
/// use mailprobe::Folder;
///
/// let inbox = Folder::Inbox;
/// assert_eq!(inbox.as_str(), "INBOX");
///
/// let junk = Folder::custom("Junk E-Mail");
/// assert_eq!(junk.as_str(), "Junk E-Mail");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Folder {
    /// The INBOX folder (RFC 3501 required, case-insensitive).
    Inbox,
    /// Spam / junk messages.
    Spam,
    /// A user-defined or server-specific folder.
    Custom(String),
}

impl Folder {
    /// Create a folder for a user-defined or non-standard mailbox.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// The IMAP folder name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "INBOX",
            Self::Spam => "Spam",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Folder {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("inbox") {
            Self::Inbox
        } else if s == "Spam" {
            Self::Spam
        } else {
            Self::Custom(s.to_string())
        }
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl Serialize for Folder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What a token match in a folder says about the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Legitimate delivery into the monitored mailbox.
    Primary,
    /// The message was classified as spam.
    Spam,
}

/// One entry of a [`FolderSpec`]: a folder and the placement a match
/// there implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderClass {
    pub folder: Folder,
    pub placement: Placement,
}

/// The ordered, non-empty list of folders a probe sweeps.
///
/// The first entry is the primary folder; every later entry is a
/// spam-classified fallback. Search order within a sweep always
/// follows this list, so a match in a later folder can never shortcut
/// a pending check of an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSpec {
    entries: Vec<FolderClass>,
}

impl FolderSpec {
    /// The default plan: INBOX only.
    #[must_use]
    pub fn inbox_only() -> Self {
        Self {
            entries: vec![FolderClass {
                folder: Folder::Inbox,
                placement: Placement::Primary,
            }],
        }
    }

    /// INBOX first, then the given spam folder.
    #[must_use]
    pub fn with_spam(spam: Folder) -> Self {
        let mut spec = Self::inbox_only();
        spec.push_spam(spam);
        spec
    }

    /// Append another spam-classified folder to the end of the plan.
    pub fn push_spam(&mut self, folder: Folder) {
        self.entries.push(FolderClass {
            folder,
            placement: Placement::Spam,
        });
    }

    /// Entries in search order.
    #[must_use]
    pub fn entries(&self) -> &[FolderClass] {
        &self.entries
    }
}
