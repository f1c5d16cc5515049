//! Validated channel names.
//!
//! A channel is identified by a name that doubles as the filename prefix of
//! its segment files, so the allowed alphabet is restricted to characters
//! that are safe as a single path component: ASCII letters, digits, `_`,
//! `-`, `.` and `~`. Validation happens once at construction; everything
//! downstream can treat the name as path-safe.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Parse and validate a channel name.
    ///
    /// Rejects the empty string, any character outside
    /// `[A-Za-z0-9_\-.~]`, and the path components `.` and `..`.
    pub fn from_string(s: impl Into<String>) -> Result<ChannelId> {
        let s = s.into();

        let valid_chars = !s.is_empty()
            && s.bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'~'));

        if !valid_chars || s == "." || s == ".." {
            return Err(Error::InvalidChannelId(s));
        }

        Ok(ChannelId(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path prefix of this channel's segment files inside `dir`.
    pub fn channel_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = Error;

    fn try_from(s: String) -> Result<ChannelId> {
        ChannelId::from_string(s)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> String {
        id.0
    }
}
