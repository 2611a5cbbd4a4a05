//! WhatsApp JID (Jabber ID) types.
//!
//! A JID identifies the other side of a conversation: a single contact,
//! a group or a broadcast list. The bot uses it as the sender identity
//! and as the destination of every reply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Known JID servers on WhatsApp
pub mod servers {
    pub const DEFAULT_USER: &str = "s.whatsapp.net";
    pub const LEGACY_USER: &str = "c.us";
    pub const GROUP: &str = "g.us";
    pub const BROADCAST: &str = "broadcast";
    pub const NEWSLETTER: &str = "newsletter";
}

/// MessageID is the identifier the client assigns to a sent message.
pub type MessageID = String;

/// JID represents a WhatsApp chat participant.
///
/// Device suffixes (`user:device@server`) are accepted on parse and kept,
/// so replies go back to the same address the message came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct JID {
    pub user: String,
    pub device: u16,
    pub server: String,
}

impl JID {
    /// Creates a new regular JID.
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
            ..Default::default()
        }
    }

    /// Returns true for one-to-one conversations with a single contact.
    pub fn is_direct_chat(&self) -> bool {
        !self.user.is_empty()
            && matches!(
                self.server.as_str(),
                servers::LEGACY_USER | servers::DEFAULT_USER
            )
    }

    /// Returns true if this JID is a group chat.
    pub fn is_group(&self) -> bool {
        self.server == servers::GROUP
    }

    /// Returns true if this is a broadcast list or the status feed.
    pub fn is_broadcast(&self) -> bool {
        self.server == servers::BROADCAST
    }

    /// Returns a version of the JID without the device suffix.
    pub fn to_non_device(&self) -> Self {
        Self::new(self.user.clone(), self.server.clone())
    }
}

impl fmt::Display for JID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.device > 0 {
            write!(f, "{}:{}@{}", self.user, self.device, self.server)
        } else if !self.user.is_empty() {
            write!(f, "{}@{}", self.user, self.server)
        } else {
            write!(f, "{}", self.server)
        }
    }
}

/// Error type for JID parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to parse JID: {0}")]
pub struct ParseJIDError(pub String);

impl FromStr for JID {
    type Err = ParseJIDError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseJIDError("empty JID".to_string()));
        }

        let Some((user_part, server)) = s.split_once('@') else {
            return Ok(JID::new("", s));
        };

        if server.is_empty() || server.contains('@') {
            return Err(ParseJIDError(format!("invalid server in {s:?}")));
        }

        let mut jid = JID::new(user_part, server);

        if let Some((user, device)) = user_part.split_once(':') {
            jid.user = user.to_string();
            jid.device = device
                .parse()
                .map_err(|_| ParseJIDError("failed to parse device from JID".to_string()))?;
        }

        Ok(jid)
    }
}
