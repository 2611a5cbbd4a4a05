//! Event types for the WhatsApp session.
//!
//! These events are emitted by a messaging client while its session goes
//! through pairing, authentication and message delivery.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::session::SessionArtifact;
use crate::types::JID;

/// Reason for disconnection
#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectReason {
    /// Normal logout by user
    LoggedOut,
    /// No QR code was scanned before the last one expired
    PairingTimeout,
    /// Server requested disconnect
    ServerRequested,
    /// Network error
    NetworkError(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::LoggedOut => write!(f, "logged out"),
            DisconnectReason::PairingTimeout => write!(f, "pairing timed out"),
            DisconnectReason::ServerRequested => write!(f, "server requested disconnect"),
            DisconnectReason::NetworkError(e) => write!(f, "network error: {}", e),
        }
    }
}

/// A text message received from a chat.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Unique message ID
    pub id: String,
    /// Raw sender address as delivered by the client
    pub from: String,
    /// Message text, absent for media-only messages
    pub body: Option<String>,
    /// Timestamp of the message
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(from: impl Into<String>, body: Option<String>) -> Self {
        Self {
            id: format!("{:X}", rand::random::<u64>()),
            from: from.into(),
            body,
            timestamp: Utc::now(),
        }
    }

    /// Text of the message, empty when there is none.
    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// Handle to a chat, used to show presence such as the typing indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub jid: JID,
    pub name: Option<String>,
}

/// Contact metadata for a chat participant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub jid: JID,
    /// Display name chosen by the contact
    pub push_name: Option<String>,
}

impl Contact {
    /// First word of the push name, or an empty string when there is none.
    pub fn first_name(&self) -> &str {
        self.push_name
            .as_deref()
            .and_then(|name| name.split(' ').next())
            .unwrap_or("")
    }
}

/// Chat state type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChatStateType {
    /// Composing a message
    Composing,
}

/// Events emitted by a messaging client over its lifetime.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A QR code must be scanned to link the device
    Qr(String),
    /// The device is authenticated; carries credentials to persist, if any
    Authenticated(Option<SessionArtifact>),
    /// The session is ready to send and receive messages
    Ready,
    /// The session was closed
    Disconnected(DisconnectReason),
    /// Authentication was rejected
    AuthFailure(String),
    /// A message arrived
    Message(IncomingMessage),
}
