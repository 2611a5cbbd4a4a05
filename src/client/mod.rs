//! Messaging client seam.
//!
//! The bot never talks to WhatsApp directly. It drives a [`MessagingClient`],
//! which owns the transport and reports what happens on the session through
//! a channel of [`SessionEvent`]s.

pub mod console;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::session::SessionError;
use crate::types::{Chat, ChatStateType, Contact, MessageID, SessionEvent, JID};

pub use console::{ConsoleClient, ConsoleClientFactory};

/// Sending half of a client's event stream.
pub type EventSender = mpsc::Sender<SessionEvent>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client failed to start: {0}")]
    StartupFailed(String),
    #[error("client is not ready; wait for the ready event")]
    NotReady,
    #[error("client was destroyed")]
    Destroyed,
    #[error("chat {0} not found")]
    ChatNotFound(JID),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A connection to a WhatsApp account.
#[async_trait]
pub trait MessagingClient: Send + Sync + 'static {
    /// Start the session. Lifecycle and message events are delivered on
    /// `events` until the client is destroyed.
    async fn initialize(&self, events: EventSender) -> Result<(), ClientError>;

    /// Look up the chat handle for a participant.
    async fn chat(&self, jid: &JID) -> Result<Chat, ClientError>;

    /// Look up contact metadata for a participant.
    async fn contact(&self, jid: &JID) -> Result<Contact, ClientError>;

    /// Show a presence state, such as typing, in a chat.
    async fn send_chat_state(&self, chat: &Chat, state: ChatStateType) -> Result<(), ClientError>;

    /// Send a text message.
    async fn send_message(&self, to: &JID, text: &str) -> Result<MessageID, ClientError>;

    /// Tear the session down. The instance is unusable afterwards.
    async fn destroy(&self);
}

/// Builds a fresh client for every lifecycle of the bot.
pub trait ClientFactory: Send + Sync + 'static {
    type Client: MessagingClient;

    fn create(&self) -> Result<Self::Client, ClientError>;
}

impl<F: ClientFactory> ClientFactory for std::sync::Arc<F> {
    type Client = F::Client;

    fn create(&self) -> Result<Self::Client, ClientError> {
        (**self).create()
    }
}
