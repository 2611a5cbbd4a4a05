//! Aetronics WhatsApp auto-responder.
//!
//! Answers direct WhatsApp messages with a keyword-triggered menu of
//! customer-support options for an auto-electronics repair shop.
//!
//! ## Modules
//!
//! - `types` - Identities, messages and session events
//! - `bot` - Conversation rules, replies and client supervision
//! - `client` - Messaging client seam and the console client
//! - `session` - Linked device keys, QR pairing and the session file
//! - `health` - HTTP liveness and QR endpoints
//! - `config` - Configuration management

pub mod bot;
pub mod client;
pub mod health;
pub mod session;
pub mod types;

mod config;
mod context;

pub use bot::{Action, BotError, MenuStateStore, Supervisor};
pub use client::{ClientError, ClientFactory, ConsoleClient, ConsoleClientFactory, MessagingClient};
pub use config::BotConfig;
pub use context::AppContext;
pub use session::{SessionArtifact, SessionError};
pub use types::{IncomingMessage, SessionEvent, JID};
