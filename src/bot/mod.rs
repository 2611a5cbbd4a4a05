//! The auto-responder.
//!
//! - `dispatcher` - decides how to answer a message
//! - `menu` - who has already seen the greeting menu
//! - `replies` - menu and option texts
//! - `responder` - sends answers with a typing pause
//! - `router` - one ordered queue per sender
//! - `lifecycle` - logs session events and keeps the last QR code
//! - `supervisor` - restarts the client when it goes away

pub mod dispatcher;
pub mod lifecycle;
pub mod menu;
pub mod replies;
pub mod responder;
pub mod router;
pub mod supervisor;

pub use dispatcher::{decide, Action};
pub use lifecycle::SessionObserver;
pub use menu::MenuStateStore;
pub use responder::Responder;
pub use router::{handle_message, SenderRouter};
pub use supervisor::{LifecycleEnd, Supervisor};

use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("giving up after {0} client restarts")]
    RestartLimit(u32),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("health server failed: {0}")]
    Server(#[from] std::io::Error),
}
