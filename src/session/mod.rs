//! Session persistence for the linked WhatsApp Web device.
//!
//! Provides the device credentials, QR pairing codes and the on-disk
//! session artifact that lets the bot reconnect without a new scan.

mod artifact;
mod device;
pub mod qr;

pub use artifact::SessionArtifact;
pub use device::{KeyPair, LinkedDevice};
pub use qr::QrPairing;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to render QR code: {0}")]
    QrGeneration(String),
    #[error("invalid {0} in session artifact: {1}")]
    InvalidKey(&'static str, String),
    #[error("failed to serialize session: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to access session file: {0}")]
    Io(#[from] std::io::Error),
}
