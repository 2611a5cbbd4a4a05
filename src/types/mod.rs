//! Types module for WhatsApp session types.
//!
//! Identities, messages and the lifecycle events a messaging client emits.

mod jid;
mod events;

pub use jid::*;
pub use events::*;
