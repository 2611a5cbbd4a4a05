use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use crate::types::JID;

/// Senders that have already been shown the greeting menu.
///
/// Lives for the process only; a restart forgets every sender.
#[derive(Debug, Default)]
pub struct MenuStateStore {
    senders: RwLock<HashSet<JID>>,
}

impl MenuStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the menu was delivered to `sender`.
    pub fn mark_menu_sent(&self, sender: &JID) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sender.clone());
    }

    /// Forget that `sender` has seen the menu.
    pub fn clear(&self, sender: &JID) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(sender);
    }

    pub fn has_received_menu(&self, sender: &JID) -> bool {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(sender)
    }

    pub fn len(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
