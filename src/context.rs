use std::sync::{Arc, PoisonError, RwLock};

use crate::bot::MenuStateStore;
use crate::config::BotConfig;

/// State shared by the conversation workers, the lifecycle observer and
/// the health server.
///
/// Created once at process start and dropped at exit. Nothing in it is
/// persisted; a restart begins with an empty menu store and no QR code.
#[derive(Debug)]
pub struct AppContext {
    pub config: BotConfig,
    pub menus: Arc<MenuStateStore>,
    last_qr: RwLock<Option<String>>,
}

impl AppContext {
    pub fn new(config: BotConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            menus: Arc::new(MenuStateStore::new()),
            last_qr: RwLock::new(None),
        })
    }

    /// Remember the most recently issued pairing code.
    pub fn set_qr(&self, code: impl Into<String>) {
        *self.last_qr.write().unwrap_or_else(PoisonError::into_inner) = Some(code.into());
    }

    /// Forget the pairing code once it can no longer be used.
    pub fn clear_qr(&self) {
        *self.last_qr.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn last_qr(&self) -> Option<String> {
        self.last_qr
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_slot() {
        let ctx = AppContext::new(BotConfig::default());
        assert!(ctx.last_qr().is_none());

        ctx.set_qr("first");
        ctx.set_qr("second");
        assert_eq!(ctx.last_qr().as_deref(), Some("second"));

        ctx.clear_qr();
        assert!(ctx.last_qr().is_none());
        assert!(ctx.menus.is_empty());
    }
}
