use std::sync::Arc;

use log::{error, info, warn};

use crate::context::AppContext;
use crate::session::qr;
use crate::types::SessionEvent;

/// Reports session lifecycle events. Takes no conversation decisions.
pub struct SessionObserver {
    ctx: Arc<AppContext>,
}

impl SessionObserver {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub fn observe(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Qr(code) => {
                info!("📱 Escanee este código QR con su WhatsApp / Escaneie este QR com o seu WhatsApp");
                match qr::render_terminal(code) {
                    Ok(rendered) => println!("{}", rendered),
                    Err(e) => warn!("Could not render QR code: {}", e),
                }
                self.ctx.set_qr(code.clone());
            }
            SessionEvent::Authenticated(artifact) => {
                info!("🔐 Sesión autenticada / Sessão autenticada");
                if let Some(artifact) = artifact {
                    let path = &self.ctx.config.session_path;
                    match artifact.store(path) {
                        Ok(()) => info!("Session for {} saved to {}", artifact.jid, path),
                        Err(e) => error!("❌ Failed to save session to {}: {}", path, e),
                    }
                }
                self.ctx.clear_qr();
            }
            SessionEvent::Ready => {
                info!("✅ ¡Todo correcto! WhatsApp conectado. / Tudo certo! WhatsApp conectado.");
                self.ctx.clear_qr();
            }
            SessionEvent::Disconnected(reason) => {
                warn!("⚠️ Cliente desconectado: {}", reason);
            }
            SessionEvent::AuthFailure(message) => {
                error!("❌ Falha na autenticação: {}", message);
            }
            SessionEvent::Message(_) => {}
        }
    }
}
