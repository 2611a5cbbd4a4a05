//! Client lifecycle supervision.
//!
//! Runs one messaging client at a time. When the client disconnects or
//! fails to start, it is destroyed together with its conversation workers
//! and a new one is started after a fixed delay.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::{mpsc, watch};

use crate::bot::lifecycle::SessionObserver;
use crate::bot::responder::Responder;
use crate::bot::router::SenderRouter;
use crate::bot::BotError;
use crate::client::{ClientError, ClientFactory, MessagingClient};
use crate::context::AppContext;
use crate::types::{DisconnectReason, SessionEvent};

const EVENT_BUFFER: usize = 64;

/// How a client lifecycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEnd {
    Disconnected(DisconnectReason),
    /// The client dropped its event stream without saying why.
    StreamClosed,
    Shutdown,
}

pub struct Supervisor<F> {
    factory: F,
    ctx: Arc<AppContext>,
    observer: SessionObserver,
    shutdown: watch::Receiver<bool>,
}

impl<F: ClientFactory> Supervisor<F> {
    pub fn new(factory: F, ctx: Arc<AppContext>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            factory,
            observer: SessionObserver::new(ctx.clone()),
            ctx,
            shutdown,
        }
    }

    /// Keep a client running until shutdown or until the restart cap is hit.
    pub async fn run(mut self) -> Result<(), BotError> {
        let mut restarts: u32 = 0;

        loop {
            let delay = match self.run_lifecycle().await {
                Ok(LifecycleEnd::Shutdown) => {
                    info!("Shutting down client supervisor");
                    return Ok(());
                }
                Ok(LifecycleEnd::Disconnected(reason)) => {
                    warn!("Client disconnected ({}); restarting", reason);
                    self.ctx.config.reconnect_delay()
                }
                Ok(LifecycleEnd::StreamClosed) => {
                    warn!("Client event stream closed; restarting");
                    self.ctx.config.reconnect_delay()
                }
                Err(e) => {
                    error!("Failed to start client: {}", e);
                    self.ctx.config.init_retry_delay()
                }
            };

            restarts += 1;
            if let Some(max) = self.ctx.config.max_restarts {
                if restarts > max {
                    return Err(BotError::RestartLimit(max));
                }
            }

            info!("Restarting client in {:?} (restart #{})", delay, restarts);
            if self.sleep_or_shutdown(delay).await {
                info!("Shutting down client supervisor");
                return Ok(());
            }
        }
    }

    /// Start one client and pump its events until it ends.
    async fn run_lifecycle(&mut self) -> Result<LifecycleEnd, ClientError> {
        let client = Arc::new(self.factory.create()?);
        let (events_tx, mut events) = mpsc::channel(EVENT_BUFFER);

        if let Err(e) = client.initialize(events_tx).await {
            client.destroy().await;
            return Err(e);
        }

        let responder = Responder::new(
            client.clone(),
            self.ctx.menus.clone(),
            self.ctx.config.typing_delay(),
        );
        let mut router = SenderRouter::new(Arc::new(responder));
        let mut shutdown = self.shutdown.clone();

        let end = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Message(message)) => router.route(message),
                    Some(SessionEvent::Disconnected(reason)) => {
                        self.observer.observe(&SessionEvent::Disconnected(reason.clone()));
                        break LifecycleEnd::Disconnected(reason);
                    }
                    Some(event) => self.observer.observe(&event),
                    None => break LifecycleEnd::StreamClosed,
                },
                _ = wait_for_shutdown(&mut shutdown) => break LifecycleEnd::Shutdown,
            }
        };

        router.shutdown();
        client.destroy().await;
        Ok(end)
    }

    /// Returns true if shutdown was requested during the wait.
    async fn sleep_or_shutdown(&self, delay: Duration) -> bool {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = wait_for_shutdown(&mut shutdown) => true,
        }
    }
}

/// Resolves once `true` is published. Never resolves if the sender is
/// dropped without publishing.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
