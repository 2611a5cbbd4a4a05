//! Per-sender message queues.
//!
//! Every sender gets its own worker task that answers that sender's
//! messages one at a time. A second message from the same person cannot
//! overtake the first, so the menu check and the menu mark never race,
//! while different senders are answered concurrently.
//!
//! A worker exits as soon as its queue is empty. The next message from the
//! same sender starts a new worker, which waits for the previous one to
//! finish before answering.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::bot::dispatcher::{decide, direct_sender, normalize, Action};
use crate::bot::responder::Responder;
use crate::client::MessagingClient;
use crate::types::{IncomingMessage, JID};

struct SenderQueue {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    /// Held by the sender's worker for its whole run.
    turn: Arc<Mutex<()>>,
}

impl SenderQueue {
    /// The worker closed its queue and has finished.
    fn is_finished(&self) -> bool {
        self.tx.is_closed() && Arc::strong_count(&self.turn) == 1
    }
}

pub struct SenderRouter<C> {
    responder: Arc<Responder<C>>,
    queues: HashMap<JID, SenderQueue>,
    workers: JoinSet<()>,
}

impl<C: MessagingClient> SenderRouter<C> {
    pub fn new(responder: Arc<Responder<C>>) -> Self {
        Self {
            responder,
            queues: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Queue a message behind any earlier ones from the same sender.
    pub fn route(&mut self, message: IncomingMessage) {
        info!("📩 Message from {}: {}", message.from, message.text());
        self.reap_workers();

        let Some(sender) = direct_sender(&message) else {
            debug!("Ignoring message from non-direct chat {}", message.from);
            return;
        };

        let (message, turn) = match self.queues.get(&sender) {
            Some(queue) => match queue.tx.send(message) {
                Ok(()) => return,
                Err(mpsc::error::SendError(message)) => (message, queue.turn.clone()),
            },
            None => (message, Arc::default()),
        };

        let queue = self.spawn_worker(sender.clone(), turn, message);
        self.queues.insert(sender, queue);
    }

    /// Number of senders whose worker is still running.
    pub fn active_senders(&self) -> usize {
        self.queues.values().filter(|q| !q.is_finished()).count()
    }

    /// Stop every worker, dropping whatever they have not answered yet.
    pub fn shutdown(&mut self) {
        self.queues.clear();
        self.workers.abort_all();
    }

    fn spawn_worker(
        &mut self,
        sender: JID,
        turn: Arc<Mutex<()>>,
        first: IncomingMessage,
    ) -> SenderQueue {
        let (tx, mut rx) = mpsc::unbounded_channel::<IncomingMessage>();
        // Queued before the task exists, so the worker never starts empty.
        let _ = tx.send(first);

        let responder = self.responder.clone();
        let worker_turn = turn.clone();
        self.workers.spawn(async move {
            let _turn = worker_turn.lock_owned().await;
            while let Ok(message) = rx.try_recv() {
                handle_message(&responder, &sender, &message).await;
            }
            // Anything sent before the close is still answered here.
            rx.close();
            while let Some(message) = rx.recv().await {
                handle_message(&responder, &sender, &message).await;
            }
        });

        SenderQueue { tx, turn }
    }

    fn reap_workers(&mut self) {
        while let Some(result) = self.workers.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Conversation worker panicked: {}", e);
                }
            }
        }
        self.queues.retain(|_, queue| !queue.is_finished());
    }
}

/// Decide and carry out the answer to one message. Failures are logged
/// and never reach the sender.
pub async fn handle_message<C: MessagingClient>(
    responder: &Responder<C>,
    sender: &JID,
    message: &IncomingMessage,
) -> Action {
    let action = decide(responder.menus(), message);
    match action {
        Action::Ignore => {
            debug!("No reply for {}", sender);
            return action;
        }
        Action::SendMenu => info!("🤖 Sending menu to {}", sender),
        Action::SendCannedReply(_) => info!(
            "📤 Replying with option {} to {}",
            normalize(message.body.as_deref()),
            sender
        ),
        Action::SendResetNotice => info!("🔄 Resetting menu for {}", sender),
    }

    if let Err(e) = responder.execute(sender, action).await {
        error!("Failed to answer message {} from {}: {}", message.id, sender, e);
    }
    action
}
