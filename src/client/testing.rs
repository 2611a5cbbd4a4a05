//! Scripted client used by the bot's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{ClientError, ClientFactory, EventSender, MessagingClient};
use crate::types::{Chat, ChatStateType, Contact, MessageID, SessionEvent, JID};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Chat(JID),
    Contact(JID),
    Typing(JID),
    Sent(JID, String),
}

/// Shared record of what a client was asked to do.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<Call>>,
    pub push_names: Mutex<HashMap<JID, String>>,
    pub fail_sends: AtomicBool,
    pub fail_chats: AtomicBool,
    pub destroyed: AtomicUsize,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(JID, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Sent(to, text) => Some((to, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[derive(Default)]
pub struct RecordingClient {
    pub recorder: Arc<Recorder>,
    /// Events emitted by `initialize`.
    pub script: Vec<SessionEvent>,
    pub fail_init: bool,
    /// Keep the event stream open after the script until destroyed.
    pub keep_open: bool,
    events: Mutex<Option<EventSender>>,
}

impl RecordingClient {
    pub fn new(recorder: Arc<Recorder>) -> Self {
        Self {
            recorder,
            ..Default::default()
        }
    }

    pub fn failing(recorder: Arc<Recorder>) -> Self {
        Self {
            recorder,
            fail_init: true,
            ..Default::default()
        }
    }

    pub fn scripted(recorder: Arc<Recorder>, script: Vec<SessionEvent>, keep_open: bool) -> Self {
        Self {
            recorder,
            script,
            keep_open,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MessagingClient for RecordingClient {
    async fn initialize(&self, events: EventSender) -> Result<(), ClientError> {
        if self.fail_init {
            return Err(ClientError::StartupFailed("browser did not launch".into()));
        }
        for event in self.script.clone() {
            events
                .send(event)
                .await
                .map_err(|e| ClientError::SendFailed(e.to_string()))?;
        }
        if self.keep_open {
            *self.events.lock().unwrap() = Some(events);
        }
        Ok(())
    }

    async fn chat(&self, jid: &JID) -> Result<Chat, ClientError> {
        self.recorder.record(Call::Chat(jid.clone()));
        if self.recorder.fail_chats.load(Ordering::SeqCst) {
            return Err(ClientError::ChatNotFound(jid.clone()));
        }
        Ok(Chat {
            jid: jid.clone(),
            name: None,
        })
    }

    async fn contact(&self, jid: &JID) -> Result<Contact, ClientError> {
        self.recorder.record(Call::Contact(jid.clone()));
        Ok(Contact {
            jid: jid.clone(),
            push_name: self.recorder.push_names.lock().unwrap().get(jid).cloned(),
        })
    }

    async fn send_chat_state(&self, chat: &Chat, state: ChatStateType) -> Result<(), ClientError> {
        if state == ChatStateType::Composing {
            self.recorder.record(Call::Typing(chat.jid.clone()));
        }
        Ok(())
    }

    async fn send_message(&self, to: &JID, text: &str) -> Result<MessageID, ClientError> {
        if self.recorder.fail_sends.load(Ordering::SeqCst) {
            return Err(ClientError::SendFailed("connection reset".into()));
        }
        self.recorder.record(Call::Sent(to.clone(), text.to_string()));
        Ok(format!("{:X}", rand::random::<u64>()))
    }

    async fn destroy(&self) {
        self.events.lock().unwrap().take();
        self.recorder.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out pre-built clients in order; fails once they run out.
#[derive(Default)]
pub struct ScriptedFactory {
    pub clients: Mutex<VecDeque<RecordingClient>>,
    pub attempts: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(clients: Vec<RecordingClient>) -> Self {
        Self {
            clients: Mutex::new(clients.into()),
            attempts: AtomicUsize::new(0),
        }
    }
}

impl ClientFactory for ScriptedFactory {
    type Client = RecordingClient;

    fn create(&self) -> Result<RecordingClient, ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.clients
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::StartupFailed("no client available".into()))
    }
}
