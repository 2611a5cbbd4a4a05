//! Console-driven WhatsApp Web session.
//!
//! Simulates a linked device on top of line-oriented input so the bot can
//! run end to end without a phone. Each input line is one of:
//!
//! - `/link <jid>`: scan the current QR code with the phone `<jid>`
//! - `/contact <jid> <push name>`: register a contact's display name
//! - `/disconnect`: drop the connection from the server side
//! - `/logout`: forget the stored session and disconnect
//! - `<jid> <text>`: a message from `<jid>`
//!
//! Outbound traffic is printed to stdout. When input runs out the session
//! stays open, so a detached process keeps serving its HTTP endpoints.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::task::JoinHandle;

use crate::client::{ClientError, ClientFactory, EventSender, MessagingClient};
use crate::session::{LinkedDevice, QrPairing, SessionArtifact};
use crate::types::{
    Chat, ChatStateType, Contact, DisconnectReason, IncomingMessage, MessageID, SessionEvent, JID,
};

type InputLines = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

/// Line source shared by every client the factory creates, so a restarted
/// session keeps reading where the previous one stopped.
pub type ConsoleInput = Arc<tokio::sync::Mutex<InputLines>>;

/// Wrap a reader as console input.
pub fn console_input<R>(reader: R) -> ConsoleInput
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let boxed: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
    Arc::new(tokio::sync::Mutex::new(boxed.lines()))
}

/// Console input backed by the process stdin.
pub fn stdin_input() -> ConsoleInput {
    console_input(BufReader::new(tokio::io::stdin()))
}

/// Creates [`ConsoleClient`]s sharing one input and one session file.
pub struct ConsoleClientFactory {
    session_path: PathBuf,
    device_name: String,
    input: ConsoleInput,
}

impl ConsoleClientFactory {
    pub fn new(
        session_path: impl Into<PathBuf>,
        device_name: impl Into<String>,
        input: ConsoleInput,
    ) -> Self {
        Self {
            session_path: session_path.into(),
            device_name: device_name.into(),
            input,
        }
    }
}

impl ClientFactory for ConsoleClientFactory {
    type Client = ConsoleClient;

    fn create(&self) -> Result<ConsoleClient, ClientError> {
        Ok(ConsoleClient::new(
            self.session_path.clone(),
            self.device_name.clone(),
            self.input.clone(),
        ))
    }
}

#[derive(Debug, Default)]
struct ConsoleState {
    ready: bool,
    destroyed: bool,
    contacts: HashMap<JID, String>,
}

pub struct ConsoleClient {
    session_path: PathBuf,
    device_name: String,
    input: ConsoleInput,
    state: Arc<Mutex<ConsoleState>>,
    session_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleClient {
    pub fn new(session_path: PathBuf, device_name: String, input: ConsoleInput) -> Self {
        Self {
            session_path,
            device_name,
            input,
            state: Arc::new(Mutex::new(ConsoleState::default())),
            session_task: Mutex::new(None),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_ready(&self) -> Result<(), ClientError> {
        let state = self.state();
        if state.destroyed {
            return Err(ClientError::Destroyed);
        }
        if !state.ready {
            return Err(ClientError::NotReady);
        }
        Ok(())
    }

    /// Load stored credentials, or generate a device that still needs pairing.
    fn restore_device(&self) -> Result<(LinkedDevice, Option<JID>), ClientError> {
        match SessionArtifact::load(&self.session_path) {
            Ok(Some(artifact)) => {
                let device = artifact.device()?;
                info!(
                    "Restored session for {} (linked {})",
                    artifact.jid, artifact.linked_at
                );
                Ok((device, Some(artifact.jid)))
            }
            Ok(None) => Ok((LinkedDevice::generate(), None)),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.session_path.display(),
                    e
                );
                Ok((LinkedDevice::generate(), None))
            }
        }
    }
}

#[async_trait]
impl MessagingClient for ConsoleClient {
    async fn initialize(&self, events: EventSender) -> Result<(), ClientError> {
        if self.state().destroyed {
            return Err(ClientError::Destroyed);
        }

        let (device, linked) = self.restore_device()?;
        debug!(
            "Console device noise key {} (registration {})",
            device.noise_key.fingerprint(),
            device.registration_id
        );

        let session = ConsoleSession {
            session_path: self.session_path.clone(),
            device_name: self.device_name.clone(),
            input: self.input.clone(),
            state: self.state.clone(),
            events,
            device,
        };
        let handle = tokio::spawn(session.run(linked));

        let mut slot = self.session_task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    async fn chat(&self, jid: &JID) -> Result<Chat, ClientError> {
        self.ensure_ready()?;
        let name = self.state().contacts.get(&jid.to_non_device()).cloned();
        Ok(Chat {
            jid: jid.clone(),
            name,
        })
    }

    async fn contact(&self, jid: &JID) -> Result<Contact, ClientError> {
        self.ensure_ready()?;
        let push_name = self.state().contacts.get(&jid.to_non_device()).cloned();
        Ok(Contact {
            jid: jid.clone(),
            push_name,
        })
    }

    async fn send_chat_state(&self, chat: &Chat, state: ChatStateType) -> Result<(), ClientError> {
        self.ensure_ready()?;
        match (state, &chat.name) {
            (ChatStateType::Composing, Some(name)) => {
                println!("✍️  typing to {} ({})...", name, chat.jid)
            }
            (ChatStateType::Composing, None) => println!("✍️  typing to {}...", chat.jid),
        }
        Ok(())
    }

    async fn send_message(&self, to: &JID, text: &str) -> Result<MessageID, ClientError> {
        self.ensure_ready()?;
        let id = format!("{:X}", rand::random::<u64>());
        println!("📤 to {}:\n{}\n", to, text);
        Ok(id)
    }

    async fn destroy(&self) {
        {
            let mut state = self.state();
            state.destroyed = true;
            state.ready = false;
        }
        let handle = self
            .session_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Background task reading console input for one client lifecycle.
struct ConsoleSession {
    session_path: PathBuf,
    device_name: String,
    input: ConsoleInput,
    state: Arc<Mutex<ConsoleState>>,
    events: EventSender,
    device: LinkedDevice,
}

enum Flow {
    Continue,
    Stop,
}

impl ConsoleSession {
    async fn run(self, linked: Option<JID>) {
        let mut pairing = match linked {
            Some(_) => {
                if let Flow::Stop = self.become_ready(None).await {
                    return;
                }
                None
            }
            None => {
                let pairing = QrPairing::new(&self.device);
                let code = pairing.current_code().unwrap_or_default().to_string();
                if !self.emit(SessionEvent::Qr(code)).await {
                    return;
                }
                Some(pairing)
            }
        };

        loop {
            let next = match pairing.as_ref().map(QrPairing::current_timeout) {
                Some(timeout) => match tokio::time::timeout(timeout, self.next_line()).await {
                    Ok(line) => line,
                    Err(_) => {
                        if let Flow::Stop = self.rotate_qr(&mut pairing).await {
                            return;
                        }
                        continue;
                    }
                },
                None => self.next_line().await,
            };

            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Console input closed; keeping the session open");
                    self.park(pairing).await;
                    return;
                }
                Err(e) => {
                    warn!("Failed to read console input: {}", e);
                    return;
                }
            };

            if let Flow::Stop = self.handle_line(line.trim(), &mut pairing).await {
                return;
            }
        }
    }

    /// Hold the session without input. A pending pairing still rotates and
    /// times out; a linked session stays up until the client is destroyed.
    async fn park(&self, mut pairing: Option<QrPairing>) {
        while let Some(timeout) = pairing.as_ref().map(QrPairing::current_timeout) {
            tokio::time::sleep(timeout).await;
            if let Flow::Stop = self.rotate_qr(&mut pairing).await {
                return;
            }
        }
        std::future::pending::<()>().await
    }

    async fn next_line(&self) -> std::io::Result<Option<String>> {
        self.input.lock().await.next_line().await
    }

    async fn emit(&self, event: SessionEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    fn set_ready(&self, ready: bool) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).ready = ready;
    }

    async fn become_ready(&self, artifact: Option<SessionArtifact>) -> Flow {
        if !self.emit(SessionEvent::Authenticated(artifact)).await {
            return Flow::Stop;
        }
        self.set_ready(true);
        if !self.emit(SessionEvent::Ready).await {
            return Flow::Stop;
        }
        Flow::Continue
    }

    async fn disconnect(&self, reason: DisconnectReason) -> Flow {
        self.set_ready(false);
        self.emit(SessionEvent::Disconnected(reason)).await;
        Flow::Stop
    }

    async fn rotate_qr(&self, pairing: &mut Option<QrPairing>) -> Flow {
        let next = pairing
            .as_mut()
            .and_then(|p| p.next_code().map(str::to_string));
        match next {
            Some(code) => {
                if self.emit(SessionEvent::Qr(code)).await {
                    Flow::Continue
                } else {
                    Flow::Stop
                }
            }
            None => {
                self.emit(SessionEvent::AuthFailure(
                    "QR code was not scanned in time".to_string(),
                ))
                .await;
                self.disconnect(DisconnectReason::PairingTimeout).await
            }
        }
    }

    async fn handle_line(&self, line: &str, pairing: &mut Option<QrPairing>) -> Flow {
        if line.is_empty() {
            return Flow::Continue;
        }

        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match head {
            "/link" => {
                if pairing.is_none() {
                    println!("Already linked.");
                    return Flow::Continue;
                }
                match rest.parse::<JID>() {
                    Ok(jid) if jid.is_direct_chat() => {
                        *pairing = None;
                        let artifact = SessionArtifact::new(jid, &self.device_name, &self.device);
                        self.become_ready(Some(artifact)).await
                    }
                    _ => {
                        println!("Usage: /link <number>@c.us");
                        Flow::Continue
                    }
                }
            }
            "/contact" => {
                let (jid, name) = rest.split_once(' ').unwrap_or((rest, ""));
                match jid.parse::<JID>() {
                    Ok(jid) if !name.trim().is_empty() => {
                        self.state
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .contacts
                            .insert(jid.to_non_device(), name.trim().to_string());
                    }
                    _ => println!("Usage: /contact <jid> <push name>"),
                }
                Flow::Continue
            }
            "/disconnect" => self.disconnect(DisconnectReason::ServerRequested).await,
            "/logout" => {
                if let Err(e) = SessionArtifact::remove(&self.session_path) {
                    warn!("Failed to remove session file: {}", e);
                }
                self.disconnect(DisconnectReason::LoggedOut).await
            }
            from => {
                if pairing.is_some() {
                    println!("Not linked yet. Scan the QR code with /link <jid>.");
                    return Flow::Continue;
                }
                let body = (!rest.is_empty()).then(|| rest.to_string());
                if self
                    .emit(SessionEvent::Message(IncomingMessage::new(from, body)))
                    .await
                {
                    Flow::Continue
                } else {
                    Flow::Stop
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Supervisor;
    use crate::config::BotConfig;
    use crate::context::AppContext;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::{mpsc, watch};

    struct CountingFactory {
        inner: ConsoleClientFactory,
        created: AtomicUsize,
    }

    impl ClientFactory for CountingFactory {
        type Client = ConsoleClient;

        fn create(&self) -> Result<ConsoleClient, ClientError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            self.inner.create()
        }
    }

    fn client_with_input(path: PathBuf, script: &str) -> ConsoleClient {
        let input = console_input(Cursor::new(script.as_bytes().to_vec()));
        ConsoleClientFactory::new(path, "test-device", input)
            .create()
            .unwrap()
    }

    async fn collect(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    async fn take(rx: &mut mpsc::Receiver<SessionEvent>, count: usize) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while events.len() < count {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Some(event)) => events.push(event),
                other => panic!("expected {} events, got {:?} then {:?}", count, events, other),
            }
        }
        events
    }

    fn linked_session(path: &std::path::Path) {
        let jid: JID = "34611111111@c.us".parse().unwrap();
        SessionArtifact::new(jid, "test-device", &LinkedDevice::generate())
            .store(path)
            .unwrap();
    }

    #[tokio::test]
    async fn test_pairing_then_messages() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_with_input(
            dir.path().join("session.json"),
            "34600000000@c.us hola\n/link 34611111111@c.us\n/contact 34622222222@c.us Ana López\n34622222222@c.us hola\n34622222222@c.us\n",
        );
        let (tx, mut rx) = mpsc::channel(16);
        client.initialize(tx).await.unwrap();
        let events = take(&mut rx, 5).await;

        assert!(matches!(events[0], SessionEvent::Qr(_)));
        assert!(matches!(&events[1], SessionEvent::Authenticated(Some(a)) if a.jid.user == "34611111111"));
        assert!(matches!(events[2], SessionEvent::Ready));
        match &events[3] {
            SessionEvent::Message(msg) => {
                assert_eq!(msg.from, "34622222222@c.us");
                assert_eq!(msg.body.as_deref(), Some("hola"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(&events[4], SessionEvent::Message(msg) if msg.body.is_none()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        let jid: JID = "34622222222@c.us".parse().unwrap();
        assert_eq!(client.contact(&jid).await.unwrap().first_name(), "Ana");
        assert_eq!(
            client.chat(&jid).await.unwrap().name.as_deref(),
            Some("Ana López")
        );
        assert!(client.send_message(&jid, "hi").await.is_ok());
    }

    #[tokio::test]
    async fn test_stored_session_skips_qr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let jid: JID = "34611111111@c.us".parse().unwrap();
        SessionArtifact::new(jid, "test-device", &LinkedDevice::generate())
            .store(&path)
            .unwrap();

        let client = client_with_input(path, "/disconnect\n");
        let (tx, mut rx) = mpsc::channel(16);
        client.initialize(tx).await.unwrap();
        let events = collect(&mut rx).await;

        assert!(matches!(events[0], SessionEvent::Authenticated(None)));
        assert!(matches!(events[1], SessionEvent::Ready));
        assert!(matches!(
            &events[2],
            SessionEvent::Disconnected(DisconnectReason::ServerRequested)
        ));
    }

    #[tokio::test]
    async fn test_logout_removes_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let jid: JID = "34611111111@c.us".parse().unwrap();
        SessionArtifact::new(jid, "test-device", &LinkedDevice::generate())
            .store(&path)
            .unwrap();

        let client = client_with_input(path.clone(), "/logout\n");
        let (tx, mut rx) = mpsc::channel(16);
        client.initialize(tx).await.unwrap();
        let events = collect(&mut rx).await;

        assert!(matches!(
            events.last(),
            Some(SessionEvent::Disconnected(DisconnectReason::LoggedOut))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_calls_before_ready_fail() {
        let dir = tempfile::tempdir().unwrap();
        let client = client_with_input(dir.path().join("session.json"), "");
        let jid: JID = "34622222222@c.us".parse().unwrap();
        assert!(matches!(
            client.send_message(&jid, "hi").await,
            Err(ClientError::NotReady)
        ));

        client.destroy().await;
        assert!(matches!(client.chat(&jid).await, Err(ClientError::Destroyed)));
        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(
            client.initialize(tx).await,
            Err(ClientError::Destroyed)
        ));
    }

    #[tokio::test]
    async fn test_linked_session_stays_open_after_input_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        linked_session(&path);

        let client = client_with_input(path, "");
        let (tx, mut rx) = mpsc::channel(16);
        client.initialize(tx).await.unwrap();

        let events = take(&mut rx, 2).await;
        assert!(matches!(events[0], SessionEvent::Authenticated(None)));
        assert!(matches!(events[1], SessionEvent::Ready));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        let jid: JID = "34622222222@c.us".parse().unwrap();
        assert!(client.send_message(&jid, "hi").await.is_ok());

        client.destroy().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_input_does_not_restart_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        linked_session(&path);

        let factory = Arc::new(CountingFactory {
            inner: ConsoleClientFactory::new(
                path,
                "test-device",
                console_input(Cursor::new(Vec::new())),
            ),
            created: AtomicUsize::new(0),
        });
        let ctx = AppContext::new(
            BotConfig::default()
                .with_reconnect_delay(Duration::ZERO)
                .with_init_retry_delay(Duration::ZERO),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Supervisor::new(factory.clone(), ctx, shutdown_rx).run());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
