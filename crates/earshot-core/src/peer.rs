//! Async peer driver.
//!
//! A [`Peer`] owns one [`Session`], one [`Link`] half, and a message store,
//! and runs the event loop tying them together: link events feed the
//! session, session outputs feed the link and the store, caller commands
//! arrive over a channel. Everything runs on a single tokio task, so chunks
//! and commands are processed to completion in arrival order and the
//! session never sees two packets concurrently.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use earshot_link::{Link, LinkError, LinkEvent};

use crate::error::Error;
use crate::framer::split_payload;
use crate::message::Message;
use crate::session::{Role, Session, SessionOutput};
use crate::store::MessageStore;

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

/// Peer identity and pacing configuration.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Display name sent in every packet.
    pub name: String,
    /// Which side of the link this peer drives.
    pub role: Role,
    /// Pause between consecutive chunks of one payload. A throughput-safety
    /// margin for slow links, not a correctness requirement.
    pub chunk_delay: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            name: "anonymous".to_string(),
            role: Role::Host,
            chunk_delay: Duration::from_millis(20),
        }
    }
}

/// Notification surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A message entered the log (local echo, remote chat, system, error).
    Message(Message),
    /// Connectivity or protocol status text.
    Status(String),
    /// The peer task finished; no further events follow.
    Stopped,
}

enum PeerCommand {
    SendMessage(String),
    SendHandshake,
    SendPing,
    Disconnect,
}

/// Store handle shared between the peer task and the caller.
pub type SharedStore = Arc<Mutex<dyn MessageStore>>;

fn lock_store(store: &Mutex<dyn MessageStore>) -> MutexGuard<'_, dyn MessageStore + 'static> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running peer task.
pub struct Peer {
    commands: mpsc::Sender<PeerCommand>,
    events: mpsc::Receiver<PeerEvent>,
    store: SharedStore,
    handle: JoinHandle<()>,
}

impl Peer {
    /// Initialize a session over `link` and spawn its event loop.
    ///
    /// Inbound [`LinkEvent`]s are read from `link_events`; every message the
    /// session produces is appended to `store` before it is surfaced as a
    /// [`PeerEvent`].
    ///
    /// # Errors
    ///
    /// Returns a session error if initialization fails.
    pub fn spawn<L, S>(
        link: L,
        link_events: mpsc::Receiver<LinkEvent>,
        store: S,
        config: PeerConfig,
    ) -> Result<Self, Error>
    where
        L: Link + 'static,
        S: MessageStore + 'static,
    {
        let PeerConfig { name, role, chunk_delay } = config;

        let mut session = Session::new();
        session.init(name, role)?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let store: SharedStore = Arc::new(Mutex::new(store));

        let task = PeerTask {
            session,
            link,
            link_events,
            commands: command_rx,
            events: event_tx,
            store: Arc::clone(&store),
            chunk_delay,
        };
        let handle = tokio::spawn(task.run());

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            store,
            handle,
        })
    }

    /// Queue a chat message for sending.
    ///
    /// # Errors
    ///
    /// Returns a link error if the peer task has stopped.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), Error> {
        self.command(PeerCommand::SendMessage(text.into())).await
    }

    /// Initiate the key handshake.
    ///
    /// # Errors
    ///
    /// Returns a link error if the peer task has stopped.
    pub async fn send_handshake(&self) -> Result<(), Error> {
        self.command(PeerCommand::SendHandshake).await
    }

    /// Send a liveness probe.
    ///
    /// # Errors
    ///
    /// Returns a link error if the peer task has stopped.
    pub async fn send_ping(&self) -> Result<(), Error> {
        self.command(PeerCommand::SendPing).await
    }

    /// Tear down the session and stop the peer task.
    ///
    /// # Errors
    ///
    /// Returns a link error if the peer task has already stopped.
    pub async fn disconnect(&self) -> Result<(), Error> {
        self.command(PeerCommand::Disconnect).await
    }

    async fn command(&self, command: PeerCommand) -> Result<(), Error> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::Link(LinkError::Closed))
    }

    /// Receive the next notification, or `None` after [`PeerEvent::Stopped`].
    pub async fn next_event(&mut self) -> Option<PeerEvent> {
        self.events.recv().await
    }

    /// Snapshot of the stored message history, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock_store(&self.store).load_all()
    }

    /// Wipe the stored message history.
    pub fn clear_messages(&self) {
        lock_store(&self.store).clear();
    }

    /// Disconnect and wait for the peer task to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(PeerCommand::Disconnect).await;
        let _ = self.handle.await;
    }
}

struct PeerTask<L: Link> {
    session: Session,
    link: L,
    link_events: mpsc::Receiver<LinkEvent>,
    commands: mpsc::Receiver<PeerCommand>,
    events: mpsc::Sender<PeerEvent>,
    store: SharedStore,
    chunk_delay: Duration,
}

impl<L: Link> PeerTask<L> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        let stop = matches!(command, PeerCommand::Disconnect);
                        let outputs = self.apply_command(command);
                        self.execute(outputs).await;
                        if stop {
                            break;
                        }
                    }
                    // Handle dropped; tear down like a disconnect.
                    None => {
                        let outputs = self.session.disconnect();
                        self.execute(outputs).await;
                        break;
                    }
                },
                event = self.link_events.recv() => match event {
                    Some(LinkEvent::Chunk(chunk)) => {
                        let outputs = self.session.on_chunk(&chunk);
                        self.execute(outputs).await;
                    }
                    Some(LinkEvent::Status(status)) => {
                        let outputs = self.session.on_link_status(&status);
                        self.execute(outputs).await;
                    }
                    Some(LinkEvent::Closed) | None => {
                        let outputs = self.session.on_link_closed();
                        self.execute(outputs).await;
                        break;
                    }
                },
            }
        }

        let _ = self.link.close().await;
        let _ = self.events.send(PeerEvent::Stopped).await;
    }

    fn apply_command(&mut self, command: PeerCommand) -> Vec<SessionOutput> {
        let result = match command {
            PeerCommand::SendMessage(text) => self.session.send_message(&text),
            PeerCommand::SendHandshake => self.session.send_handshake(false),
            PeerCommand::SendPing => self.session.send_ping(),
            PeerCommand::Disconnect => Ok(self.session.disconnect()),
        };
        match result {
            Ok(outputs) => outputs,
            Err(e) => {
                tracing::warn!(error = %e, "command rejected");
                Vec::new()
            }
        }
    }

    async fn execute(&mut self, outputs: Vec<SessionOutput>) {
        for output in outputs {
            match output {
                SessionOutput::Send(line) => {
                    if let Err(e) = self.send_paced(&line).await {
                        tracing::warn!(error = %e, "link send failed");
                        let _ = self
                            .events
                            .send(PeerEvent::Status(format!("send failed: {e}")))
                            .await;
                    }
                }
                SessionOutput::Message(message) => {
                    lock_store(&self.store).save(message.clone());
                    let _ = self.events.send(PeerEvent::Message(message)).await;
                }
                SessionOutput::Status(status) => {
                    let _ = self.events.send(PeerEvent::Status(status)).await;
                }
            }
        }
    }

    /// Transmit one payload as MTU-sized chunks, pausing between chunks.
    async fn send_paced(&self, line: &str) -> Result<(), LinkError> {
        for (i, chunk) in split_payload(line, self.link.mtu()).iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.chunk_delay).await;
            }
            self.link.send(chunk).await?;
        }
        Ok(())
    }
}
