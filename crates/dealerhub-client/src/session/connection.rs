//! One authenticated realtime session and its reconnect loop.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dealerhub_realtime::message::{
    ConnectedUser, ErrorCode, InboundMessage, OutboundMessage, RealtimeEvent,
};
use dealerhub_realtime::room::role_rooms;

use super::status::{ConnectionStatus, SessionSnapshot};
use crate::bus::{ClientEvent, EventBus, HandlerError, Subscription};
use crate::cache::ReadModelCache;
use crate::error::ConnectionError;
use crate::profile::TransportProfile;
use crate::transport::{Connector, Transport};

#[derive(Debug)]
enum Command {
    Join(String),
    Leave(String),
    Send(InboundMessage),
    Retry,
    Shutdown,
}

struct Shared {
    identity: ConnectedUser,
    profile: TransportProfile,
    baseline_rooms: Vec<String>,
    bus: Arc<EventBus>,
    cache: Arc<ReadModelCache>,
    state: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        self.state.send_modify(f);
    }

    fn status(&self) -> ConnectionStatus {
        self.state.borrow().status
    }

    /// Baseline rooms, the role's rooms, and every room joined before.
    fn rooms_to_join(&self) -> BTreeSet<String> {
        let mut rooms: BTreeSet<String> = self.baseline_rooms.iter().cloned().collect();
        rooms.extend(role_rooms(self.identity.role).iter().map(|r| r.to_string()));
        rooms.extend(self.state.borrow().joined_rooms.iter().cloned());
        rooms
    }

    fn handle_message(&self, message: OutboundMessage) {
        match message {
            OutboundMessage::Authenticated { connected_users }
            | OutboundMessage::ConnectedUsersUpdated { connected_users } => {
                self.update(|s| s.connected_users = connected_users);
            }
            OutboundMessage::RoomJoined { room } => {
                self.update(|s| {
                    s.joined_rooms.insert(room);
                });
            }
            OutboundMessage::RoomLeft { room } => {
                self.update(|s| {
                    s.joined_rooms.remove(&room);
                });
            }
            OutboundMessage::Event {
                event,
                data,
                user_id,
                username,
                timestamp,
                room,
            } => self.dispatch(ClientEvent {
                event,
                data,
                user_id,
                username,
                timestamp,
                room,
            }),
            OutboundMessage::Pong => debug!(user_id = %self.identity.user_id, "Pong"),
            OutboundMessage::Error { code, message } => {
                warn!(
                    user_id = %self.identity.user_id,
                    code = %code,
                    message = %message,
                    "Server refused request"
                );
            }
        }
    }

    fn dispatch(&self, event: ClientEvent) {
        if let Some(resource) = event.event.resource() {
            self.cache.invalidate(resource);
        }
        self.bus.emit(&event);
    }
}

enum PumpExit {
    Shutdown,
    Lost(ConnectionError),
}

enum Step {
    Inbound(Option<Result<OutboundMessage, ConnectionError>>),
    Command(Option<Command>),
}

/// A realtime session for one identity.
///
/// A background task owns the transport: it connects, authenticates,
/// rejoins rooms, dispatches events, and reconnects with backoff until the
/// profile's attempts run out.
pub struct ConnectionSession {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("user_id", &self.shared.identity.user_id)
            .field("status", &self.shared.status())
            .finish_non_exhaustive()
    }
}

impl ConnectionSession {
    /// Start a session and its connection task.
    pub fn start(
        identity: ConnectedUser,
        profile: TransportProfile,
        connector: Arc<dyn Connector>,
        baseline_rooms: Vec<String>,
        bus: Arc<EventBus>,
        cache: Arc<ReadModelCache>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let shared = Arc::new(Shared {
            identity,
            profile,
            baseline_rooms,
            bus,
            cache,
            state,
        });
        let (commands, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(shared.clone(), connector, command_rx));

        Arc::new(Self {
            shared,
            commands,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn identity(&self) -> &ConnectedUser {
        &self.shared.identity
    }

    pub fn profile(&self) -> &TransportProfile {
        &self.shared.profile
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.shared.bus
    }

    pub fn cache(&self) -> &Arc<ReadModelCache> {
        &self.shared.cache
    }

    /// Register a local handler for a server event.
    pub fn subscribe<F>(&self, event: RealtimeEvent, handler: F) -> Subscription
    where
        F: Fn(&ClientEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(event, handler)
    }

    /// Ask to join a room. Does nothing unless connected.
    pub fn join_room(&self, room: &str) -> bool {
        self.command_when_connected(Command::Join(room.to_string()))
    }

    /// Leave a room; it is not rejoined on reconnect. Does nothing unless
    /// connected.
    pub fn leave_room(&self, room: &str) -> bool {
        self.command_when_connected(Command::Leave(room.to_string()))
    }

    /// Send a raw message. Does nothing unless connected.
    pub fn send(&self, message: InboundMessage) -> bool {
        self.command_when_connected(Command::Send(message))
    }

    /// Start over after attempts ran out. Only valid in `Error`.
    pub fn retry(&self) -> bool {
        self.status() == ConnectionStatus::Error && self.commands.send(Command::Retry).is_ok()
    }

    /// Close the connection and stop the task.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(user_id = %self.shared.identity.user_id, error = %e, "Session task failed");
            }
        }
    }

    fn command_when_connected(&self, command: Command) -> bool {
        if self.status() != ConnectionStatus::Connected {
            debug!(user_id = %self.shared.identity.user_id, ?command, "Not connected, ignoring");
            return false;
        }
        self.commands.send(command).is_ok()
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}

async fn run(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let user_id = shared.identity.user_id;
    let max_attempts = shared.profile.max_attempts;
    let mut attempt: u32 = 0;

    loop {
        if attempt == 0 {
            shared.update(|s| {
                s.status = ConnectionStatus::Connecting;
                s.reconnect_attempts = 0;
            });
        }

        let established = tokio::select! {
            result = establish(&shared, connector.as_ref()) => result,
            _ = wait_for_shutdown(&mut commands) => break,
        };

        let error = match established {
            Ok(mut transport) => {
                info!(user_id = %user_id, "Realtime session connected");
                attempt = 0;
                shared.update(|s| {
                    s.status = ConnectionStatus::Connected;
                    s.reconnect_attempts = 0;
                    s.last_error = None;
                });
                match pump(&shared, transport.as_mut(), &mut commands).await {
                    PumpExit::Shutdown => {
                        transport.close().await;
                        break;
                    }
                    PumpExit::Lost(error) => {
                        transport.close().await;
                        shared.update(|s| s.connected_users.clear());
                        error
                    }
                }
            }
            Err(error) => error,
        };

        warn!(user_id = %user_id, attempt, error = %error, "Realtime connection failed");
        shared.update(|s| s.last_error = Some(error));

        if attempt >= max_attempts {
            shared.update(|s| s.status = ConnectionStatus::Error);
            warn!(user_id = %user_id, attempts = attempt, "Giving up until retry");
            if wait_for_retry(&mut commands).await {
                attempt = 0;
                continue;
            }
            break;
        }

        attempt += 1;
        shared.update(|s| {
            s.status = ConnectionStatus::Reconnecting;
            s.reconnect_attempts = attempt;
        });

        let delay = shared.profile.backoff(attempt);
        debug!(user_id = %user_id, attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_for_shutdown(&mut commands) => break,
        }
    }

    shared.update(|s| {
        s.status = ConnectionStatus::Disconnected;
        s.connected_users.clear();
    });
    info!(user_id = %user_id, "Realtime session closed");
}

/// Connect, authenticate, and rejoin rooms.
async fn establish(
    shared: &Shared,
    connector: &dyn Connector,
) -> Result<Box<dyn Transport>, ConnectionError> {
    let profile = &shared.profile;
    let mut transport = tokio::time::timeout(profile.connect_timeout, connector.connect(profile))
        .await
        .map_err(|_| ConnectionError::Timeout { stage: "connect" })??;

    let authenticated = authenticate(shared, transport.as_mut()).await;

    let connected_users = match authenticated {
        Ok(users) => users,
        Err(e) => {
            transport.close().await;
            return Err(e);
        }
    };
    shared.update(|s| s.connected_users = connected_users);

    for room in shared.rooms_to_join() {
        if let Err(e) = transport.send(&InboundMessage::JoinRoom { room }).await {
            transport.close().await;
            return Err(e);
        }
    }

    Ok(transport)
}

async fn authenticate(
    shared: &Shared,
    transport: &mut dyn Transport,
) -> Result<Vec<ConnectedUser>, ConnectionError> {
    transport
        .send(&InboundMessage::Authenticate {
            user_id: shared.identity.user_id,
            username: shared.identity.username.clone(),
            role: shared.identity.role,
        })
        .await?;
    tokio::time::timeout(shared.profile.auth_timeout, await_authenticated(transport))
        .await
        .map_err(|_| ConnectionError::Timeout {
            stage: "authenticate",
        })?
}

async fn await_authenticated(
    transport: &mut dyn Transport,
) -> Result<Vec<ConnectedUser>, ConnectionError> {
    loop {
        match transport.recv().await {
            Some(Ok(OutboundMessage::Authenticated { connected_users })) => {
                return Ok(connected_users);
            }
            Some(Ok(OutboundMessage::Error {
                code: ErrorCode::AuthenticationRejected | ErrorCode::AuthenticationTimeout,
                message,
            })) => return Err(ConnectionError::AuthenticationRejected(message)),
            Some(Ok(other)) => debug!(?other, "Ignoring message before authentication"),
            Some(Err(e)) => return Err(e),
            None => {
                return Err(ConnectionError::Closed(
                    "closed before authentication".to_string(),
                ));
            }
        }
    }
}

async fn pump(
    shared: &Shared,
    transport: &mut dyn Transport,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> PumpExit {
    loop {
        let step = tokio::select! {
            message = transport.recv() => Step::Inbound(message),
            command = commands.recv() => Step::Command(command),
        };

        let outgoing = match step {
            Step::Inbound(Some(Ok(message))) => {
                shared.handle_message(message);
                continue;
            }
            Step::Inbound(Some(Err(e))) => return PumpExit::Lost(e),
            Step::Inbound(None) => {
                return PumpExit::Lost(ConnectionError::Closed(
                    "server closed the connection".to_string(),
                ));
            }
            Step::Command(None | Some(Command::Shutdown)) => return PumpExit::Shutdown,
            Step::Command(Some(Command::Retry)) => continue,
            Step::Command(Some(Command::Join(room))) => InboundMessage::JoinRoom { room },
            Step::Command(Some(Command::Leave(room))) => {
                shared.update(|s| {
                    s.joined_rooms.remove(&room);
                });
                InboundMessage::LeaveRoom { room }
            }
            Step::Command(Some(Command::Send(message))) => message,
        };

        if let Err(e) = transport.send(&outgoing).await {
            return PumpExit::Lost(e);
        }
    }
}

/// Resolves once shutdown is requested or the session handle is gone.
async fn wait_for_shutdown(commands: &mut mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        if matches!(command, Command::Shutdown) {
            return;
        }
    }
}

/// `true` on retry, `false` on shutdown.
async fn wait_for_retry(commands: &mut mpsc::UnboundedReceiver<Command>) -> bool {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Retry => return true,
            Command::Shutdown => return false,
            _ => {}
        }
    }
    false
}
