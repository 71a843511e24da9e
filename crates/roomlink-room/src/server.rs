//! Room server actor: an isolated Tokio task that owns the registry.
//!
//! The server runs in its own task and talks to the outside world
//! through an mpsc channel. This is the "actor model": no shared mutable
//! state, just message passing. Each [`LocalRoomService`] is one client's
//! view of the server and implements [`RoomService`], so the lobby core
//! runs against it exactly as it runs against the HTTP API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use roomlink_protocol::{
    Ack, CreateRoomRequest, GameType, JoinRoomRequest, ReadyResponse, Room,
    RoomCode, ScoreResponse,
};
use roomlink_transport::{RoomService, ServiceError};
use tokio::sync::{mpsc, oneshot};

use crate::{ClientId, RoomError, RoomRegistry, RoomServerConfig};

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to the room server through its channel.
///
/// The `oneshot::Sender` in each variant is a "reply channel": the
/// caller sends a command and waits for the response on it.
enum ServerCommand {
    List {
        game_type: Option<GameType>,
        reply: oneshot::Sender<Vec<Room>>,
    },
    Get {
        code: RoomCode,
        reply: Reply<Room>,
    },
    Create {
        caller: ClientId,
        request: CreateRoomRequest,
        reply: Reply<Room>,
    },
    Join {
        caller: ClientId,
        code: RoomCode,
        request: JoinRoomRequest,
        reply: Reply<Room>,
    },
    Ready {
        caller: ClientId,
        code: RoomCode,
        ready: bool,
        reply: Reply<ReadyResponse>,
    },
    Leave {
        caller: ClientId,
        code: RoomCode,
        reply: Reply<Ack>,
    },
    Start {
        caller: ClientId,
        code: RoomCode,
        reply: Reply<Ack>,
    },
    Score {
        caller: ClientId,
        code: RoomCode,
        score: u32,
        reply: Reply<ScoreResponse>,
    },
    Shutdown,
}

/// The internal server state. Runs inside a Tokio task.
struct RoomServer {
    registry: RoomRegistry,
    receiver: mpsc::Receiver<ServerCommand>,
}

impl RoomServer {
    /// Runs the actor loop, processing commands until shutdown or until
    /// every handle is dropped.
    async fn run(mut self) {
        tracing::info!("room server started");

        while let Some(cmd) = self.receiver.recv().await {
            let reg = &mut self.registry;
            // A dropped reply receiver means the caller gave up waiting;
            // the mutation still stands.
            match cmd {
                ServerCommand::List { game_type, reply } => {
                    let _ = reply.send(reg.list(game_type));
                }
                ServerCommand::Get { code, reply } => {
                    let _ = reply.send(reg.get(&code));
                }
                ServerCommand::Create {
                    caller,
                    request,
                    reply,
                } => {
                    let _ = reply.send(reg.create(caller, &request));
                }
                ServerCommand::Join {
                    caller,
                    code,
                    request,
                    reply,
                } => {
                    let _ = reply.send(reg.join(caller, &code, &request));
                }
                ServerCommand::Ready {
                    caller,
                    code,
                    ready,
                    reply,
                } => {
                    let _ = reply.send(reg.set_ready(caller, &code, ready));
                }
                ServerCommand::Leave {
                    caller,
                    code,
                    reply,
                } => {
                    let _ = reply.send(reg.leave(caller, &code));
                }
                ServerCommand::Start {
                    caller,
                    code,
                    reply,
                } => {
                    let _ = reply.send(reg.start(caller, &code));
                }
                ServerCommand::Score {
                    caller,
                    code,
                    score,
                    reply,
                } => {
                    let _ = reply.send(reg.submit_score(caller, &code, score));
                }
                ServerCommand::Shutdown => {
                    tracing::info!("room server shutting down");
                    break;
                }
            }
        }

        tracing::info!(rooms = self.registry.room_count(), "room server stopped");
    }
}

/// Handle to a running room server.
///
/// Cheap to clone: it's an `mpsc::Sender` plus a shared id counter.
#[derive(Clone)]
pub struct RoomServerHandle {
    sender: mpsc::Sender<ServerCommand>,
    next_client: Arc<AtomicU64>,
}

impl RoomServerHandle {
    /// Registers a new client and returns its service view. Each client
    /// gets a distinct [`ClientId`], like each device logging in with its
    /// own token.
    pub fn connect(&self) -> LocalRoomService {
        let client_id = ClientId(self.next_client.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%client_id, "client connected to room server");
        LocalRoomService {
            client_id,
            sender: self.sender.clone(),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Tells the server to stop. Pending commands queued before this one
    /// are still answered.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(ServerCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// Spawns a room server task and returns a handle to it.
///
/// `config.channel_size` controls backpressure: if the channel fills up,
/// senders wait (bounded channel).
pub fn spawn_room_server(config: RoomServerConfig) -> RoomServerHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let server = RoomServer {
        registry: RoomRegistry::new(config),
        receiver: rx,
    };

    tokio::spawn(server.run());

    RoomServerHandle {
        sender: tx,
        next_client: Arc::new(AtomicU64::new(1)),
    }
}

/// One client's connection to an in-process room server.
///
/// Clones share the client identity and the offline switch, so a test
/// can keep a clone to flip connectivity while the lobby owns another.
#[derive(Clone)]
pub struct LocalRoomService {
    client_id: ClientId,
    sender: mpsc::Sender<ServerCommand>,
    offline: Arc<AtomicBool>,
}

impl LocalRoomService {
    /// This client's identity on the server.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Simulates losing (or regaining) connectivity. While offline every
    /// call fails with [`ServiceError::Network`] without reaching the
    /// server.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Whether the offline switch is on.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    /// Sends a command built around a fresh reply channel and awaits the
    /// answer.
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ServerCommand,
    ) -> Result<T, ServiceError> {
        if self.is_offline() {
            return Err(ServiceError::Network("client is offline".to_string()));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| ServiceError::from(RoomError::Unavailable))?;
        reply_rx
            .await
            .map_err(|_| ServiceError::from(RoomError::Unavailable))
    }
}

impl RoomService for LocalRoomService {
    async fn list_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<Room>, ServiceError> {
        self.call(|reply| ServerCommand::List { game_type, reply }).await
    }

    async fn get_room(&self, code: &RoomCode) -> Result<Room, ServiceError> {
        let code = code.clone();
        Ok(self.call(|reply| ServerCommand::Get { code, reply }).await??)
    }

    async fn create_room(
        &self,
        request: &CreateRoomRequest,
    ) -> Result<Room, ServiceError> {
        let caller = self.client_id;
        let request = request.clone();
        Ok(self
            .call(|reply| ServerCommand::Create {
                caller,
                request,
                reply,
            })
            .await??)
    }

    async fn join_room(
        &self,
        code: &RoomCode,
        request: &JoinRoomRequest,
    ) -> Result<Room, ServiceError> {
        let caller = self.client_id;
        let code = code.clone();
        let request = request.clone();
        Ok(self
            .call(|reply| ServerCommand::Join {
                caller,
                code,
                request,
                reply,
            })
            .await??)
    }

    async fn set_ready(
        &self,
        code: &RoomCode,
        ready: bool,
    ) -> Result<ReadyResponse, ServiceError> {
        let caller = self.client_id;
        let code = code.clone();
        Ok(self
            .call(|reply| ServerCommand::Ready {
                caller,
                code,
                ready,
                reply,
            })
            .await??)
    }

    async fn leave_room(&self, code: &RoomCode) -> Result<Ack, ServiceError> {
        let caller = self.client_id;
        let code = code.clone();
        Ok(self
            .call(|reply| ServerCommand::Leave {
                caller,
                code,
                reply,
            })
            .await??)
    }

    async fn start_game(&self, code: &RoomCode) -> Result<Ack, ServiceError> {
        let caller = self.client_id;
        let code = code.clone();
        Ok(self
            .call(|reply| ServerCommand::Start {
                caller,
                code,
                reply,
            })
            .await??)
    }

    async fn submit_score(
        &self,
        code: &RoomCode,
        score: u32,
    ) -> Result<ScoreResponse, ServiceError> {
        let caller = self.client_id;
        let code = code.clone();
        Ok(self
            .call(|reply| ServerCommand::Score {
                caller,
                code,
                score,
                reply,
            })
            .await??)
    }
}
