//! Unified error type for the roomlink lobby.

use roomlink_protocol::GameType;
use roomlink_room::RoomError;
use roomlink_session::SessionError;
use roomlink_transport::ServiceError;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stale or invalid room code. Recoverable: pick another room.
    NotFound,
    /// Room is full. Recoverable: pick another room.
    Capacity,
    /// The room is in the wrong state (game started, already in a room).
    StateConflict,
    /// Timeout or connectivity. Recoverable: retry later.
    TransientNetwork,
    /// Bad input, caught before any network call.
    Validation,
    /// Anything else.
    Other,
}

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roomlink` crate you deal with this single error type
/// instead of importing errors from each sub-crate. `#[from]` on each
/// variant lets `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// A room service error (HTTP status, connectivity).
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A session-level error (validation, join failures, rollback).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An error from the in-process room server.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// No mini-game engine handles this game type.
    #[error("no engine for game type {0}")]
    UnsupportedGame(GameType),
}

impl LobbyError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Service(e) => service_kind(e),
            Self::Session(e) => match e {
                SessionError::Validation(_) | SessionError::NoCurrentRoom => {
                    ErrorKind::Validation
                }
                SessionError::AlreadyInRoom(_)
                | SessionError::GameAlreadyStarted(_) => {
                    ErrorKind::StateConflict
                }
                SessionError::RoomNotFound(_) => ErrorKind::NotFound,
                SessionError::RoomFull(_) => ErrorKind::Capacity,
                SessionError::Network(_) => ErrorKind::TransientNetwork,
                SessionError::RoomCreate(e)
                | SessionError::ReadyRejected(e)
                | SessionError::Service(e) => service_kind(e),
            },
            Self::Room(e) => match e {
                RoomError::NotFound(_)
                | RoomError::NotInRoom(..)
                | RoomError::NotHost(_) => ErrorKind::NotFound,
                RoomError::RoomFull(_) => ErrorKind::Capacity,
                RoomError::GameAlreadyStarted(_)
                | RoomError::GameNotRunning(_)
                | RoomError::AlreadyInRoom(..)
                | RoomError::NotAllReady { .. } => ErrorKind::StateConflict,
                RoomError::NameTaken(_) | RoomError::InvalidRequest(_) => {
                    ErrorKind::Validation
                }
                RoomError::Unavailable => ErrorKind::TransientNetwork,
            },
            Self::UnsupportedGame(_) => ErrorKind::Other,
        }
    }

    /// Returns `true` if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientNetwork
    }

    /// A short message suitable for showing to a player.
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(SessionError::Validation(msg)) => {
                capitalize(msg)
            }
            Self::Session(SessionError::AlreadyInRoom(code)) => {
                format!("You are already in room {code}. Leave it first.")
            }
            Self::Session(SessionError::NoCurrentRoom) => {
                "You are not in a room.".to_string()
            }
            Self::Session(SessionError::RoomCreate(_))
                if !self.is_transient() =>
            {
                "Could not create the room.".to_string()
            }
            Self::Session(SessionError::ReadyRejected(_))
                if !self.is_transient() =>
            {
                "Your ready status could not be saved.".to_string()
            }
            Self::Room(RoomError::AlreadyInRoom(_, code)) => {
                format!("You are already in room {code}. Leave it first.")
            }
            Self::Room(RoomError::NotAllReady { ready, total }) => {
                format!("Not everyone is ready yet ({ready}/{total}).")
            }
            Self::Room(RoomError::NotHost(_)) => {
                "Only the host can start the game.".to_string()
            }
            Self::Room(RoomError::GameNotRunning(_)) => {
                "That game is not running.".to_string()
            }
            Self::UnsupportedGame(game) => {
                format!("The {game} game is not available on this device.")
            }
            _ => match self.kind() {
                ErrorKind::NotFound => {
                    "Room not found. Check the code and try again.".to_string()
                }
                ErrorKind::Capacity => "That room is full.".to_string(),
                ErrorKind::StateConflict if self.mentions_started_game() => {
                    "That game has already started.".to_string()
                }
                ErrorKind::StateConflict => {
                    "That room can't do that right now.".to_string()
                }
                ErrorKind::TransientNetwork => {
                    "Connection problem. Please try again.".to_string()
                }
                ErrorKind::Validation => capitalize(&self.to_string()),
                ErrorKind::Other => "Something went wrong.".to_string(),
            },
        }
    }
}

impl LobbyError {
    fn mentions_started_game(&self) -> bool {
        match self {
            Self::Session(SessionError::GameAlreadyStarted(_))
            | Self::Room(RoomError::GameAlreadyStarted(_)) => true,
            Self::Session(SessionError::AlreadyInRoom(_))
            | Self::Room(_) => false,
            other => other.to_string().to_lowercase().contains("already started"),
        }
    }
}

fn service_kind(err: &ServiceError) -> ErrorKind {
    match err {
        ServiceError::NotFound(_) => ErrorKind::NotFound,
        ServiceError::Capacity(_) => ErrorKind::Capacity,
        ServiceError::StateConflict(_) => ErrorKind::StateConflict,
        ServiceError::Network(_) => ErrorKind::TransientNetwork,
        ServiceError::InvalidUrl(_) => ErrorKind::Validation,
        ServiceError::Unauthorized(_)
        | ServiceError::Rejected { .. }
        | ServiceError::Protocol(_) => ErrorKind::Other,
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
