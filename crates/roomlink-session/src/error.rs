//! Error types for the session layer.

use roomlink_protocol::RoomCode;
use roomlink_transport::ServiceError;

/// Errors returned by [`SessionController`](crate::SessionController)
/// operations.
///
/// Join failures get their own variants so callers can branch on the
/// kind ("pick another room" vs "try again") instead of a message.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Input rejected before any network call (empty name, bad size...).
    #[error("invalid input: {0}")]
    Validation(String),

    /// This client already belongs to a room. A client owns at most one.
    #[error("already in room {0}")]
    AlreadyInRoom(RoomCode),

    /// The operation needs a current room and there is none.
    #[error("not in a room")]
    NoCurrentRoom,

    /// The service could not create the room.
    #[error("could not create room: {0}")]
    RoomCreate(#[source] ServiceError),

    /// The code is stale or was never valid.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room has no free seat.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The host already started the game in this room.
    #[error("game in room {0} already started")]
    GameAlreadyStarted(RoomCode),

    /// Timeout or lost connectivity.
    #[error("network error: {0}")]
    Network(#[source] ServiceError),

    /// The ready change did not persist; local state was rolled back.
    #[error("ready change rejected: {0}")]
    ReadyRejected(#[source] ServiceError),

    /// Any other refusal from the room service.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SessionError {
    /// Maps a failed join onto the join-specific variants.
    pub(crate) fn from_join(code: &RoomCode, err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => Self::RoomNotFound(code.clone()),
            ServiceError::Capacity(_) => Self::RoomFull(code.clone()),
            ServiceError::StateConflict(_) => {
                Self::GameAlreadyStarted(code.clone())
            }
            err if err.is_transient() => Self::Network(err),
            err => Self::Service(err),
        }
    }

    /// Returns `true` if retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::RoomCreate(e) | Self::ReadyRejected(e) | Self::Service(e) => {
                e.is_transient()
            }
            _ => false,
        }
    }
}
