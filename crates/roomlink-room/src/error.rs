//! Error types for the room layer.

use roomlink_protocol::RoomCode;
use roomlink_transport::ServiceError;

use crate::ClientId;

/// Errors that can occur during room operations.
///
/// Display strings match the messages the room REST API puts in its
/// `{ "error": ... }` bodies, so a client sees the same text whether it
/// talks to the HTTP service or to this in-process one.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No non-finished room has this code.
    #[error("Room not found")]
    NotFound(RoomCode),

    /// No more player slots available.
    #[error("Room is full")]
    RoomFull(RoomCode),

    /// The room left the waiting state.
    #[error("Game already started")]
    GameAlreadyStarted(RoomCode),

    /// The client already belongs to a room.
    #[error("Already in room {1}")]
    AlreadyInRoom(ClientId, RoomCode),

    /// The client is not a member of this room.
    #[error("Player not found in room {1}")]
    NotInRoom(ClientId, RoomCode),

    /// Another member already uses this display name.
    #[error("Player name `{0}` is already taken")]
    NameTaken(String),

    /// Score submitted while no game is running in the room.
    #[error("Game session not found")]
    GameNotRunning(RoomCode),

    /// Only the host may start the game.
    #[error("Room not found or you are not the host")]
    NotHost(RoomCode),

    /// Start requested before every player was ready.
    #[error("Not all players are ready. {ready}/{total} players ready.")]
    NotAllReady { ready: usize, total: usize },

    /// Malformed request (empty name, bad player limit, ...).
    #[error("{0}")]
    InvalidRequest(String),

    /// The room server task is gone.
    #[error("room server is unavailable")]
    Unavailable,
}

impl From<RoomError> for ServiceError {
    fn from(err: RoomError) -> Self {
        let message = err.to_string();
        match err {
            RoomError::NotFound(_) => ServiceError::NotFound(message),
            RoomError::RoomFull(_) => ServiceError::Capacity(message),
            RoomError::GameAlreadyStarted(_) | RoomError::GameNotRunning(_) => {
                ServiceError::StateConflict(message)
            }
            RoomError::NotHost(_) => ServiceError::NotFound(message),
            RoomError::Unavailable => ServiceError::Network(message),
            RoomError::NotInRoom(..) => ServiceError::NotFound(message),
            RoomError::AlreadyInRoom(..)
            | RoomError::NameTaken(_)
            | RoomError::NotAllReady { .. }
            | RoomError::InvalidRequest(_) => ServiceError::Rejected {
                status: 400,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_service_error_keeps_taxonomy() {
        let code = RoomCode::new("ABC123");
        assert!(matches!(
            ServiceError::from(RoomError::NotFound(code.clone())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RoomError::RoomFull(code.clone())),
            ServiceError::Capacity(_)
        ));
        assert!(matches!(
            ServiceError::from(RoomError::GameAlreadyStarted(code)),
            ServiceError::StateConflict(_)
        ));
        assert!(ServiceError::from(RoomError::Unavailable).is_transient());
    }

    #[test]
    fn test_messages_match_rest_api() {
        let code = RoomCode::new("ABC123");
        assert_eq!(RoomError::RoomFull(code.clone()).to_string(), "Room is full");
        assert_eq!(RoomError::NotFound(code).to_string(), "Room not found");
    }
}
