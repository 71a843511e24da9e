use roomlink_protocol::ProtocolError;

/// Errors returned by a [`RoomService`](crate::RoomService).
///
/// The variants follow the lobby's error taxonomy, so callers branch on
/// the kind of failure rather than on message text.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The room code is stale or was never valid.
    #[error("not found: {0}")]
    NotFound(String),

    /// The room has no free player slot.
    #[error("capacity exceeded: {0}")]
    Capacity(String),

    /// The room is no longer in a state that allows the operation,
    /// e.g. joining after the game started.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// The server rejected the caller's credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success response.
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Timeout, connectivity failure, or a 5xx. Worth retrying later.
    #[error("network error: {0}")]
    Network(String),

    /// The base URL or a path could not be turned into a request URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A body could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ServiceError {
    /// Maps an HTTP error status and the server's `error` message onto
    /// the taxonomy.
    ///
    /// The message is consulted before the status for 4xx responses
    /// because the room service reports "Room is full" and
    /// "Game already started" as plain 400s.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        match status {
            404 => Self::NotFound(message),
            401 | 403 => Self::Unauthorized(message),
            408 | 429 | 500..=599 => Self::Network(message),
            400..=499 if lower.contains("already started") => {
                Self::StateConflict(message)
            }
            400..=499 if lower.contains("full") => Self::Capacity(message),
            409 => Self::StateConflict(message),
            _ => Self::Rejected { status, message },
        }
    }

    /// Returns `true` for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_not_found() {
        let err = ServiceError::from_status(404, "Room not found");
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(err.to_string().contains("Room not found"));
    }

    #[test]
    fn test_from_status_full_room_is_capacity() {
        let err = ServiceError::from_status(400, "Room is full");
        assert!(matches!(err, ServiceError::Capacity(_)));
    }

    #[test]
    fn test_from_status_started_game_is_conflict() {
        let err = ServiceError::from_status(400, "Game already started");
        assert!(matches!(err, ServiceError::StateConflict(_)));
        let err = ServiceError::from_status(409, "room is active");
        assert!(matches!(err, ServiceError::StateConflict(_)));
    }

    #[test]
    fn test_from_status_auth_and_server_errors() {
        assert!(matches!(
            ServiceError::from_status(401, "Invalid token"),
            ServiceError::Unauthorized(_)
        ));
        let err = ServiceError::from_status(503, "Database error");
        assert!(matches!(err, ServiceError::Network(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_from_status_other_client_error_is_rejected() {
        let err = ServiceError::from_status(400, "Already in this room");
        assert!(matches!(err, ServiceError::Rejected { status: 400, .. }));
        assert!(!err.is_transient());
    }
}
