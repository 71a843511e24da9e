//! Room server configuration.

use roomlink_protocol::RoomCode;

/// Configuration for an in-process room server.
#[derive(Debug, Clone)]
pub struct RoomServerConfig {
    /// Smallest `max_players` a room may be created with. A room of one
    /// can never pass the ready-check.
    pub min_players: usize,

    /// Largest `max_players` a room may be created with.
    pub max_players_limit: usize,

    /// Codes handed out, in order, before falling back to random codes.
    /// Lets tests and demos predict a room's code. A scripted code that
    /// collides with a live room is skipped.
    pub scripted_codes: Vec<RoomCode>,

    /// Capacity of the server's command channel. Callers wait when it
    /// is full.
    pub channel_size: usize,
}

impl Default for RoomServerConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players_limit: 8,
            scripted_codes: Vec::new(),
            channel_size: 64,
        }
    }
}

impl RoomServerConfig {
    /// Default config that hands out `codes` first.
    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            scripted_codes: codes.into_iter().map(RoomCode::new).collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_server_config_default() {
        let config = RoomServerConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players_limit, 8);
        assert!(config.scripted_codes.is_empty());
    }

    #[test]
    fn test_with_codes_normalizes() {
        let config = RoomServerConfig::with_codes(["abc123", "XYZ789"]);
        assert_eq!(
            config.scripted_codes,
            vec![RoomCode::new("ABC123"), RoomCode::new("XYZ789")]
        );
    }
}
