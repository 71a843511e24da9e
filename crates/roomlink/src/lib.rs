//! # roomlink
//!
//! Poll-driven lobby core for small multiplayer mini-game rooms.
//!
//! Clients agree on room membership, per-player ready state and the
//! moment a game may start, using periodic polling against a room
//! service instead of a persistent connection. Local mutations are
//! applied optimistically, rolled back on failure, and overwritten by
//! the next server snapshot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomlink::prelude::*;
//!
//! # async fn demo() -> Result<(), LobbyError> {
//! roomlink::init_tracing();
//! let lobby = Lobby::connect(LobbyConfig::from_env())?;
//!
//! let rooms = lobby.list_waiting_rooms(Some(GameType::Quiz)).await;
//! if let Some(room) = rooms.first() {
//!     lobby.join_room(room.room_code.as_str(), "Bob").await?;
//!     lobby.set_ready(true).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod directory;
mod error;
mod launch;
mod lobby;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL, LobbyConfig,
    LobbyConfigBuilder, MAX_PAGE_SIZE,
};
pub use directory::list_waiting_rooms;
pub use error::{ErrorKind, LobbyError};
pub use launch::{LaunchOutcome, MiniGameEngine, run_mini_game};
pub use lobby::Lobby;

pub use roomlink_protocol::{
    GameMode, GameType, Player, Ranking, Room, RoomCode, RoomStatus,
};
pub use roomlink_session::{
    ClientPhase, LobbyState, ReadyOutcome, ReconcileOutcome,
};

/// Installs a `tracing` subscriber that honors `RUST_LOG` and defaults
/// to `info`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Everything a lobby client usually needs.
pub mod prelude {
    pub use crate::{
        ClientPhase, ErrorKind, GameMode, GameType, LaunchOutcome, Lobby,
        LobbyConfig, LobbyError, LobbyState, MiniGameEngine, ReadyOutcome,
        ReconcileOutcome, Room, RoomCode, RoomStatus, run_mini_game,
    };
    pub use roomlink_room::{
        LocalRoomService, RoomServerConfig, RoomServerHandle, spawn_room_server,
    };
    pub use roomlink_transport::{HttpRoomService, RoomService, ServiceError};
}
