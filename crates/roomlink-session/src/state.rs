//! The lobby state cell: what this client believes about its room.
//!
//! `LobbyState` is a plain value. The controller keeps it inside a
//! `watch` channel so that UI code can observe every change, but only the
//! controller ever writes to it.

use roomlink_protocol::{Room, RoomCode, RoomStatus};

// ---------------------------------------------------------------------------
// ClientPhase
// ---------------------------------------------------------------------------

/// Where this client is in the lobby lifecycle.
///
/// ```text
///   NoRoom ──(create/join)──→ Waiting ──(host start)──→ Active
///     ↑                          │                        │
///     └──(leave / room gone)─────┘                        │
///     └────────────(game complete)────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Not in any room.
    NoRoom,
    /// In a waiting room, either as its host or as a guest.
    Waiting { host: bool },
    /// The room's mini-game is running.
    Active,
}

// ---------------------------------------------------------------------------
// LobbyState
// ---------------------------------------------------------------------------

/// The single, explicitly-owned lobby state of one client.
///
/// `is_host` and `all_ready` are deliberately *not* fields: they are
/// recomputed from `current_room` and `player_name` on every read, so
/// they can never go stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyState {
    /// The room this client belongs to, as last predicted or fetched.
    pub current_room: Option<Room>,
    /// This client's display name inside rooms.
    pub player_name: String,
    /// Optimistic mirror of this player's ready flag.
    pub is_ready_local: bool,
}

impl LobbyState {
    /// Empty state for a client that will use `player_name`.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Default::default()
        }
    }

    /// Code of the current room, if any.
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.current_room.as_ref().map(|r| &r.room_code)
    }

    /// Returns `true` if this client is the current room's host.
    pub fn is_host(&self) -> bool {
        self.current_room
            .as_ref()
            .is_some_and(|r| r.is_host(&self.player_name))
    }

    /// Returns `true` if the current room passes the ready-check.
    pub fn all_ready(&self) -> bool {
        self.current_room.as_ref().is_some_and(Room::all_ready)
    }

    /// Lifecycle phase derived from the current room.
    pub fn phase(&self) -> ClientPhase {
        match &self.current_room {
            None => ClientPhase::NoRoom,
            Some(room) => match room.status {
                RoomStatus::Waiting => ClientPhase::Waiting {
                    host: room.is_host(&self.player_name),
                },
                RoomStatus::Active => ClientPhase::Active,
                RoomStatus::Finished => ClientPhase::NoRoom,
            },
        }
    }

    /// Puts this client into `room` with a fresh ready flag taken from
    /// the room's own player entry.
    pub(crate) fn enter(&mut self, room: Room, player_name: String) {
        self.is_ready_local = room
            .player(&player_name)
            .is_some_and(|p| p.is_ready);
        self.player_name = player_name;
        self.current_room = Some(room);
    }

    /// Drops the current room. Returns its code if there was one.
    pub(crate) fn clear(&mut self) -> Option<RoomCode> {
        self.is_ready_local = false;
        self.current_room.take().map(|r| r.room_code)
    }
}
