//! Core protocol types for the room service's wire format.
//!
//! Every type here travels "on the wire": it is serialized to JSON by one
//! side of the room REST API and deserialized by the other. Field names
//! match the JSON keys exactly (`room_code`, `is_ready`, ...), so most
//! structs need no serde renaming at all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short, shareable token that identifies a room among all
/// non-finished rooms (e.g. `"ABC123"`).
///
/// This is a newtype wrapper around `String`. Codes typed by a human are
/// normalized on construction: surrounding whitespace is dropped and the
/// letters are uppercased, so `" abc123 "` and `"ABC123"` name the same
/// room.
///
/// `#[serde(transparent)]` makes a `RoomCode` serialize as the bare
/// string, not as `{ "0": "ABC123" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Length of codes generated by the room service.
    pub const LEN: usize = 6;

    /// Creates a normalized room code.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the code is empty after normalization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// ---------------------------------------------------------------------------
// Game catalogue
// ---------------------------------------------------------------------------

/// Which mini-game a room will launch once everyone is ready.
///
/// `rename_all = "lowercase"` maps `GameType::Quiz` to `"quiz"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Quiz,
    Guess,
    Math,
    Word,
}

impl GameType {
    /// All game types, in catalogue order.
    pub const ALL: [GameType; 4] =
        [GameType::Quiz, GameType::Guess, GameType::Math, GameType::Word];

    /// The wire name, also used in the `?game_type=` query filter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Guess => "guess",
            Self::Math => "math",
            Self::Word => "word",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(format!("unknown game type `{s}`"))
            })
    }
}

/// How the room was opened. Informational only; the lobby treats every
/// mode the same way.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Quick,
    #[default]
    Friend,
    Tournament,
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Server-side lifecycle of a room.
///
/// ```text
/// Waiting → Active → Finished
/// ```
///
/// The original backend reports a started room as `"playing"`; the
/// `alias` lets both spellings decode to [`RoomStatus::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Accepting joins; players toggle their ready flag.
    Waiting,
    /// The host started the mini-game.
    #[serde(alias = "playing")]
    Active,
    /// Game over or room closed. Finished rooms are never listed.
    Finished,
}

impl RoomStatus {
    /// Returns `true` if new players may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player & Room
// ---------------------------------------------------------------------------

/// One member of a room.
///
/// There is deliberately no `is_host` field here: host status is derived
/// from [`Room::host_name`], so it can never disagree with the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within the room.
    pub player_name: String,
    /// Ready-check flag.
    #[serde(default)]
    pub is_ready: bool,
    /// Last submitted mini-game score.
    #[serde(default)]
    pub score: u32,
}

impl Player {
    /// A fresh, not-ready player.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            is_ready: false,
            score: 0,
        }
    }
}

/// A server-tracked lobby grouping players before a mini-game.
///
/// Unknown JSON fields (`created_at`, `host_user_id`, ...) are ignored on
/// decode, so the struct tolerates richer server payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Opaque server id.
    pub id: String,
    /// Shareable code.
    pub room_code: RoomCode,
    pub game_type: GameType,
    #[serde(default)]
    pub game_mode: GameMode,
    /// Name of the player holding the start privilege.
    pub host_name: String,
    pub max_players: usize,
    pub current_players: usize,
    pub status: RoomStatus,
    /// Members in join order.
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Room {
    /// Returns `true` if `player_name` is this room's host.
    pub fn is_host(&self, player_name: &str) -> bool {
        self.host_name == player_name
    }

    /// Looks up a member by name.
    pub fn player(&self, player_name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_name == player_name)
    }

    /// Mutable lookup by name.
    pub fn player_mut(&mut self, player_name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_name == player_name)
    }

    /// Number of members with the ready flag set.
    pub fn ready_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_ready).count()
    }

    /// The ready-check: at least two players and every one of them ready.
    pub fn all_ready(&self) -> bool {
        self.current_players >= 2 && self.players.iter().all(|p| p.is_ready)
    }

    /// Returns `true` if no more players can join.
    pub fn is_full(&self) -> bool {
        self.current_players >= self.max_players
    }

    /// Checks the structural invariants of a room snapshot.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] naming the first violated
    /// invariant.
    pub fn check_invariants(&self) -> Result<(), ProtocolError> {
        if self.current_players != self.players.len() {
            return Err(ProtocolError::InvalidMessage(format!(
                "room {}: current_players={} but {} players listed",
                self.room_code,
                self.current_players,
                self.players.len()
            )));
        }
        if self.current_players > self.max_players {
            return Err(ProtocolError::InvalidMessage(format!(
                "room {}: {} players exceeds max_players={}",
                self.room_code, self.current_players, self.max_players
            )));
        }
        let hosts = self
            .players
            .iter()
            .filter(|p| self.is_host(&p.player_name))
            .count();
        if hosts != 1 {
            return Err(ProtocolError::InvalidMessage(format!(
                "room {}: expected exactly one host, found {hosts}",
                self.room_code
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// `GET /rooms` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<Room>,
    #[serde(default, rename = "totalRooms", skip_serializing_if = "Option::is_none")]
    pub total_rooms: Option<usize>,
}

/// `POST /rooms` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub game_type: GameType,
    pub game_mode: GameMode,
    pub player_name: String,
    pub max_players: usize,
}

/// `POST /rooms/{code}/join` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub player_name: String,
}

/// `POST /rooms/{code}/ready` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyRequest {
    pub ready: bool,
}

/// `POST /rooms/{code}/ready` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub all_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

/// Acknowledgement returned by `leave` and `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_players: Option<usize>,
}

/// `POST /rooms/{code}/score` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub score: u32,
}

/// One line of the final standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub rank: usize,
    pub player_name: String,
    pub score: u32,
}

/// `POST /rooms/{code}/score` response. `final_results` is present once
/// every player has submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScoreResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_results: Option<Vec<Ranking>>,
}

/// Body of every non-2xx response: `{ "error": "Room is full" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
