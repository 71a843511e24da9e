//! Room service abstraction for roomlink.
//!
//! Provides the [`RoomService`] trait that abstracts over the room
//! service's REST surface, so the lobby core can run against the real
//! HTTP API or an in-process implementation without changes.
//!
//! # Feature Flags
//!
//! - `http` (default): HTTP/JSON client via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::ServiceError;
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpRoomService};

use roomlink_protocol::{
    Ack, CreateRoomRequest, GameType, JoinRoomRequest, ReadyResponse, Room,
    RoomCode, ScoreResponse,
};

/// The consumed room API.
///
/// Every method is one independent request. Implementations identify the
/// caller out of band (a bearer token for HTTP, a bound client id for the
/// in-process service), which is why `set_ready` and `leave_room` carry no
/// player name.
pub trait RoomService: Send + Sync + 'static {
    /// `GET /rooms`: every non-finished room, optionally filtered by game.
    async fn list_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<Room>, ServiceError>;

    /// `GET /rooms/{code}`.
    async fn get_room(&self, code: &RoomCode) -> Result<Room, ServiceError>;

    /// `POST /rooms`. The creator is auto-joined as a not-ready host.
    async fn create_room(
        &self,
        request: &CreateRoomRequest,
    ) -> Result<Room, ServiceError>;

    /// `POST /rooms/{code}/join`.
    async fn join_room(
        &self,
        code: &RoomCode,
        request: &JoinRoomRequest,
    ) -> Result<Room, ServiceError>;

    /// `POST /rooms/{code}/ready`.
    async fn set_ready(
        &self,
        code: &RoomCode,
        ready: bool,
    ) -> Result<ReadyResponse, ServiceError>;

    /// `POST /rooms/{code}/leave`.
    async fn leave_room(&self, code: &RoomCode) -> Result<Ack, ServiceError>;

    /// `POST /rooms/{code}/start`.
    async fn start_game(&self, code: &RoomCode) -> Result<Ack, ServiceError>;

    /// `POST /rooms/{code}/score`.
    async fn submit_score(
        &self,
        code: &RoomCode,
        score: u32,
    ) -> Result<ScoreResponse, ServiceError>;
}
