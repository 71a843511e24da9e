//! Wire protocol for the roomlink room service.
//!
//! This crate defines the "language" the lobby client and the room
//! service speak over HTTP/JSON:
//!
//! - **Types** ([`Room`], [`Player`], [`RoomStatus`], request and response
//!   bodies): the structures that travel in request and response bodies.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP or local state. It sits
//! below both the transport (which moves the bytes) and the session
//! (which decides what to do with a decoded [`Room`]).
//!
//! ```text
//! Transport (HTTP) → Protocol (Room, ReadyResponse, ...) → Session (LobbyState)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Ack, CreateRoomRequest, ErrorBody, GameMode, GameType, JoinRoomRequest,
    Player, Ranking, ReadyRequest, ReadyResponse, Room, RoomCode,
    RoomListResponse, RoomStatus, ScoreRequest, ScoreResponse,
};
