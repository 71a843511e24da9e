//! In-process room service for roomlink.
//!
//! The real room service lives behind an HTTP API. This crate provides an
//! authoritative stand-in that runs as an isolated Tokio task (actor
//! model), so the lobby core can be exercised end to end by several
//! clients without a network: in tests, demos, and offline play.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: the server's synchronous room state and rules
//! - [`spawn_room_server`] / [`RoomServerHandle`]: run the registry in a task
//! - [`LocalRoomService`]: one client's [`RoomService`](roomlink_transport::RoomService) view
//! - [`RoomServerConfig`]: player limits, scripted room codes

mod config;
mod error;
mod registry;
mod server;

pub use config::RoomServerConfig;
pub use error::RoomError;
pub use registry::{ClientId, RoomRegistry};
pub use server::{LocalRoomService, RoomServerHandle, spawn_room_server};
