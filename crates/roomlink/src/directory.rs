//! Room directory: the read-only list of rooms a player may join.

use roomlink_protocol::{GameType, Room};
use roomlink_transport::RoomService;
use tracing::{debug, warn};

/// Lists joinable rooms, newest first as the service orders them.
///
/// Keeps only `waiting` rooms of the requested game type (re-checked
/// here, since a service may ignore the filter) and returns at most
/// `page_size` of them. Never fails: if the fetch fails the error is
/// logged and the list is empty.
pub async fn list_waiting_rooms<S: RoomService>(
    service: &S,
    game_type: Option<GameType>,
    page_size: usize,
) -> Vec<Room> {
    let rooms = match service.list_rooms(game_type).await {
        Ok(rooms) => rooms,
        Err(e) => {
            warn!(?game_type, error = %e, "room listing failed");
            return Vec::new();
        }
    };

    let fetched = rooms.len();
    let waiting: Vec<Room> = rooms
        .into_iter()
        .filter(|r| r.status.is_joinable())
        .filter(|r| game_type.is_none_or(|t| r.game_type == t))
        .take(page_size)
        .collect();
    debug!(fetched, listed = waiting.len(), ?game_type, "rooms listed");
    waiting
}
