//! Reconciliation: the server snapshot always wins.
//!
//! Polling replaces push here. Each poll fetches the room list and hands
//! it to [`reconcile`], a pure function from (local state, snapshot) to
//! the next local state. Optimistic predictions are a bridge until the
//! next snapshot, never something to merge.

use roomlink_protocol::{Room, RoomCode, RoomStatus};

use crate::LobbyState;

/// What a reconciliation pass did to the local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No current room; nothing to reconcile.
    NoRoom,
    /// The current room was replaced by the fetched copy.
    Replaced,
    /// Like `Replaced`, and the fetched room went from waiting to active:
    /// the host started the game and this client should launch it.
    GameStarted,
    /// The current room is gone from the snapshot and was cleared.
    Removed(RoomCode),
    /// The fetch failed; local state was left untouched.
    FetchFailed,
}

impl ReconcileOutcome {
    /// Returns `true` if the pass changed which room (if any) this client
    /// is in, or its status.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::GameStarted | Self::Removed(_))
    }
}

/// Computes the next local state from a fetched room list.
///
/// - No current room: state unchanged, [`ReconcileOutcome::NoRoom`].
/// - Current code present in `snapshot`: the room is replaced wholesale
///   and `is_ready_local` resynced from this player's fetched entry.
/// - Current code absent: the room is cleared and
///   [`ReconcileOutcome::Removed`] returned. A second pass over the same
///   snapshot then reports `NoRoom`, so removal is surfaced once.
pub fn reconcile(
    local: &LobbyState,
    snapshot: &[Room],
) -> (LobbyState, ReconcileOutcome) {
    let Some(current) = &local.current_room else {
        return (local.clone(), ReconcileOutcome::NoRoom);
    };

    let Some(fetched) =
        snapshot.iter().find(|r| r.room_code == current.room_code)
    else {
        let next = LobbyState {
            current_room: None,
            player_name: local.player_name.clone(),
            is_ready_local: false,
        };
        return (next, ReconcileOutcome::Removed(current.room_code.clone()));
    };

    let started = current.status == RoomStatus::Waiting
        && fetched.status == RoomStatus::Active;
    let next = LobbyState {
        current_room: Some(fetched.clone()),
        player_name: local.player_name.clone(),
        is_ready_local: fetched
            .player(&local.player_name)
            .is_some_and(|p| p.is_ready),
    };
    let outcome = if started {
        ReconcileOutcome::GameStarted
    } else {
        ReconcileOutcome::Replaced
    };
    (next, outcome)
}
