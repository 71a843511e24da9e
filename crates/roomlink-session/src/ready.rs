//! The ready-state coordinator: optimistic toggle with rollback.
//!
//! Toggling ready is a three-step protocol:
//!
//! 1. **Snapshot**: record the player's `is_ready` and `is_ready_local`.
//! 2. **Apply**: write the new flag locally, before any round trip.
//! 3. **Commit or revert**: persist it; on failure restore the snapshot.
//!
//! If the room vanished between apply and commit (a concurrent leave or
//! reconciliation miss), the network call is skipped and there is
//! nothing to roll back.

use roomlink_protocol::RoomCode;
use roomlink_transport::RoomService;
use tracing::{debug, warn};

use crate::{LobbyState, SessionController, SessionError};

/// The pre-mutation values a failed ready toggle restores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySnapshot {
    /// Room the toggle was issued in.
    pub room_code: RoomCode,
    /// This player's `is_ready` in the room, if the player was listed.
    pub player_is_ready: Option<bool>,
    pub is_ready_local: bool,
}

impl ReadySnapshot {
    /// Captures the ready fields of `state`, or `None` without a room.
    pub fn capture(state: &LobbyState) -> Option<Self> {
        let room = state.current_room.as_ref()?;
        Some(Self {
            room_code: room.room_code.clone(),
            player_is_ready: room
                .player(&state.player_name)
                .map(|p| p.is_ready),
            is_ready_local: state.is_ready_local,
        })
    }

    /// Writes the snapshot back into `state`.
    ///
    /// Only applies while `state` is still in the snapshot's room; returns
    /// whether anything changed.
    pub fn restore(&self, state: &mut LobbyState) -> bool {
        let player_name = state.player_name.clone();
        let Some(room) = state
            .current_room
            .as_mut()
            .filter(|r| r.room_code == self.room_code)
        else {
            return false;
        };

        let mut changed = false;
        if let (Some(was), Some(player)) =
            (self.player_is_ready, room.player_mut(&player_name))
        {
            changed |= player.is_ready != was;
            player.is_ready = was;
        }
        changed |= state.is_ready_local != self.is_ready_local;
        state.is_ready_local = self.is_ready_local;
        changed
    }
}

/// Sets the ready flag locally. Returns whether anything changed.
fn apply_ready(state: &mut LobbyState, ready: bool) -> bool {
    let player_name = state.player_name.clone();
    let mut changed = state.is_ready_local != ready;
    state.is_ready_local = ready;
    if let Some(player) = state
        .current_room
        .as_mut()
        .and_then(|r| r.player_mut(&player_name))
    {
        changed |= player.is_ready != ready;
        player.is_ready = ready;
    }
    changed
}

/// Result of a ready toggle that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The server accepted the flag. `all_ready` is the server's verdict
    /// at that moment; it is reported, not stored.
    Committed { all_ready: bool },
    /// The room went away before the call was made; nothing was sent.
    Abandoned,
}

impl<S: RoomService> SessionController<S> {
    /// Toggles this player's ready flag optimistically.
    ///
    /// Observers see the new flag immediately. Calling twice with the same
    /// value leaves the same state as calling once.
    ///
    /// # Errors
    /// - [`SessionError::NoCurrentRoom`]: nothing to toggle, nothing changed
    /// - [`SessionError::ReadyRejected`]: the call failed and both flags
    ///   were restored to their values from before this call
    pub async fn set_ready(
        &self,
        ready: bool,
    ) -> Result<ReadyOutcome, SessionError> {
        // Steps 1 and 2 happen under one borrow of the cell.
        let mut snapshot = None;
        self.state.send_if_modified(|s| {
            snapshot = ReadySnapshot::capture(s);
            snapshot.is_some() && apply_ready(s, ready)
        });
        let snapshot = snapshot.ok_or(SessionError::NoCurrentRoom)?;

        // Give an already-queued leave or reconciliation the chance to
        // land before anything is sent.
        tokio::task::yield_now().await;

        if self.state.borrow().room_code() != Some(&snapshot.room_code) {
            debug!(
                room_code = %snapshot.room_code,
                ready,
                "room changed before ready call, abandoning"
            );
            return Ok(ReadyOutcome::Abandoned);
        }

        match self.service.set_ready(&snapshot.room_code, ready).await {
            Ok(resp) => {
                debug!(
                    room_code = %snapshot.room_code,
                    ready,
                    all_ready = resp.all_ready,
                    "ready committed"
                );
                Ok(ReadyOutcome::Committed {
                    all_ready: resp.all_ready,
                })
            }
            Err(e) => {
                self.state.send_if_modified(|s| snapshot.restore(s));
                warn!(
                    room_code = %snapshot.room_code,
                    ready,
                    error = %e,
                    "ready call failed, rolled back"
                );
                Err(SessionError::ReadyRejected(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use roomlink_protocol::{GameMode, GameType, Player, Room, RoomStatus};

    use super::*;

    fn state(players: &[(&str, bool)], me: &str, ready_local: bool) -> LobbyState {
        LobbyState {
            current_room: Some(Room {
                id: "r-1".into(),
                room_code: RoomCode::new("ABC123"),
                game_type: GameType::Quiz,
                game_mode: GameMode::Friend,
                host_name: players[0].0.into(),
                max_players: 2,
                current_players: players.len(),
                status: RoomStatus::Waiting,
                players: players
                    .iter()
                    .map(|(name, ready)| Player {
                        is_ready: *ready,
                        ..Player::new(*name)
                    })
                    .collect(),
            }),
            player_name: me.into(),
            is_ready_local: ready_local,
        }
    }

    #[test]
    fn test_capture_without_room_is_none() {
        assert_eq!(ReadySnapshot::capture(&LobbyState::new("Alice")), None);
    }

    #[test]
    fn test_apply_then_restore_is_exact() {
        let before = state(&[("Alice", false), ("Bob", true)], "Alice", false);
        let snap = ReadySnapshot::capture(&before).unwrap();

        let mut s = before.clone();
        assert!(apply_ready(&mut s, true));
        assert!(s.is_ready_local);
        assert!(s.all_ready());

        assert!(snap.restore(&mut s));
        assert_eq!(s, before);
    }

    #[test]
    fn test_apply_same_value_is_noop() {
        let mut s = state(&[("Alice", true)], "Alice", true);
        let before = s.clone();
        assert!(!apply_ready(&mut s, true));
        assert_eq!(s, before);
    }

    #[test]
    fn test_restore_skips_other_room() {
        let before = state(&[("Alice", false)], "Alice", false);
        let snap = ReadySnapshot::capture(&before).unwrap();

        let mut moved = state(&[("Alice", true)], "Alice", true);
        if let Some(room) = moved.current_room.as_mut() {
            room.room_code = RoomCode::new("ZZZ999");
        }
        let expected = moved.clone();
        assert!(!snap.restore(&mut moved));
        assert_eq!(moved, expected);
    }

    #[test]
    fn test_restore_without_room_is_noop() {
        let snap = ReadySnapshot::capture(&state(&[("Alice", false)], "Alice", false)).unwrap();
        let mut empty = LobbyState::new("Alice");
        assert!(!snap.restore(&mut empty));
        assert_eq!(empty, LobbyState::new("Alice"));
    }
}
