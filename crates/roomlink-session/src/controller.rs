//! The room session controller: create, join, leave, reconcile.
//!
//! The controller is the only writer of the [`LobbyState`] cell. Every
//! method takes `&self`: state changes go through the `watch` sender,
//! which never holds its lock across an `.await`, so calls may overlap
//! freely on one task (e.g. under `tokio::join!`).

use roomlink_protocol::{
    CreateRoomRequest, GameMode, GameType, JoinRoomRequest, Room, RoomCode,
    RoomStatus,
};
use roomlink_transport::RoomService;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{LobbyState, ReconcileOutcome, SessionError, reconcile};

/// Owns one client's lobby state and drives it through a [`RoomService`].
pub struct SessionController<S> {
    pub(crate) service: S,
    pub(crate) state: watch::Sender<LobbyState>,
}

impl<S: RoomService> SessionController<S> {
    /// Creates a controller for a client that is in no room yet.
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: watch::Sender::new(LobbyState::default()),
        }
    }

    /// The underlying room service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<LobbyState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn state(&self) -> LobbyState {
        self.state.borrow().clone()
    }

    /// Code of the current room, if any.
    pub fn room_code(&self) -> Option<RoomCode> {
        self.state.borrow().room_code().cloned()
    }

    // -----------------------------------------------------------------
    // Create / join
    // -----------------------------------------------------------------

    /// Opens a new room with this client as host.
    ///
    /// # Errors
    /// - [`SessionError::Validation`]: blank name or fewer than 2 seats
    /// - [`SessionError::AlreadyInRoom`]: leave the current room first
    /// - [`SessionError::RoomCreate`]: the service refused or was unreachable
    pub async fn create_room(
        &self,
        game_type: GameType,
        game_mode: GameMode,
        player_name: &str,
        max_players: usize,
    ) -> Result<Room, SessionError> {
        let player_name = validate_name(player_name)?;
        if max_players < 2 {
            return Err(SessionError::Validation(format!(
                "max_players must be at least 2, got {max_players}"
            )));
        }
        self.ensure_no_room()?;

        let request = CreateRoomRequest {
            game_type,
            game_mode,
            player_name: player_name.clone(),
            max_players,
        };
        let room = self
            .service
            .create_room(&request)
            .await
            .map_err(|e| {
                warn!(player = %player_name, error = %e, "create room failed");
                SessionError::RoomCreate(e)
            })?;

        info!(
            room_code = %room.room_code,
            player = %player_name,
            %game_type,
            "room created"
        );
        self.state
            .send_modify(|s| s.enter(room.clone(), player_name));
        Ok(room)
    }

    /// Joins an existing room by its shareable code.
    ///
    /// The code is normalized (trimmed, uppercased) before use.
    ///
    /// # Errors
    /// [`SessionError::RoomNotFound`], [`SessionError::RoomFull`] and
    /// [`SessionError::GameAlreadyStarted`] are distinct so callers can
    /// branch on them; transient failures are [`SessionError::Network`].
    pub async fn join_room(
        &self,
        room_code: &str,
        player_name: &str,
    ) -> Result<Room, SessionError> {
        let code = RoomCode::new(room_code);
        if code.is_empty() {
            return Err(SessionError::Validation(
                "room code must not be empty".into(),
            ));
        }
        let player_name = validate_name(player_name)?;
        self.ensure_no_room()?;

        let request = JoinRoomRequest {
            player_name: player_name.clone(),
        };
        let room = self
            .service
            .join_room(&code, &request)
            .await
            .map_err(|e| {
                warn!(room_code = %code, player = %player_name, error = %e, "join failed");
                SessionError::from_join(&code, e)
            })?;

        info!(
            room_code = %room.room_code,
            player = %player_name,
            players = room.current_players,
            "joined room"
        );
        self.state
            .send_modify(|s| s.enter(room.clone(), player_name));
        Ok(room)
    }

    // -----------------------------------------------------------------
    // Leave
    // -----------------------------------------------------------------

    /// Leaves the current room.
    ///
    /// Local state is cleared *before* the network call, and a failed
    /// call never re-attaches the room: leaving is final from this
    /// client's point of view. Returns the code that was left, or `None`
    /// if there was no room.
    pub async fn leave_room(&self) -> Option<RoomCode> {
        let mut left = None;
        self.state.send_if_modified(|s| {
            left = s.clear();
            left.is_some()
        });
        let code = left?;

        match self.service.leave_room(&code).await {
            Ok(_) => info!(room_code = %code, "left room"),
            Err(e) => {
                warn!(room_code = %code, error = %e, "leave call failed, staying out")
            }
        }
        Some(code)
    }

    // -----------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------

    /// Applies a fetched room list to the state cell.
    pub fn reconcile(&self, rooms: &[Room]) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::NoRoom;
        self.state.send_if_modified(|s| {
            let (next, o) = reconcile(s, rooms);
            outcome = o;
            if *s == next {
                return false;
            }
            *s = next;
            true
        });
        match &outcome {
            ReconcileOutcome::Removed(code) => {
                info!(room_code = %code, "room no longer listed, removed from room")
            }
            ReconcileOutcome::GameStarted => {
                info!(room_code = ?self.room_code(), "host started the game")
            }
            _ => {}
        }
        outcome
    }

    /// Fetches the room list and reconciles against it.
    ///
    /// Never fails: a failed fetch leaves state untouched and returns
    /// [`ReconcileOutcome::FetchFailed`].
    pub async fn sync(&self) -> ReconcileOutcome {
        if self.state.borrow().current_room.is_none() {
            return ReconcileOutcome::NoRoom;
        }
        match self.service.list_rooms(None).await {
            Ok(rooms) => self.reconcile(&rooms),
            Err(e) => {
                debug!(error = %e, "reconcile fetch failed, keeping local state");
                ReconcileOutcome::FetchFailed
            }
        }
    }

    // -----------------------------------------------------------------
    // Game lifecycle
    // -----------------------------------------------------------------

    /// Marks the current room active locally (Waiting → Active).
    ///
    /// Returns `false` if there is no room or it was not waiting.
    pub fn mark_active(&self) -> bool {
        self.state.send_if_modified(|s| match &mut s.current_room {
            Some(room) if room.status == RoomStatus::Waiting => {
                room.status = RoomStatus::Active;
                true
            }
            _ => false,
        })
    }

    /// Local game completion (Active → NoRoom). The server is not told.
    pub fn finish_game(&self) -> Option<RoomCode> {
        let mut finished = None;
        self.state.send_if_modified(|s| {
            finished = s.clear();
            finished.is_some()
        });
        if let Some(code) = &finished {
            debug!(room_code = %code, "game finished, back to no room");
        }
        finished
    }

    fn ensure_no_room(&self) -> Result<(), SessionError> {
        match self.state.borrow().room_code() {
            Some(code) => Err(SessionError::AlreadyInRoom(code.clone())),
            None => Ok(()),
        }
    }
}

fn validate_name(raw: &str) -> Result<String, SessionError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SessionError::Validation(
            "player name must not be empty".into(),
        ));
    }
    Ok(name.to_string())
}
