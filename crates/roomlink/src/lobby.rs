//! The `Lobby` facade: one client's entry point to the room system.
//!
//! Ties the layers together: directory listing over the room service,
//! session control and the ready-check from `roomlink-session`, the
//! poll-driven reconciliation loop on `roomlink-tick`, and the game
//! launch trigger.

use std::future::Future;

use roomlink_protocol::{GameMode, GameType, Room, RoomCode};
use roomlink_session::{
    ClientPhase, LobbyState, ReadyOutcome, ReconcileOutcome, SessionController,
    SessionError,
};
use roomlink_tick::PollScheduler;
use roomlink_transport::{HttpRoomService, RoomService};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    LaunchOutcome, LobbyConfig, LobbyError, MiniGameEngine, directory,
    run_mini_game,
};

/// A lobby client.
///
/// All methods take `&self`, so a UI can keep the poll loop running
/// while it issues mutations on the same task (e.g. with
/// `tokio::select!` or `tokio::join!`).
pub struct Lobby<S> {
    session: SessionController<S>,
    config: LobbyConfig,
    visible: watch::Sender<bool>,
}

impl Lobby<HttpRoomService> {
    /// Creates a lobby that talks to the room REST API described by
    /// `config`.
    ///
    /// # Errors
    /// Returns [`LobbyError::Service`] if the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn connect(config: LobbyConfig) -> Result<Self, LobbyError> {
        let config = config.validated();
        let service = HttpRoomService::new(config.http_config())?;
        info!(base_url = %config.base_url, "lobby connected");
        Ok(Self::new(service, config))
    }
}

impl<S: RoomService> Lobby<S> {
    /// Creates a lobby over any room service.
    pub fn new(service: S, config: LobbyConfig) -> Self {
        Self {
            session: SessionController::new(service),
            config: config.validated(),
            visible: watch::Sender::new(true),
        }
    }

    /// The lobby's configuration.
    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// The underlying room service.
    pub fn service(&self) -> &S {
        self.session.service()
    }

    // -----------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------

    /// A receiver that observes every change of the lobby state.
    pub fn subscribe(&self) -> watch::Receiver<LobbyState> {
        self.session.subscribe()
    }

    /// A copy of the current state.
    pub fn state(&self) -> LobbyState {
        self.session.state()
    }

    /// Returns `true` if this client hosts its current room.
    pub fn is_host(&self) -> bool {
        self.session.state().is_host()
    }

    /// Returns `true` if the current room passes the ready-check.
    pub fn all_ready(&self) -> bool {
        self.session.state().all_ready()
    }

    /// Where this client is in the lobby lifecycle.
    pub fn phase(&self) -> ClientPhase {
        self.session.state().phase()
    }

    // -----------------------------------------------------------------
    // Directory
    // -----------------------------------------------------------------

    /// Joinable rooms, capped to the configured page size. Never fails.
    pub async fn list_waiting_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Vec<Room> {
        directory::list_waiting_rooms(
            self.service(),
            game_type,
            self.config.page_size,
        )
        .await
    }

    // -----------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------

    /// Opens a room with this client as host, then reconciles.
    pub async fn create_room(
        &self,
        game_type: GameType,
        game_mode: GameMode,
        player_name: &str,
        max_players: usize,
    ) -> Result<Room, LobbyError> {
        let room = self
            .session
            .create_room(game_type, game_mode, player_name, max_players)
            .await?;
        self.refresh().await;
        Ok(room)
    }

    /// Joins a room by code, then reconciles.
    pub async fn join_room(
        &self,
        room_code: &str,
        player_name: &str,
    ) -> Result<Room, LobbyError> {
        let room = self.session.join_room(room_code, player_name).await?;
        self.refresh().await;
        Ok(room)
    }

    /// Leaves the current room. The local room is gone before this
    /// returns, whatever the service answers.
    pub async fn leave_room(&self) -> Option<RoomCode> {
        self.session.leave_room().await
    }

    /// Toggles the ready flag optimistically; reconciles after a commit.
    ///
    /// # Errors
    /// On failure the flag is already rolled back when the error is
    /// returned.
    pub async fn set_ready(
        &self,
        ready: bool,
    ) -> Result<ReadyOutcome, LobbyError> {
        let outcome = self.session.set_ready(ready).await?;
        if let ReadyOutcome::Committed { .. } = outcome {
            self.refresh().await;
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Reconciliation loop
    // -----------------------------------------------------------------

    /// One reconciliation pass: fetch, then let the server win.
    ///
    /// Never fails; a failed fetch leaves the state untouched.
    pub async fn refresh(&self) -> ReconcileOutcome {
        self.session.sync().await
    }

    /// Shows or hides the lobby screen. Interval polling only runs while
    /// the lobby is visible; becoming visible polls right away.
    pub fn set_lobby_visible(&self, visible: bool) {
        self.visible.send_if_modified(|v| {
            let changed = *v != visible;
            *v = visible;
            changed
        });
    }

    /// Returns `true` if the lobby screen is visible.
    pub fn is_lobby_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Polls on the configured interval until something happens to the
    /// current room.
    ///
    /// Returns the first [`ReconcileOutcome::GameStarted`] or
    /// [`ReconcileOutcome::Removed`] seen, or `None` once `shutdown`
    /// resolves. Polling pauses while the lobby is hidden.
    pub async fn run_poll_loop(
        &self,
        shutdown: impl Future<Output = ()>,
    ) -> Option<ReconcileOutcome> {
        let mut scheduler = PollScheduler::new(self.config.poll_config());
        let mut visible = self.visible.subscribe();
        if !*visible.borrow_and_update() {
            scheduler.pause();
        }
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!(polls = scheduler.poll_count(), "poll loop stopped");
                    return None;
                }
                changed = visible.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                    if *visible.borrow_and_update() {
                        scheduler.resume();
                    } else {
                        scheduler.pause();
                    }
                }
                info = scheduler.wait_for_poll() => {
                    let outcome = self.refresh().await;
                    debug!(poll = info.poll, ?outcome, "lobby poll");
                    if outcome.is_transition() {
                        return Some(outcome);
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Game launch
    // -----------------------------------------------------------------

    /// Host-side start: marks the room active, tells the service, then
    /// plays the game.
    ///
    /// Being host with everyone ready is the caller's precondition. It is
    /// only soft-checked here: a violation is logged and the start goes
    /// ahead, leaving enforcement to the service.
    ///
    /// # Errors
    /// [`SessionError::NoCurrentRoom`] without a room, or
    /// [`LobbyError::UnsupportedGame`] if `engine` cannot run the room's
    /// game.
    pub async fn start_game<E: MiniGameEngine>(
        &self,
        engine: &E,
    ) -> Result<LaunchOutcome, LobbyError> {
        let state = self.session.state();
        let Some(room) = state.current_room.as_ref() else {
            return Err(SessionError::NoCurrentRoom.into());
        };
        if !state.is_host() || !state.all_ready() {
            warn!(
                room_code = %room.room_code,
                is_host = state.is_host(),
                all_ready = state.all_ready(),
                "starting game without host/ready preconditions"
            );
        }

        self.session.mark_active();
        match self.service().start_game(&room.room_code).await {
            Ok(_) => info!(room_code = %room.room_code, "game started"),
            Err(e) => {
                warn!(room_code = %room.room_code, error = %e, "start call failed")
            }
        }
        self.play(engine).await
    }

    /// Guest-side launch: plays the game if the room went active.
    ///
    /// Call after [`run_poll_loop`](Self::run_poll_loop) or
    /// [`refresh`](Self::refresh) reported
    /// [`ReconcileOutcome::GameStarted`]. Returns `Ok(None)` if the room
    /// is not active.
    pub async fn launch_if_started<E: MiniGameEngine>(
        &self,
        engine: &E,
    ) -> Result<Option<LaunchOutcome>, LobbyError> {
        if self.phase() != ClientPhase::Active {
            return Ok(None);
        }
        self.play(engine).await.map(Some)
    }

    /// Runs the game for the current (active) room, submits the score
    /// best-effort and returns to no room.
    ///
    /// If the score is never accepted (no engine, start refused, submit
    /// failed), the service is told this client left, so its seat does
    /// not outlive the local game.
    async fn play<E: MiniGameEngine>(
        &self,
        engine: &E,
    ) -> Result<LaunchOutcome, LobbyError> {
        let state = self.session.state();
        let Some(room) = state.current_room else {
            return Err(SessionError::NoCurrentRoom.into());
        };

        // Local completion is Active -> NoRoom; the service is not told.
        let played = run_mini_game(engine, room.game_type, |_| {
            self.session.finish_game();
        })
        .await;
        let score = match played {
            Ok(score) => score,
            Err(e) => {
                self.session.finish_game();
                self.release_seat(&room.room_code).await;
                return Err(e);
            }
        };

        let final_results = match self.service().submit_score(&room.room_code, score).await {
            Ok(resp) => resp.final_results,
            Err(e) => {
                warn!(room_code = %room.room_code, score, error = %e, "score submission failed");
                self.release_seat(&room.room_code).await;
                None
            }
        };
        Ok(LaunchOutcome {
            room_code: room.room_code,
            game_type: room.game_type,
            score,
            final_results,
        })
    }

    /// Best-effort leave for a room this client already dropped locally.
    async fn release_seat(&self, code: &RoomCode) {
        match self.service().leave_room(code).await {
            Ok(_) => debug!(room_code = %code, "released seat after game"),
            Err(e) => {
                warn!(room_code = %code, error = %e, "could not release seat after game")
            }
        }
    }
}
