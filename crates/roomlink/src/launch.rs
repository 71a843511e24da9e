//! Game launch: handing control from the lobby to a mini-game.
//!
//! Once a room goes active, the lobby is done with it. The mini-game
//! engine gets the game type and nothing else, and reports a score back
//! through `on_complete`.

use roomlink_protocol::{GameType, Ranking, RoomCode};
use tracing::info;

use crate::LobbyError;

/// A local mini-game runner.
///
/// Implement this once per device; [`run_mini_game`] picks the game by
/// [`GameType`].
///
/// # Example
///
/// ```
/// use roomlink::{GameType, MiniGameEngine};
///
/// struct QuizOnly;
///
/// impl MiniGameEngine for QuizOnly {
///     fn supports(&self, game_type: GameType) -> bool {
///         game_type == GameType::Quiz
///     }
///
///     async fn play(&self, _game_type: GameType) -> u32 {
///         42
///     }
/// }
/// ```
pub trait MiniGameEngine {
    /// Returns `true` if this engine can run `game_type`.
    fn supports(&self, game_type: GameType) -> bool;

    /// Plays one round to completion and returns this player's score.
    async fn play(&self, game_type: GameType) -> u32;
}

/// Runs the mini-game for `game_type` and passes its score to
/// `on_complete`.
///
/// # Errors
/// [`LobbyError::UnsupportedGame`] if `engine` cannot run `game_type`;
/// `on_complete` is not called then.
pub async fn run_mini_game<E: MiniGameEngine>(
    engine: &E,
    game_type: GameType,
    on_complete: impl FnOnce(u32),
) -> Result<u32, LobbyError> {
    if !engine.supports(game_type) {
        return Err(LobbyError::UnsupportedGame(game_type));
    }
    info!(%game_type, "mini-game launched");
    let score = engine.play(game_type).await;
    info!(%game_type, score, "mini-game complete");
    on_complete(score);
    Ok(score)
}

/// What happened when this client played a room's game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// The room the game was launched from.
    pub room_code: RoomCode,
    pub game_type: GameType,
    /// This player's score.
    pub score: u32,
    /// Final standings, if this client was the last to submit.
    pub final_results: Option<Vec<Ranking>>,
}
