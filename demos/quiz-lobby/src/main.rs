use std::time::Duration;

use roomlink::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Quiz engine
// ---------------------------------------------------------------------------

const QUESTIONS: [(&str, &str); 4] = [
    ("Which macronutrient has 9 kcal per gram?", "fat"),
    ("Which vitamin does sunlight help produce?", "d"),
    ("How many kcal in a gram of protein?", "4"),
    ("Which mineral do bananas famously provide?", "potassium"),
];

const POINTS_PER_ANSWER: u32 = 10;

/// A scripted quiz player: answers the first `known` questions right.
struct QuizEngine {
    known: usize,
    think_time: Duration,
}

impl QuizEngine {
    fn new(known: usize) -> Self {
        Self {
            known,
            think_time: Duration::from_millis(300),
        }
    }
}

impl MiniGameEngine for QuizEngine {
    fn supports(&self, game_type: GameType) -> bool {
        game_type == GameType::Quiz
    }

    async fn play(&self, _game_type: GameType) -> u32 {
        let mut score = 0;
        for (i, (question, answer)) in QUESTIONS.iter().enumerate() {
            tokio::time::sleep(self.think_time).await;
            let given = if i < self.known { *answer } else { "?" };
            if given == *answer {
                score += POINTS_PER_ANSWER;
            }
            info!(question, given, "answered");
        }
        score
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// What the demo observed, for the test below.
#[derive(Debug)]
struct Summary {
    room_code: RoomCode,
    host_score: u32,
    guest_score: Option<u32>,
    winner: Option<String>,
    players_after_leave: usize,
}

async fn run_demo() -> Result<Summary, LobbyError> {
    let server = spawn_room_server(RoomServerConfig::with_codes(["ABC123"]));
    let config = LobbyConfig::builder()
        .poll_interval(Duration::from_millis(500))
        .build();
    let alice = Lobby::new(server.connect(), config.clone());
    let bob = Lobby::new(server.connect(), config);

    // A: host creates a two-seat quiz room.
    let room = alice
        .create_room(GameType::Quiz, GameMode::Friend, "Alice", 2)
        .await?;
    eprintln!(
        "[A] Alice created {} ({}/{} players, {})",
        room.room_code, room.current_players, room.max_players, room.status
    );

    // B: guest finds it in the directory and joins.
    let listed = bob.list_waiting_rooms(Some(GameType::Quiz)).await;
    eprintln!("[B] Bob sees {} waiting quiz room(s)", listed.len());
    let joined = bob.join_room(room.room_code.as_str(), "Bob").await?;
    eprintln!(
        "[B] Bob joined {}: {} players, all ready = {}",
        joined.room_code,
        joined.current_players,
        bob.all_ready()
    );

    // C: both ready; host starts, guest notices on its next poll.
    alice.set_ready(true).await?;
    bob.set_ready(true).await?;
    alice.refresh().await;
    eprintln!(
        "[C] host = {}, all ready = {}",
        alice.is_host(),
        alice.all_ready()
    );

    let guest = async {
        match bob.run_poll_loop(std::future::pending()).await {
            Some(ReconcileOutcome::GameStarted) => {
                bob.launch_if_started(&QuizEngine::new(2)).await
            }
            other => {
                eprintln!("[C] Bob's lobby ended with {other:?}");
                Ok(None)
            }
        }
    };
    let host_engine = QuizEngine::new(3);
    let (hosted, guested) =
        tokio::join!(alice.start_game(&host_engine), guest);
    let hosted = hosted?;
    let guested = guested?;
    eprintln!("[C] Alice scored {}", hosted.score);
    let winner = guested
        .as_ref()
        .and_then(|g| g.final_results.as_ref())
        .and_then(|r| r.first())
        .map(|r| r.player_name.clone());
    if let Some(g) = &guested {
        eprintln!("[C] Bob scored {}, winner: {:?}", g.score, winner);
    }

    // D: a new room; the guest leaves and the host sees it on refresh.
    let second = alice
        .create_room(GameType::Quiz, GameMode::Friend, "Alice", 2)
        .await?;
    bob.join_room(second.room_code.as_str(), "Bob").await?;
    bob.leave_room().await;
    eprintln!("[D] Bob left; Bob's room: {:?}", bob.state().current_room);
    alice.refresh().await;
    let players_after_leave = alice
        .state()
        .current_room
        .map(|r| r.current_players)
        .unwrap_or(0);
    eprintln!("[D] Alice now sees {players_after_leave} player(s)");

    alice.leave_room().await;
    server.shutdown().await?;

    Ok(Summary {
        room_code: room.room_code,
        host_score: hosted.score,
        guest_score: guested.map(|g| g.score),
        winner,
        players_after_leave,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    roomlink::init_tracing();
    eprintln!("running quiz lobby demo against an in-process room server");

    let summary = run_demo().await?;
    info!(?summary, "demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_demo_runs_all_scenarios() {
        let summary = run_demo().await.unwrap();
        assert_eq!(summary.room_code, RoomCode::new("ABC123"));
        assert_eq!(summary.host_score, 30);
        assert_eq!(summary.guest_score, Some(20));
        assert_eq!(summary.winner.as_deref(), Some("Alice"));
        assert_eq!(summary.players_after_leave, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiz_engine_scores_known_answers() {
        let engine = QuizEngine::new(QUESTIONS.len());
        assert_eq!(engine.play(GameType::Quiz).await, 40);
        assert!(!engine.supports(GameType::Math));
    }
}
