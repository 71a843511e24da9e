//! Integration tests for the session controller against an in-process
//! room server.

use std::collections::HashSet;

use roomlink_protocol::{GameMode, GameType, RoomCode, RoomStatus};
use roomlink_room::{LocalRoomService, RoomServerConfig, RoomServerHandle, spawn_room_server};
use roomlink_session::{
    ClientPhase, ReadyOutcome, ReconcileOutcome, SessionController, SessionError,
};
use roomlink_transport::RoomService;

// =========================================================================
// Helpers
// =========================================================================

fn server() -> RoomServerHandle {
    spawn_room_server(RoomServerConfig::with_codes(["ABC123"]))
}

/// A controller plus a clone of its service handle, for flipping the
/// offline switch and peeking at the server.
fn client(server: &RoomServerHandle) -> (SessionController<LocalRoomService>, LocalRoomService) {
    let service = server.connect();
    (SessionController::new(service.clone()), service)
}

async fn alice_hosts(ctl: &SessionController<LocalRoomService>) -> RoomCode {
    ctl.create_room(GameType::Quiz, GameMode::Friend, "Alice", 2)
        .await
        .unwrap()
        .room_code
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_scenario_a_host_creates_room() {
    let server = server();
    let (alice, _) = client(&server);

    let room = alice
        .create_room(GameType::Quiz, GameMode::Friend, "Alice", 2)
        .await
        .unwrap();

    assert_eq!(room.room_code, RoomCode::new("ABC123"));
    assert_eq!(room.current_players, 1);
    assert_eq!(room.status, RoomStatus::Waiting);
    assert!(!room.players[0].is_ready);

    let state = alice.state();
    assert_eq!(state.current_room, Some(room));
    assert!(!state.is_ready_local);
    assert!(state.is_host());
    assert_eq!(state.phase(), ClientPhase::Waiting { host: true });
}

#[tokio::test]
async fn test_scenario_b_guest_joins() {
    let server = server();
    let (alice, _) = client(&server);
    let (bob, _) = client(&server);
    alice_hosts(&alice).await;

    let room = bob.join_room("abc123", "Bob").await.unwrap();
    assert_eq!(room.current_players, 2);
    assert!(room.players.iter().all(|p| !p.is_ready));

    let state = bob.state();
    assert!(!state.all_ready());
    assert!(!state.is_host());
    assert_eq!(state.phase(), ClientPhase::Waiting { host: false });
}

#[tokio::test]
async fn test_scenario_c_both_ready_then_guest_sees_start() {
    let server = server();
    let (alice, alice_svc) = client(&server);
    let (bob, _) = client(&server);
    let code = alice_hosts(&alice).await;
    bob.join_room("ABC123", "Bob").await.unwrap();
    alice.sync().await;

    assert_eq!(
        alice.set_ready(true).await.unwrap(),
        ReadyOutcome::Committed { all_ready: false }
    );
    assert_eq!(
        bob.set_ready(true).await.unwrap(),
        ReadyOutcome::Committed { all_ready: true }
    );
    assert_eq!(alice.sync().await, ReconcileOutcome::Replaced);
    assert!(alice.state().is_host());
    assert!(alice.state().all_ready());

    alice_svc.start_game(&code).await.unwrap();
    assert!(alice.mark_active());
    assert_eq!(alice.state().phase(), ClientPhase::Active);

    assert_eq!(bob.sync().await, ReconcileOutcome::GameStarted);
    assert_eq!(bob.state().phase(), ClientPhase::Active);
}

#[tokio::test]
async fn test_scenario_d_guest_leaves() {
    let server = server();
    let (alice, _) = client(&server);
    let (bob, _) = client(&server);
    alice_hosts(&alice).await;
    bob.join_room("ABC123", "Bob").await.unwrap();
    alice.sync().await;
    assert_eq!(alice.state().current_room.unwrap().current_players, 2);

    assert_eq!(bob.leave_room().await, Some(RoomCode::new("ABC123")));
    assert_eq!(bob.state().current_room, None);

    assert_eq!(alice.sync().await, ReconcileOutcome::Replaced);
    assert_eq!(alice.state().current_room.unwrap().current_players, 1);
}

// =========================================================================
// Session control
// =========================================================================

#[tokio::test]
async fn test_create_validation_happens_before_network() {
    let server = server();
    let (alice, svc) = client(&server);
    svc.set_offline(true);

    let err = alice
        .create_room(GameType::Quiz, GameMode::Friend, "   ", 2)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));

    let err = alice
        .create_room(GameType::Quiz, GameMode::Friend, "Alice", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));

    let err = alice
        .create_room(GameType::Quiz, GameMode::Friend, "Alice", 2)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::RoomCreate(_)));
    assert!(err.is_transient());
    assert_eq!(alice.state().current_room, None);
}

#[tokio::test]
async fn test_one_room_per_client() {
    let server = server();
    let (alice, _) = client(&server);
    alice_hosts(&alice).await;

    let err = alice
        .create_room(GameType::Math, GameMode::Quick, "Alice", 2)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::AlreadyInRoom(_)));

    let err = alice.join_room("ABC123", "Alice").await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyInRoom(_)));
}

#[tokio::test]
async fn test_join_failures_are_distinct_kinds() {
    let server = server();
    let (alice, alice_svc) = client(&server);
    let (bob, _) = client(&server);
    let (carol, _) = client(&server);

    let err = bob.join_room("NOPE00", "Bob").await.unwrap_err();
    assert!(matches!(err, SessionError::RoomNotFound(ref c) if c.as_str() == "NOPE00"));

    let code = alice_hosts(&alice).await;
    bob.join_room("ABC123", "Bob").await.unwrap();
    let err = carol.join_room("ABC123", "Carol").await.unwrap_err();
    assert!(matches!(err, SessionError::RoomFull(_)));

    bob.leave_room().await;
    alice.set_ready(true).await.unwrap();
    let (dave, _) = client(&server);
    dave.join_room("ABC123", "Dave").await.unwrap();
    dave.set_ready(true).await.unwrap();
    alice_svc.start_game(&code).await.unwrap();

    let err = carol.join_room("ABC123", "Carol").await.unwrap_err();
    assert!(matches!(err, SessionError::GameAlreadyStarted(_)));

    let err = carol.join_room("", "Carol").await.unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
    assert_eq!(carol.state().current_room, None);
}

#[tokio::test]
async fn test_leave_clears_state_even_when_offline() {
    let server = server();
    let (alice, svc) = client(&server);
    alice_hosts(&alice).await;
    let rx = alice.subscribe();

    svc.set_offline(true);
    assert_eq!(alice.leave_room().await, Some(RoomCode::new("ABC123")));
    assert!(rx.has_changed().unwrap());
    assert_eq!(alice.state().current_room, None);

    // Coming back online does not re-attach the room.
    svc.set_offline(false);
    assert_eq!(alice.sync().await, ReconcileOutcome::NoRoom);
    assert_eq!(alice.state().current_room, None);
}

#[tokio::test]
async fn test_leave_without_room_is_noop() {
    let server = server();
    let (alice, _) = client(&server);
    let rx = alice.subscribe();
    assert_eq!(alice.leave_room().await, None);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_player_count_matches_distinct_names() {
    let server = server();
    let (alice, _) = client(&server);
    alice
        .create_room(GameType::Word, GameMode::Friend, "Alice", 4)
        .await
        .unwrap();
    let guests: Vec<_> = (0..3).map(|_| client(&server)).collect();

    let check = |svc: &LocalRoomService| {
        let svc = svc.clone();
        async move {
            let room = svc.get_room(&RoomCode::new("ABC123")).await.unwrap();
            room.check_invariants().unwrap();
            let names: HashSet<_> = room.players.iter().map(|p| &p.player_name).collect();
            assert_eq!(room.current_players, names.len());
        }
    };

    for (i, (ctl, svc)) in guests.iter().enumerate() {
        ctl.join_room("ABC123", &format!("Guest{i}")).await.unwrap();
        check(svc).await;
    }
    guests[1].0.leave_room().await;
    check(&guests[0].1).await;
    alice.leave_room().await;
    check(&guests[0].1).await;
}

// =========================================================================
// Ready-check
// =========================================================================

#[tokio::test]
async fn test_set_ready_without_room() {
    let server = server();
    let (alice, _) = client(&server);
    let err = alice.set_ready(true).await.unwrap_err();
    assert!(matches!(err, SessionError::NoCurrentRoom));
}

#[tokio::test]
async fn test_set_ready_twice_equals_once() {
    let server = server();
    let (alice, _) = client(&server);
    alice_hosts(&alice).await;

    alice.set_ready(true).await.unwrap();
    let once = alice.state();
    alice.set_ready(true).await.unwrap();
    assert_eq!(alice.state(), once);
    assert!(once.is_ready_local);
}

#[tokio::test]
async fn test_failed_ready_rolls_back_exactly() {
    let server = server();
    let (alice, svc) = client(&server);
    alice_hosts(&alice).await;
    let before = alice.state();

    svc.set_offline(true);
    let err = alice.set_ready(true).await.unwrap_err();
    assert!(matches!(err, SessionError::ReadyRejected(_)));
    assert!(err.is_transient());
    assert_eq!(alice.state(), before);
}

#[tokio::test]
async fn test_ready_is_visible_before_the_call_resolves() {
    let server = server();
    let (alice, svc) = client(&server);
    alice_hosts(&alice).await;
    let mut rx = alice.subscribe();
    rx.borrow_and_update();

    svc.set_offline(true);
    let _ = alice.set_ready(true).await;

    // Two notifications were published: the optimistic apply and the
    // rollback. The receiver only keeps the latest value.
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().is_ready_local);
}

#[tokio::test]
async fn test_concurrent_leave_abandons_ready_call() {
    let server = server();
    let (alice, _) = client(&server);
    let (bob, bob_svc) = client(&server);
    alice_hosts(&alice).await;
    bob.join_room("ABC123", "Bob").await.unwrap();

    let (ready, left) = tokio::join!(bob.set_ready(true), bob.leave_room());
    assert_eq!(ready.unwrap(), ReadyOutcome::Abandoned);
    assert_eq!(left, Some(RoomCode::new("ABC123")));
    assert_eq!(bob.state().current_room, None);

    // The ready flag never reached the server.
    let room = bob_svc.get_room(&RoomCode::new("ABC123")).await.unwrap();
    assert_eq!(room.ready_count(), 0);
}

// =========================================================================
// Reconciliation
// =========================================================================

#[tokio::test]
async fn test_sync_converges_to_server_record() {
    let server = server();
    let (alice, svc) = client(&server);
    let (bob, _) = client(&server);
    let code = alice_hosts(&alice).await;
    bob.join_room("ABC123", "Bob").await.unwrap();
    bob.set_ready(true).await.unwrap();
    alice.set_ready(true).await.unwrap();

    // Local copy is stale (Alice never saw Bob join).
    assert_eq!(alice.state().current_room.unwrap().current_players, 1);

    assert_eq!(alice.sync().await, ReconcileOutcome::Replaced);
    let server_copy = svc.get_room(&code).await.unwrap();
    assert_eq!(alice.state().current_room, Some(server_copy));
    assert!(alice.state().all_ready());
}

#[tokio::test]
async fn test_sync_reports_vanished_room_once() {
    let server = server();
    let (alice, _) = client(&server);
    let (bob, _) = client(&server);
    alice_hosts(&alice).await;
    bob.join_room("ABC123", "Bob").await.unwrap();

    // The room disappears server-side while Bob's local copy still has
    // it: Alice leaves, then Bob's membership is dropped behind the
    // controller's back.
    alice.leave_room().await;
    bob.service().leave_room(&RoomCode::new("ABC123")).await.unwrap();

    assert_eq!(
        bob.sync().await,
        ReconcileOutcome::Removed(RoomCode::new("ABC123"))
    );
    assert_eq!(bob.state().current_room, None);
    assert_eq!(bob.sync().await, ReconcileOutcome::NoRoom);
}

#[tokio::test]
async fn test_failed_fetch_keeps_state() {
    let server = server();
    let (alice, svc) = client(&server);
    alice_hosts(&alice).await;
    let before = alice.state();

    svc.set_offline(true);
    assert_eq!(alice.sync().await, ReconcileOutcome::FetchFailed);
    assert_eq!(alice.state(), before);
}

#[tokio::test]
async fn test_finish_game_returns_to_no_room() {
    let server = server();
    let (alice, _) = client(&server);
    alice_hosts(&alice).await;
    assert!(alice.mark_active());
    assert!(!alice.mark_active());
    assert_eq!(alice.finish_game(), Some(RoomCode::new("ABC123")));
    assert_eq!(alice.state().phase(), ClientPhase::NoRoom);
}
