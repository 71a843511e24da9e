//! Integration tests for `HttpRoomService` against a mock room API.

use std::time::Duration;

use roomlink_protocol::{CreateRoomRequest, GameMode, GameType, JoinRoomRequest, RoomCode};
use roomlink_transport::{HttpConfig, HttpRoomService, RoomService, ServiceError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =========================================================================
// Helpers
// =========================================================================

fn room_json(code: &str, players: &[(&str, bool)]) -> serde_json::Value {
    json!({
        "id": format!("id-{code}"),
        "room_code": code,
        "game_type": "quiz",
        "game_mode": "friend",
        "host_name": players.first().map(|p| p.0).unwrap_or("nobody"),
        "max_players": 2,
        "current_players": players.len(),
        "status": "waiting",
        "players": players
            .iter()
            .map(|(name, ready)| json!({ "player_name": name, "is_ready": ready }))
            .collect::<Vec<_>>(),
    })
}

fn client(server: &MockServer) -> HttpRoomService {
    HttpRoomService::new(HttpConfig {
        base_url: format!("{}/api", server.uri()),
        auth_token: Some("test-token".into()),
        request_timeout: Duration::from_millis(500),
        ..HttpConfig::default()
    })
    .unwrap()
}

// =========================================================================
// Success paths
// =========================================================================

#[tokio::test]
async fn test_list_rooms_sends_filter_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms"))
        .and(query_param("game_type", "quiz"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rooms": [room_json("ABC123", &[("Alice", false)])],
            "totalRooms": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rooms = client(&server).list_rooms(Some(GameType::Quiz)).await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_code, RoomCode::new("ABC123"));
}

#[tokio::test]
async fn test_create_room_posts_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rooms"))
        .and(body_json(json!({
            "game_type": "quiz",
            "game_mode": "friend",
            "player_name": "Alice",
            "max_players": 2
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(room_json("ABC123", &[("Alice", false)])),
        )
        .mount(&server)
        .await;

    let room = client(&server)
        .create_room(&CreateRoomRequest {
            game_type: GameType::Quiz,
            game_mode: GameMode::Friend,
            player_name: "Alice".into(),
            max_players: 2,
        })
        .await
        .unwrap();
    assert_eq!(room.current_players, 1);
    assert!(room.is_host("Alice"));
}

#[tokio::test]
async fn test_set_ready_returns_all_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rooms/ABC123/ready"))
        .and(body_json(json!({ "ready": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Ready status updated",
            "all_ready": true,
            "ready_count": 2,
            "total_count": 2
        })))
        .mount(&server)
        .await;

    let resp = client(&server)
        .set_ready(&RoomCode::new("ABC123"), true)
        .await
        .unwrap();
    assert!(resp.all_ready);
    assert_eq!(resp.ready_count, Some(2));
}

#[tokio::test]
async fn test_leave_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rooms/ABC123/leave"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ack = client(&server).leave_room(&RoomCode::new("abc123")).await.unwrap();
    assert_eq!(ack.message, None);
}

// =========================================================================
// Error classification
// =========================================================================

async fn join_with_error(status: u16, message: &str) -> ServiceError {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rooms/ABC123/join"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
        .mount(&server)
        .await;

    client(&server)
        .join_room(
            &RoomCode::new("ABC123"),
            &JoinRoomRequest { player_name: "Bob".into() },
        )
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_join_not_found() {
    let err = join_with_error(404, "Room not found").await;
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_join_full() {
    let err = join_with_error(400, "Room is full").await;
    assert!(matches!(err, ServiceError::Capacity(_)), "got {err:?}");
}

#[tokio::test]
async fn test_join_already_started() {
    let err = join_with_error(400, "Game already started").await;
    assert!(matches!(err, ServiceError::StateConflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_without_json_body_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).list_rooms(None).await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}

#[tokio::test]
async fn test_timeout_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/ABC123"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = client(&server).get_room(&RoomCode::new("ABC123")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_server_is_network() {
    let svc = HttpRoomService::new(HttpConfig {
        base_url: "http://127.0.0.1:9/api".into(),
        request_timeout: Duration::from_millis(300),
        connect_timeout: Duration::from_millis(300),
        ..HttpConfig::default()
    })
    .unwrap();

    let err = svc.list_rooms(None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_malformed_success_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"rooms\": 5}"))
        .mount(&server)
        .await;

    let err = client(&server).list_rooms(None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Protocol(_)), "got {err:?}");
}
