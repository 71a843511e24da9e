//! Room registry: the server's authoritative record of every room.
//!
//! The registry is plain synchronous state. It is owned by the room
//! server task (see [`spawn_room_server`](crate::spawn_room_server)) and
//! never shared, so it needs no locking of its own.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use rand::Rng;
use roomlink_protocol::{
    Ack, CreateRoomRequest, GameType, JoinRoomRequest, Player, Ranking,
    ReadyResponse, Room, RoomCode, RoomStatus, ScoreResponse,
};

use crate::{RoomError, RoomServerConfig};

/// Characters used in generated room codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Identifies a caller of the room server, the way a bearer token
/// identifies a user of the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// One room plus the bookkeeping the wire type doesn't carry.
#[derive(Debug)]
struct Entry {
    room: Room,
    /// Member clients, index-aligned with `room.players`.
    members: Vec<ClientId>,
    /// Members that submitted a score for the running game.
    submitted: HashSet<ClientId>,
    /// Creation order; listings are newest first.
    seq: u64,
}

impl Entry {
    fn position(&self, client: ClientId) -> Option<usize> {
        self.members.iter().position(|c| *c == client)
    }

    fn remove_member(&mut self, index: usize) -> Player {
        self.members.remove(index);
        let player = self.room.players.remove(index);
        self.room.current_players = self.room.players.len();
        player
    }
}

/// The authoritative set of rooms.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Entry>,
    /// Which room each client is in. A client is in at most one room.
    client_rooms: HashMap<ClientId, RoomCode>,
    config: RoomServerConfig,
    scripted_codes: VecDeque<RoomCode>,
    next_seq: u64,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RoomServerConfig) -> Self {
        let scripted_codes = config.scripted_codes.iter().cloned().collect();
        Self {
            rooms: HashMap::new(),
            client_rooms: HashMap::new(),
            config,
            scripted_codes,
            next_seq: 0,
        }
    }

    /// Every non-finished room, newest first, optionally for one game.
    pub fn list(&self, game_type: Option<GameType>) -> Vec<Room> {
        let mut entries: Vec<&Entry> = self
            .rooms
            .values()
            .filter(|e| e.room.status != RoomStatus::Finished)
            .filter(|e| game_type.is_none_or(|t| e.room.game_type == t))
            .collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        entries.into_iter().map(|e| e.room.clone()).collect()
    }

    /// Looks up one room.
    pub fn get(&self, code: &RoomCode) -> Result<Room, RoomError> {
        self.rooms
            .get(code)
            .map(|e| e.room.clone())
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Creates a room with `caller` as its not-ready host.
    pub fn create(
        &mut self,
        caller: ClientId,
        request: &CreateRoomRequest,
    ) -> Result<Room, RoomError> {
        let name = validated_name(&request.player_name)?;
        if request.max_players < self.config.min_players
            || request.max_players > self.config.max_players_limit
        {
            return Err(RoomError::InvalidRequest(format!(
                "max_players must be between {} and {}",
                self.config.min_players, self.config.max_players_limit
            )));
        }
        if let Some(current) = self.client_rooms.get(&caller) {
            return Err(RoomError::AlreadyInRoom(caller, current.clone()));
        }

        let room_code = self.next_code();
        let room = Room {
            id: generate_id(),
            room_code: room_code.clone(),
            game_type: request.game_type,
            game_mode: request.game_mode,
            host_name: name.to_string(),
            max_players: request.max_players,
            current_players: 1,
            status: RoomStatus::Waiting,
            players: vec![Player::new(name)],
        };

        self.next_seq += 1;
        self.rooms.insert(
            room_code.clone(),
            Entry {
                room: room.clone(),
                members: vec![caller],
                submitted: HashSet::new(),
                seq: self.next_seq,
            },
        );
        self.client_rooms.insert(caller, room_code.clone());

        tracing::info!(%room_code, %caller, host = %name, game_type = %room.game_type, "room created");
        Ok(room)
    }

    /// Adds `caller` to a waiting room.
    pub fn join(
        &mut self,
        caller: ClientId,
        code: &RoomCode,
        request: &JoinRoomRequest,
    ) -> Result<Room, RoomError> {
        let name = validated_name(&request.player_name)?;
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        match entry.room.status {
            RoomStatus::Waiting => {}
            RoomStatus::Active => return Err(RoomError::GameAlreadyStarted(code.clone())),
            RoomStatus::Finished => return Err(RoomError::NotFound(code.clone())),
        }
        if let Some(current) = self.client_rooms.get(&caller) {
            return Err(RoomError::AlreadyInRoom(caller, current.clone()));
        }
        if entry.room.is_full() {
            return Err(RoomError::RoomFull(code.clone()));
        }
        if entry.room.player(name).is_some() {
            return Err(RoomError::NameTaken(name.to_string()));
        }

        entry.room.players.push(Player::new(name));
        entry.members.push(caller);
        entry.room.current_players = entry.room.players.len();
        self.client_rooms.insert(caller, code.clone());

        tracing::info!(
            room_code = %code,
            %caller,
            player = %name,
            players = entry.room.current_players,
            "player joined"
        );
        Ok(entry.room.clone())
    }

    /// Sets the caller's ready flag and reports the ready-check.
    pub fn set_ready(
        &mut self,
        caller: ClientId,
        code: &RoomCode,
        ready: bool,
    ) -> Result<ReadyResponse, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let index = entry
            .position(caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;

        if let Some(player) = entry.room.players.get_mut(index) {
            player.is_ready = ready;
        }

        let response = ReadyResponse {
            all_ready: entry.room.all_ready(),
            ready_count: Some(entry.room.ready_count()),
            total_count: Some(entry.room.current_players),
        };
        tracing::debug!(
            room_code = %code,
            %caller,
            ready,
            ready_count = entry.room.ready_count(),
            total = entry.room.current_players,
            "ready status updated"
        );
        Ok(response)
    }

    /// Removes `caller` from a room.
    ///
    /// If the host leaves, the earliest remaining joiner becomes host.
    /// A room left empty is dropped, so it vanishes from listings. Leaving
    /// a running game in which everyone else already submitted finishes it.
    pub fn leave(&mut self, caller: ClientId, code: &RoomCode) -> Result<Ack, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let index = entry
            .position(caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;

        let player = entry.remove_member(index);
        entry.submitted.remove(&caller);
        if self.client_rooms.get(&caller) == Some(code) {
            self.client_rooms.remove(&caller);
        }
        let remaining = entry.room.current_players;

        tracing::info!(room_code = %code, %caller, player = %player.player_name, remaining, "player left");

        if remaining == 0 {
            self.rooms.remove(code);
            tracing::info!(room_code = %code, "closed empty room");
        } else {
            if entry.room.is_host(&player.player_name) {
                if let Some(next) = entry.room.players.first() {
                    entry.room.host_name = next.player_name.clone();
                    tracing::info!(room_code = %code, new_host = %next.player_name, "host transferred");
                }
            }
            self.finish_if_complete(code);
        }

        Ok(Ack {
            message: Some("Left room successfully".to_string()),
            current_players: Some(remaining),
        })
    }

    /// Moves a room from waiting to active.
    ///
    /// Unlike the client, the server enforces the start preconditions:
    /// caller is host, at least two players, everyone ready.
    pub fn start(&mut self, caller: ClientId, code: &RoomCode) -> Result<Ack, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let is_host = entry
            .position(caller)
            .and_then(|i| entry.room.players.get(i))
            .is_some_and(|p| entry.room.is_host(&p.player_name));
        if !is_host {
            return Err(RoomError::NotHost(code.clone()));
        }
        if entry.room.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted(code.clone()));
        }
        if !entry.room.all_ready() {
            return Err(RoomError::NotAllReady {
                ready: entry.room.ready_count(),
                total: entry.room.current_players,
            });
        }

        entry.room.status = RoomStatus::Active;
        entry.submitted.clear();
        for player in &mut entry.room.players {
            player.score = 0;
        }

        tracing::info!(room_code = %code, players = entry.room.current_players, "game started");
        Ok(Ack {
            message: Some("Game started successfully".to_string()),
            current_players: Some(entry.room.current_players),
        })
    }

    /// Records the caller's score. Once every member has submitted, the
    /// room finishes, is dropped, and the standings are returned.
    ///
    /// Submitting releases the caller: it may create or join another room
    /// while the others are still playing.
    pub fn submit_score(
        &mut self,
        caller: ClientId,
        code: &RoomCode,
        score: u32,
    ) -> Result<ScoreResponse, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if entry.room.status != RoomStatus::Active {
            return Err(RoomError::GameNotRunning(code.clone()));
        }
        let index = entry
            .position(caller)
            .ok_or_else(|| RoomError::NotInRoom(caller, code.clone()))?;

        if let Some(player) = entry.room.players.get_mut(index) {
            player.score = score;
        }
        entry.submitted.insert(caller);
        if self.client_rooms.get(&caller) == Some(code) {
            self.client_rooms.remove(&caller);
        }

        Ok(ScoreResponse {
            message: Some("Score submitted successfully".to_string()),
            final_results: self.finish_if_complete(code),
        })
    }

    /// Finishes and drops an active room once every remaining member has
    /// submitted, returning the standings.
    fn finish_if_complete(&mut self, code: &RoomCode) -> Option<Vec<Ranking>> {
        let entry = self.rooms.get(code)?;
        let complete = entry.room.status == RoomStatus::Active
            && !entry.members.is_empty()
            && entry.members.iter().all(|m| entry.submitted.contains(m));
        if !complete {
            return None;
        }
        let entry = self.rooms.remove(code)?;

        let mut standings: Vec<&Player> = entry.room.players.iter().collect();
        // Stable sort: ties keep join order.
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        let rankings: Vec<Ranking> = standings
            .into_iter()
            .enumerate()
            .map(|(i, p)| Ranking {
                rank: i + 1,
                player_name: p.player_name.clone(),
                score: p.score,
            })
            .collect();

        for member in &entry.members {
            // A member released on submit may already be in another room.
            if self.client_rooms.get(member) == Some(code) {
                self.client_rooms.remove(member);
            }
        }
        tracing::info!(room_code = %code, players = rankings.len(), "game finished");
        Some(rankings)
    }

    /// The room `client` is currently in.
    pub fn client_room(&self, client: ClientId) -> Option<&RoomCode> {
        self.client_rooms.get(&client)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Picks a code unique among live rooms: scripted codes first, then
    /// random ones.
    fn next_code(&mut self) -> RoomCode {
        while let Some(code) = self.scripted_codes.pop_front() {
            if !code.is_empty() && !self.rooms.contains_key(&code) {
                return code;
            }
        }
        loop {
            let code = random_code();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

fn validated_name(raw: &str) -> Result<&str, RoomError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RoomError::InvalidRequest("player_name is required".to_string()));
    }
    Ok(name)
}

fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..RoomCode::LEN)
        .map(|_| {
            let i = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[i])
        })
        .collect();
    RoomCode::new(code)
}

/// 128-bit random hex id, opaque to clients.
fn generate_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
