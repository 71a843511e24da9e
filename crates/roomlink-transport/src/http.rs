//! HTTP/JSON implementation of [`RoomService`] using `reqwest`.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use roomlink_protocol::{
    Ack, Codec, CreateRoomRequest, ErrorBody, GameType, JoinRoomRequest,
    JsonCodec, ReadyRequest, ReadyResponse, Room, RoomCode, RoomListResponse,
    ScoreRequest, ScoreResponse,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{RoomService, ServiceError};

/// Connection settings for [`HttpRoomService`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// API root, e.g. `https://games.example.com/api`. Paths such as
    /// `/rooms` are appended to it.
    pub base_url: String,

    /// Sent as `Authorization: Bearer <token>` when present.
    pub auth_token: Option<String>,

    /// Whole-request timeout. A request that exceeds it surfaces as
    /// [`ServiceError::Network`].
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// A [`RoomService`] that talks to the room REST API.
///
/// Cheap to clone: `reqwest::Client` is reference counted internally.
#[derive(Debug, Clone)]
pub struct HttpRoomService<C: Codec = JsonCodec> {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    codec: C,
}

impl HttpRoomService<JsonCodec> {
    /// Builds a JSON client from `config`.
    ///
    /// # Errors
    /// - [`ServiceError::InvalidUrl`] if `base_url` does not parse or
    ///   cannot carry a path.
    /// - [`ServiceError::Network`] if the underlying client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, ServiceError> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> HttpRoomService<C> {
    /// Builds a client that encodes bodies with `codec`.
    pub fn with_codec(config: HttpConfig, codec: C) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl(config.base_url));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token,
            codec,
        })
    }

    /// Appends path segments to the base URL. Segments are
    /// percent-encoded, so a hand-typed room code can't escape its slot.
    fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request and decodes the success body as `T`.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T, ServiceError> {
        debug!(%method, %url, "room service request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, self.codec.content_type())
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "room service unreachable");
            ServiceError::Network(e.to_string())
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if status.is_success() {
            // Bare acknowledgements (204, empty 200) decode as `{}`.
            let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
            return Ok(self.codec.decode(body)?);
        }

        let message = match self.codec.decode::<ErrorBody>(&bytes) {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        };
        debug!(%method, %url, status = status.as_u16(), %message, "room service error response");
        Err(ServiceError::from_status(status.as_u16(), message))
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = self.url(segments)?;
        let body = self.codec.encode(body)?;
        self.send(Method::POST, url, Some(body)).await
    }
}

impl<C: Codec> RoomService for HttpRoomService<C> {
    async fn list_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<Room>, ServiceError> {
        let mut url = self.url(&["rooms"])?;
        if let Some(game_type) = game_type {
            url.query_pairs_mut()
                .append_pair("game_type", game_type.as_str());
        }
        let list: RoomListResponse = self.send(Method::GET, url, None).await?;
        Ok(list.rooms)
    }

    async fn get_room(&self, code: &RoomCode) -> Result<Room, ServiceError> {
        let url = self.url(&["rooms", code.as_str()])?;
        self.send(Method::GET, url, None).await
    }

    async fn create_room(
        &self,
        request: &CreateRoomRequest,
    ) -> Result<Room, ServiceError> {
        self.post(&["rooms"], request).await
    }

    async fn join_room(
        &self,
        code: &RoomCode,
        request: &JoinRoomRequest,
    ) -> Result<Room, ServiceError> {
        self.post(&["rooms", code.as_str(), "join"], request).await
    }

    async fn set_ready(
        &self,
        code: &RoomCode,
        ready: bool,
    ) -> Result<ReadyResponse, ServiceError> {
        self.post(&["rooms", code.as_str(), "ready"], &ReadyRequest { ready })
            .await
    }

    async fn leave_room(&self, code: &RoomCode) -> Result<Ack, ServiceError> {
        let url = self.url(&["rooms", code.as_str(), "leave"])?;
        self.send(Method::POST, url, None).await
    }

    async fn start_game(&self, code: &RoomCode) -> Result<Ack, ServiceError> {
        let url = self.url(&["rooms", code.as_str(), "start"])?;
        self.send(Method::POST, url, None).await
    }

    async fn submit_score(
        &self,
        code: &RoomCode,
        score: u32,
    ) -> Result<ScoreResponse, ServiceError> {
        self.post(&["rooms", code.as_str(), "score"], &ScoreRequest { score })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_appends_segments_to_base_path() {
        let svc = HttpRoomService::new(HttpConfig {
            base_url: "http://localhost:3000/api/".into(),
            ..HttpConfig::default()
        })
        .unwrap();
        let url = svc.url(&["rooms", "ABC123", "join"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/rooms/ABC123/join");
    }

    #[test]
    fn test_url_encodes_hostile_code() {
        let svc = HttpRoomService::new(HttpConfig::default()).unwrap();
        let url = svc.url(&["rooms", "../admin"]).unwrap();
        assert!(url.path().ends_with("/rooms/..%2Fadmin"), "got {}", url.path());
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = HttpRoomService::new(HttpConfig {
            base_url: "not a url".into(),
            ..HttpConfig::default()
        });
        assert!(matches!(result, Err(ServiceError::InvalidUrl(_))));
    }
}
