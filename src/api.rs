//! REST room API of the chat server.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx answers become [`ChatError::ServerError`] carrying the status and
//! body text; the session decides whether that is an alert or a log line.
//! The single exception is `GET /api/rooms/{id}` answering 404, which is a
//! normal "no such room" result.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ChatError;
use crate::model::Room;

/// Room endpoints the session depends on. Mocked in tests.
#[async_trait::async_trait]
pub trait RoomApi: Send + Sync {
    /// `GET /api/rooms`.
    async fn list_rooms(&self) -> Result<Vec<Room>, ChatError>;

    /// `POST /api/rooms?name=...`.
    async fn create_room(&self, name: &str) -> Result<Room, ChatError>;

    /// `GET /api/rooms/{id}`; `Ok(None)` when the server does not know the id.
    async fn find_room(&self, id: &str) -> Result<Option<Room>, ChatError>;
}

/// [`RoomApi`] over HTTP with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpRoomApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRoomApi {
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidBaseUrl`] when `base_url` is not an
    /// absolute http(s) URL, or [`ChatError::Http`] if the client cannot be
    /// built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ChatError::InvalidBaseUrl(base_url.to_owned()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ChatError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ChatError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ChatError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RoomApi for HttpRoomApi {
    async fn list_rooms(&self) -> Result<Vec<Room>, ChatError> {
        let url = self.endpoint(&["api", "rooms"])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn create_room(&self, name: &str) -> Result<Room, ChatError> {
        let url = self.endpoint(&["api", "rooms"])?;
        let response = self
            .client
            .post(url)
            .query(&[("name", name)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn find_room(&self, id: &str) -> Result<Option<Room>, ChatError> {
        let url = self.endpoint(&["api", "rooms", id])?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ChatError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ChatError::ServerError {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
