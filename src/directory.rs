//! Room directory client
//!
//! Fetches the list of known room names over HTTP. The directory is a
//! convenience collaborator: every failure here is non-fatal and callers
//! degrade to "no suggestions".

use tracing::warn;
use url::Url;

use crate::error::AppError;
use crate::types::RoomName;

/// Client for the `GET /rooms` directory endpoint
#[derive(Debug, Clone)]
pub struct RoomDirectory {
    base: Url,
    http: reqwest::Client,
}

impl RoomDirectory {
    /// Create a directory client for an HTTP base URL
    pub fn new(base: Url) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    /// Derive the directory base from a chat endpoint
    ///
    /// Upgrades the scheme (`ws` -> `http`, `wss` -> `https`) and strips the
    /// path and query, so `wss://host/ws` becomes `https://host/`.
    pub fn from_endpoint(endpoint: &Url) -> Result<Self, AppError> {
        let mut base = endpoint.clone();
        let scheme = match endpoint.scheme() {
            "wss" | "https" => "https",
            _ => "http",
        };
        base.set_scheme(scheme)
            .map_err(|_| AppError::InvalidInput(format!("unsupported endpoint scheme in '{}'", endpoint)))?;
        base.set_path("");
        base.set_query(None);
        Ok(Self::new(base))
    }

    /// Fetch the known room names
    ///
    /// Non-2xx responses, connection failures and parse failures all come
    /// back as `DirectoryUnavailable`. Names that fail room-name validation
    /// are skipped with a warning rather than failing the whole list.
    pub async fn list_rooms(&self) -> Result<Vec<RoomName>, AppError> {
        let url = self.base.join("/rooms")?;
        let names: Vec<String> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut rooms = Vec::with_capacity(names.len());
        for name in names {
            match RoomName::new(&name) {
                Ok(room) => rooms.push(room),
                Err(e) => warn!("skipping unusable room name from directory: {}", e),
            }
        }
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal one-shot HTTP responder for directory tests.
    async fn spawn_responder(status_line: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });
        base
    }

    #[tokio::test]
    async fn test_list_rooms() {
        let base = spawn_responder("HTTP/1.1 200 OK", r#"["general","rust"]"#).await;
        let rooms = RoomDirectory::new(base).list_rooms().await.unwrap();
        let names: Vec<&str> = rooms.iter().map(|r| r.as_str()).collect();
        assert_eq!(names, ["general", "rust"]);
    }

    #[tokio::test]
    async fn test_invalid_names_are_skipped() {
        let base = spawn_responder("HTTP/1.1 200 OK", r#"["general",""]"#).await;
        let rooms = RoomDirectory::new(base).list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].as_str(), "general");
    }

    #[tokio::test]
    async fn test_server_error_is_directory_unavailable() {
        let base = spawn_responder("HTTP/1.1 500 Internal Server Error", "").await;
        let err = RoomDirectory::new(base).list_rooms().await.unwrap_err();
        assert!(matches!(err, AppError::DirectoryUnavailable(_)));
    }

    #[test]
    fn test_from_endpoint_upgrades_scheme() {
        let ws = Url::parse("ws://chat.example:8080/ws").unwrap();
        let dir = RoomDirectory::from_endpoint(&ws).unwrap();
        assert_eq!(dir.base.as_str(), "http://chat.example:8080/");

        let wss = Url::parse("wss://chat.example/ws").unwrap();
        let dir = RoomDirectory::from_endpoint(&wss).unwrap();
        assert_eq!(dir.base.as_str(), "https://chat.example/");
    }
}
