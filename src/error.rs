//! Error types for the chat client
//!
//! Defines the application-level error taxonomy.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal errors (the session must be abandoned) and business errors
/// (surfaced to the user, session continues).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol or transport error (fatal to the current session)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Inbound frame could not be parsed (the frame is discarded)
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// Join/switch input failed validation (no state change)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Send attempted while no channel is open
    #[error("not connected")]
    NotConnected,

    /// Room directory request failed (non-fatal, suggestions degrade)
    #[error("room directory unavailable: {0}")]
    DirectoryUnavailable(#[from] reqwest::Error),

    /// Endpoint URL could not be parsed or rewritten
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Channel send error (fatal - internal channel broken)
    #[error("channel send error")]
    ChannelSend,
}
