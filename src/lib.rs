//! Multi-room WebSocket Chat Client Library
//!
//! A chat client core built with tokio-tungstenite using the Actor pattern
//! for session state management.
//!
//! # Features
//! - One live session against one room at a time
//! - Username handshake on every connection
//! - Real-time chat messaging with local receipt timestamps
//! - Debounced typing indicators (one ping per keystroke burst)
//! - Atomic room switching with no event leakage from the old room
//! - Room suggestions from an HTTP directory (non-fatal when unavailable)
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatSession` is the central actor owning all session state
//! - Each connection has a reader task feeding the actor's event queue,
//!   tagged with an epoch so superseded channels are ignored
//! - The presentation layer is a pure consumer of `SessionEvent`s
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::sync::mpsc;
//! use url::Url;
//! use roomchat::{ChatSession, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let endpoint = Url::parse("ws://127.0.0.1:8080/ws").unwrap();
//!     let (event_tx, mut events) = mpsc::channel(64);
//!     let (session, handle) = ChatSession::new(endpoint, event_tx);
//!     tokio::spawn(session.run());
//!
//!     handle.join("alice", "general").await.unwrap();
//!     handle.send_chat("hi").await.unwrap();
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod channel;
pub mod debounce;
pub mod directory;
pub mod error;
pub mod message;
pub mod session;
mod switch;
pub mod types;

// Re-export main types for convenience
pub use channel::{ChannelEvent, ChannelEventKind, ChatChannel};
pub use debounce::{PeerTyping, TypingDebouncer, TYPING_DEBOUNCE_WINDOW, TYPING_INDICATOR_TTL};
pub use directory::RoomDirectory;
pub use error::AppError;
pub use message::{InboundEvent, OutboundIntent};
pub use session::{ChatSession, SessionCommand, SessionEvent, SessionHandle, SessionState};
pub use types::{RoomName, Username};
