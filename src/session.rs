//! Session state machine
//!
//! The central actor owning the single live `Session`. It drives connection
//! establishment, routes decoded inbound events to the observer stream, and
//! relays local intents through the codec and channel. All state transitions
//! run on one task; commands, channel events and debounce decisions are
//! processed to completion one at a time, so no locks are needed.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::channel::{ChannelEvent, ChannelEventKind, ChatChannel};
use crate::debounce::{PeerTyping, TypingDebouncer};
use crate::error::AppError;
use crate::message::{self, InboundEvent, OutboundIntent};
use crate::types::{RoomName, Username};

/// Bounded wait for connection establishment.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffer size for the command channel
const COMMAND_BUFFER_SIZE: usize = 64;

/// Buffer size for inbound channel events
const FRAME_BUFFER_SIZE: usize = 256;

/// Commands sent from the handle to the session actor
#[derive(Debug)]
pub enum SessionCommand {
    /// Start a session in `room` as `username`
    Join { username: Username, room: RoomName },
    /// Send a chat message to the current room
    SendChat { text: String },
    /// A local keystroke happened (feeds the typing debouncer)
    KeyPress,
    /// Tear down the current room and join another
    SwitchRoom { room: RoomName },
}

/// Lifecycle states of the session actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No room chosen; the only state `Join` is accepted in
    Unbound,
    /// Channel open issued, handshake not yet dispatched
    Connecting,
    /// Channel open and the username bound; traffic flows
    Active,
    /// Old-room teardown in progress during a switch
    Closing,
}

/// Observable events for the presentation layer
///
/// Delivered over a single mpsc stream in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A chat message arrived (receipt time stamped locally)
    MessageReceived {
        username: String,
        content: String,
        received_at: DateTime<Local>,
    },
    /// A room member started typing
    TypingObserved { username: String },
    /// The room membership changed
    UserListChanged { users: Vec<String> },
    /// Something went wrong; fatal failures also reset the session
    SessionError { message: String },
    /// The session is now targeting this room
    RoomChanged { room: RoomName },
    /// The server announced a newly created room
    RoomAdded { room: String },
}

/// The complete state of one user's membership in one room
///
/// Exactly one is live at a time, owned by the actor. Destroyed and
/// recreated on every room switch so nothing carries over.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) room: RoomName,
    pub(crate) username: Username,
    pub(crate) channel: Option<ChatChannel>,
    pub(crate) typing: TypingDebouncer,
    pub(crate) peer_typing: PeerTyping,
}

/// The session actor
///
/// Runs an event loop over its command queue and the channel event queue.
/// The epoch counter identifies the current channel generation; events
/// tagged with an older epoch come from a superseded channel and are
/// discarded on arrival.
pub struct ChatSession {
    pub(crate) endpoint: Url,
    pub(crate) state: SessionState,
    pub(crate) session: Option<Session>,
    pub(crate) epoch: u64,
    pub(crate) commands: mpsc::Receiver<SessionCommand>,
    pub(crate) chan_tx: mpsc::Sender<ChannelEvent>,
    pub(crate) chan_rx: mpsc::Receiver<ChannelEvent>,
    pub(crate) events: mpsc::Sender<SessionEvent>,
}

/// Cloneable handle for driving the session actor
///
/// Input validation happens here, before a command is enqueued: invalid
/// input never reaches the actor and causes no state change.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Start a session in `room` as `username`
    ///
    /// Fails with `InvalidInput` without opening a connection when either
    /// name violates the length rules.
    pub async fn join(&self, username: &str, room: &str) -> Result<(), AppError> {
        let username = Username::new(username)?;
        let room = RoomName::new(room)?;
        self.send(SessionCommand::Join { username, room }).await
    }

    /// Send a chat message; empty or whitespace-only text is a silent no-op
    pub async fn send_chat(&self, text: &str) -> Result<(), AppError> {
        self.send(SessionCommand::SendChat {
            text: text.to_string(),
        })
        .await
    }

    /// Report a local keystroke; at most one typing ping per burst goes out
    pub async fn notify_typing(&self) -> Result<(), AppError> {
        self.send(SessionCommand::KeyPress).await
    }

    /// Leave the current room and join `room`; same-room switches are no-ops
    pub async fn switch_room(&self, room: &str) -> Result<(), AppError> {
        let room = RoomName::new(room)?;
        self.send(SessionCommand::SwitchRoom { room }).await
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), AppError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| AppError::ChannelSend)
    }
}

impl ChatSession {
    /// Create the actor and its handle
    ///
    /// `events` is the observer stream the presentation layer consumes.
    pub fn new(endpoint: Url, events: mpsc::Sender<SessionEvent>) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (chan_tx, chan_rx) = mpsc::channel(FRAME_BUFFER_SIZE);
        let session = Self {
            endpoint,
            state: SessionState::Unbound,
            session: None,
            epoch: 0,
            commands: cmd_rx,
            chan_tx,
            chan_rx,
            events,
        };
        (session, SessionHandle { commands: cmd_tx })
    }

    /// Run the session event loop
    ///
    /// Returns when all command senders are dropped; any open channel is
    /// retired on the way out.
    pub async fn run(mut self) {
        info!("chat session started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                event = self.chan_rx.recv() => {
                    // self holds a chan_tx clone, so this arm never yields None
                    if let Some(event) = event {
                        self.handle_channel_event(event).await;
                    }
                }
            }
        }

        if let Some(mut session) = self.session.take() {
            if let Some(channel) = session.channel.take() {
                channel.retire().await;
            }
        }
        info!("chat session stopped");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join { username, room } => {
                self.handle_join(username, room).await;
            }
            SessionCommand::SendChat { text } => {
                self.handle_send_chat(text).await;
            }
            SessionCommand::KeyPress => {
                self.handle_key_press().await;
            }
            SessionCommand::SwitchRoom { room } => {
                self.handle_switch_room(room).await;
            }
        }
    }

    /// Handle the initial (or post-failure) join
    async fn handle_join(&mut self, username: Username, room: RoomName) {
        if self.state != SessionState::Unbound {
            warn!(
                "join as '{}' ignored, a session is already in progress",
                username
            );
            return;
        }

        info!("joining room '{}' as '{}'", room, username);
        let _ = self
            .events
            .send(SessionEvent::RoomChanged { room: room.clone() })
            .await;
        self.connect(username, room).await;
    }

    /// Open a channel for `room` and bring the session to `Active`
    ///
    /// Shared by join and room switch. The `SetUsername` handshake is
    /// dispatched before the state becomes `Active`, so no chat or typing
    /// intent can ever precede it.
    pub(crate) async fn connect(&mut self, username: Username, room: RoomName) {
        self.state = SessionState::Connecting;
        self.epoch += 1;

        let opened = tokio::time::timeout(
            CONNECT_TIMEOUT,
            ChatChannel::open(&self.endpoint, &room, self.epoch, self.chan_tx.clone()),
        )
        .await;

        let mut channel = match opened {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => {
                self.fail_connect(format!("could not connect to '{}': {}", room, e))
                    .await;
                return;
            }
            Err(_) => {
                self.fail_connect(format!("timed out connecting to '{}'", room))
                    .await;
                return;
            }
        };

        let hello = match message::encode(&OutboundIntent::SetUsername {
            username: username.to_string(),
        }) {
            Ok(frame) => frame,
            Err(e) => {
                tokio::spawn(channel.retire());
                self.fail_connect(format!("could not encode handshake: {}", e))
                    .await;
                return;
            }
        };
        if let Err(e) = channel.send(hello).await {
            tokio::spawn(channel.retire());
            self.fail_connect(format!("handshake failed: {}", e)).await;
            return;
        }

        info!("session active in room '{}'", room);
        self.session = Some(Session {
            room,
            username,
            channel: Some(channel),
            typing: TypingDebouncer::new(),
            peer_typing: PeerTyping::new(),
        });
        self.state = SessionState::Active;
    }

    /// Abandon a connect attempt; re-initiation requires a fresh `Join`
    async fn fail_connect(&mut self, message: String) {
        warn!("connect failed: {}", message);
        self.epoch += 1;
        self.state = SessionState::Unbound;
        self.session = None;
        let _ = self
            .events
            .send(SessionEvent::SessionError { message })
            .await;
    }

    /// Handle an outbound chat request
    async fn handle_send_chat(&mut self, text: String) {
        if self.state != SessionState::Active {
            let _ = self
                .events
                .send(SessionEvent::SessionError {
                    message: AppError::NotConnected.to_string(),
                })
                .await;
            return;
        }

        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.dispatch(OutboundIntent::Chat {
            content: text.to_string(),
        })
        .await;
    }

    /// Handle a local keystroke
    ///
    /// Only the debouncer's `Idle -> Active` edge produces traffic; while a
    /// burst is in progress keystrokes just refresh the trailing window.
    async fn handle_key_press(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.typing.press(Instant::now()) {
            return;
        }

        let username = session.username.to_string();
        self.dispatch(OutboundIntent::Typing { username }).await;
    }

    /// Encode an intent and send it on the current channel
    async fn dispatch(&mut self, intent: OutboundIntent) {
        let frame = match message::encode(&intent) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("failed to encode intent: {}", e);
                return;
            }
        };
        let Some(channel) = self.session.as_mut().and_then(|s| s.channel.as_mut()) else {
            let _ = self
                .events
                .send(SessionEvent::SessionError {
                    message: AppError::NotConnected.to_string(),
                })
                .await;
            return;
        };
        if let Err(e) = channel.send(frame).await {
            self.fatal(format!("send failed: {}", e)).await;
        }
    }

    /// Process one event from a channel reader
    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        if event.epoch != self.epoch {
            debug!(
                "discarding event from superseded channel (epoch {} < {})",
                event.epoch, self.epoch
            );
            return;
        }

        match event.kind {
            ChannelEventKind::Frame(frame) => self.route_frame(&frame).await,
            ChannelEventKind::Error(reason) => {
                self.fatal(format!("connection error: {}", reason)).await;
            }
            ChannelEventKind::Closed { reason } => {
                let detail = reason.unwrap_or_else(|| "connection closed".to_string());
                self.fatal(format!("{}; join a room to reconnect", detail))
                    .await;
            }
        }
    }

    /// Decode and route one inbound frame to observers
    ///
    /// Malformed frames are logged and discarded; they never end the
    /// session. Inbound `error` frames are forwarded as warnings without a
    /// state change.
    async fn route_frame(&mut self, frame: &str) {
        if self.state != SessionState::Active {
            debug!("frame received outside an active session, dropped");
            return;
        }
        let event = match message::decode(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!("discarding malformed frame: {}", e);
                return;
            }
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match event {
            InboundEvent::Chat { username, content } => {
                // A message from anyone supersedes the typing indicator.
                session.peer_typing.clear();
                let _ = self
                    .events
                    .send(SessionEvent::MessageReceived {
                        username,
                        content,
                        received_at: Local::now(),
                    })
                    .await;
            }
            InboundEvent::UserList { users } => {
                let _ = self
                    .events
                    .send(SessionEvent::UserListChanged { users })
                    .await;
            }
            InboundEvent::Typing { username } => {
                if username != session.username.as_str() {
                    session
                        .peer_typing
                        .observe(username.clone(), Instant::now());
                }
                let _ = self
                    .events
                    .send(SessionEvent::TypingObserved { username })
                    .await;
            }
            InboundEvent::Error { content } => {
                let _ = self
                    .events
                    .send(SessionEvent::SessionError { message: content })
                    .await;
            }
            InboundEvent::RoomAdded { content } => {
                let _ = self
                    .events
                    .send(SessionEvent::RoomAdded { room: content })
                    .await;
            }
        }
    }

    /// Tear down after an unrecoverable transport failure
    ///
    /// Exactly one `SessionError` reaches observers; the epoch bump orphans
    /// anything the dead channel may still emit. Recovery is a manual
    /// `Join`; there is no automatic reconnect.
    async fn fatal(&mut self, message: String) {
        warn!("session failed: {}", message);
        self.epoch += 1;
        if let Some(mut session) = self.session.take() {
            if let Some(channel) = session.channel.take() {
                tokio::spawn(channel.retire());
            }
        }
        self.state = SessionState::Unbound;
        let _ = self
            .events
            .send(SessionEvent::SessionError { message })
            .await;
    }
}
