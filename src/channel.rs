//! Transport channel
//!
//! Owns one WebSocket connection bound to exactly one room. Inbound frames
//! are pushed into the session's event queue by a spawned reader task; the
//! write half stays with the handle. Channels are never reused across rooms:
//! switching always retires the old handle and opens a fresh one.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error};
use url::Url;

use crate::error::AppError;
use crate::types::RoomName;

/// Bounded wait for the reader task to wind down after a close is issued.
/// A hung connection must not stall a room switch.
pub const CLOSE_GRACE: Duration = Duration::from_secs(3);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// One event produced by a channel's reader task
///
/// The epoch identifies which `open` call produced the event, so the
/// session can discard anything from a superseded channel.
#[derive(Debug)]
pub struct ChannelEvent {
    pub epoch: u64,
    pub kind: ChannelEventKind,
}

#[derive(Debug)]
pub enum ChannelEventKind {
    /// A text frame arrived
    Frame(String),
    /// Transport-level failure; a `Closed` event follows
    Error(String),
    /// The connection is gone; terminal for the channel
    Closed { reason: Option<String> },
}

/// Handle to one open transport connection
///
/// Bound 1:1 to a room for its lifetime.
#[derive(Debug)]
pub struct ChatChannel {
    room: RoomName,
    sink: WsSink,
    reader: JoinHandle<()>,
}

impl ChatChannel {
    /// Establish a connection for `room` and start its reader task
    ///
    /// The room name travels as an encoded `room` query parameter. Every
    /// event the reader emits is tagged with `epoch`.
    pub async fn open(
        endpoint: &Url,
        room: &RoomName,
        epoch: u64,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, AppError> {
        let mut target = endpoint.clone();
        target.query_pairs_mut().append_pair("room", room.as_str());

        let (ws_stream, _response) = connect_async(target.as_str()).await?;
        debug!(%room, epoch, "channel open");

        let (sink, mut stream) = ws_stream.split();

        let reader_room = room.clone();
        let reader = tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        let event = ChannelEvent {
                            epoch,
                            kind: ChannelEventKind::Frame(text.to_string()),
                        };
                        if events.send(event).await.is_err() {
                            debug!(room = %reader_room, "session gone, ending reader task");
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        debug!(room = %reader_room, "server sent close frame");
                        let reason = frame.map(|f| f.reason.to_string());
                        let _ = events
                            .send(ChannelEvent {
                                epoch,
                                kind: ChannelEventKind::Closed { reason },
                            })
                            .await;
                        return;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                        // Pong is handled by tungstenite
                    }
                    Ok(_) => {
                        // Binary frames are not part of the protocol
                    }
                    Err(e) => {
                        error!(room = %reader_room, "WebSocket error: {}", e);
                        let _ = events
                            .send(ChannelEvent {
                                epoch,
                                kind: ChannelEventKind::Error(e.to_string()),
                            })
                            .await;
                        let _ = events
                            .send(ChannelEvent {
                                epoch,
                                kind: ChannelEventKind::Closed { reason: None },
                            })
                            .await;
                        return;
                    }
                }
            }
            debug!(room = %reader_room, "stream ended");
            let _ = events
                .send(ChannelEvent {
                    epoch,
                    kind: ChannelEventKind::Closed { reason: None },
                })
                .await;
        });

        Ok(Self {
            room: room.clone(),
            sink,
            reader,
        })
    }

    /// The room this channel is bound to
    pub fn room(&self) -> &RoomName {
        &self.room
    }

    /// Send one text frame
    pub async fn send(&mut self, frame: String) -> Result<(), AppError> {
        self.sink.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    /// Close the connection and wait (bounded) for the reader to finish
    ///
    /// Consuming the handle makes reuse impossible. The reader is aborted
    /// if the peer does not complete the close handshake within
    /// [`CLOSE_GRACE`].
    pub async fn retire(mut self) {
        debug!(room = %self.room, "retiring channel");
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
        if tokio::time::timeout(CLOSE_GRACE, &mut self.reader)
            .await
            .is_err()
        {
            debug!(room = %self.room, "reader did not stop in time, aborting");
            self.reader.abort();
        }
    }
}
