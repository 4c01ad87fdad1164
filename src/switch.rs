//! Room switch coordination
//!
//! Sequences the teardown of the old session and bring-up of the new one so
//! that no stale event from the old room can reach observers: the old
//! channel's event stream is orphaned (epoch bump) before its close is even
//! issued, then the close gets a bounded wait, and only afterwards is the
//! new channel requested.

use tracing::{debug, info, warn};

use crate::session::{ChatSession, SessionEvent, SessionState};
use crate::types::RoomName;

impl ChatSession {
    /// Leave the current room and join `new_room`
    ///
    /// No-op when `new_room` equals the current room. Only valid while
    /// `Active`; in any other state the request is logged and dropped.
    pub(crate) async fn handle_switch_room(&mut self, new_room: RoomName) {
        if self.state != SessionState::Active {
            warn!(
                "switch to '{}' ignored, no active session (state {:?})",
                new_room, self.state
            );
            return;
        }
        let Some(mut session) = self.session.take() else {
            warn!("switch to '{}' ignored, no session", new_room);
            return;
        };
        if session.room == new_room {
            debug!("already in room '{}', switch is a no-op", new_room);
            self.session = Some(session);
            return;
        }

        info!("switching rooms: '{}' -> '{}'", session.room, new_room);

        // Transient state tied to the old room dies with its Session; the
        // room change is announced before the new channel can deliver its
        // first frame, so the presentation clears stale indicators in time.
        let _ = self
            .events
            .send(SessionEvent::RoomChanged {
                room: new_room.clone(),
            })
            .await;

        self.state = SessionState::Closing;
        // Orphan the old channel before closing it. From here on, events it
        // already queued carry a stale epoch and are discarded on arrival,
        // independent of any close race.
        self.epoch += 1;
        if let Some(channel) = session.channel.take() {
            channel.retire().await;
        }

        let username = session.username.clone();
        drop(session);

        self.connect(username, new_room).await;
    }
}
