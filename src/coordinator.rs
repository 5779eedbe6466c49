//! Room session coordinator: routes inbound events to the room stores.
//!
//! DESIGN
//! ======
//! The coordinator owns the room map (injected at construction), a small
//! session table (connection id → current room) and a member count per room. Handlers validate, mutate the
//! stores, and return an `Outcome`; they never send anything themselves.
//! A refused event comes back as `Dropped` and leaves state untouched.
//!
//! FAN-OUT
//! =======
//! - drawing, undoRedo, textUpdate, cursorPosition: other members only.
//! - eraseDrawing / erasePath: full `history` to every member, sender
//!   included, because the erase was computed against a possibly stale copy.
//! - clearCanvas: every member.
//! - userPresence: full user list to every member, plus `userJoined` to the
//!   others the first time an identity announces.
//!
//! LIFECYCLE
//! =========
//! Idle → Joined on join (leaving any previous room first). Re-joining the
//! current room only re-sends history. Joined → Idle on disconnect or an
//! explicit leave, which removes presence and cursor and, once the room has
//! no members left, purges presence numbering and starts the idle clock.
//!
//! Presence and cursors are only accepted for the sender's current room, so
//! departing that one room is enough to clear everything it left behind.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::outcome::{Dropped, Outcome};
use crate::protocol::{CanvasPosition, ClientEvent, ClientId, Inbound, Point, RoomId, ServerEvent};
use crate::state::{RoomState, RoomStats, Rooms};

pub struct Coordinator {
    rooms: Rooms,
    sessions: HashMap<ClientId, RoomId>,
    /// Connections per room; rooms with no members have no entry.
    members: HashMap<RoomId, usize>,
}

impl Coordinator {
    #[must_use]
    pub fn new(rooms: Rooms) -> Self {
        Self { rooms, sessions: HashMap::new(), members: HashMap::new() }
    }

    #[must_use]
    pub fn rooms(&self) -> &Rooms {
        &self.rooms
    }

    #[must_use]
    pub fn current_room(&self, client_id: ClientId) -> Option<&str> {
        self.sessions.get(&client_id).map(String::as_str)
    }

    /// Number of connections whose current room is `room_id`.
    #[must_use]
    pub fn members(&self, room_id: &str) -> usize {
        self.members.get(room_id).copied().unwrap_or(0)
    }

    // =========================================================================
    // CONNECTION LIFECYCLE
    // =========================================================================

    /// Greet a new connection with its identity.
    #[must_use]
    pub fn connect(&self, client_id: ClientId) -> Outcome {
        Outcome::reply(ServerEvent::Connected { client_id })
    }

    /// Tear down a connection's room membership. Group membership is removed
    /// by the transport.
    pub fn disconnect(&mut self, client_id: ClientId) -> Outcome {
        let Some(room_id) = self.exit(client_id) else {
            return Outcome::none();
        };
        info!(%client_id, %room_id, remaining = self.members(&room_id), "client left room on disconnect");
        self.depart(client_id, &room_id)
    }

    /// Dispatch one parsed event.
    ///
    /// # Errors
    ///
    /// Returns the reason the event was dropped; state is unchanged.
    pub fn handle(&mut self, client_id: ClientId, inbound: Inbound) -> Result<Outcome, Dropped> {
        let Inbound { room_hint, event } = inbound;
        match event {
            ClientEvent::Join => self.join(client_id, room_hint),
            ClientEvent::Leave => self.leave(client_id, room_hint),
            ClientEvent::RequestHistory => self.request_history(client_id, room_hint),
            ClientEvent::Drawing { line } => self.drawing(client_id, room_hint, line),
            ClientEvent::EraseDrawing { lines } => self.erase_drawing(client_id, room_hint, lines),
            ClientEvent::ErasePath { path, radius, zoom } => self.erase_path(client_id, room_hint, &path, radius, zoom),
            ClientEvent::ClearCanvas => self.clear_canvas(client_id, room_hint),
            ClientEvent::UndoRedo { lines } => self.undo_redo(client_id, room_hint, lines),
            ClientEvent::TextUpdate { text, selection } => self.text_update(client_id, room_hint, text, selection),
            ClientEvent::TextDelta { text, version } => self.text_delta(client_id, room_hint, text, version),
            ClientEvent::UserPresence { color } => self.user_presence(client_id, room_hint, color.as_deref()),
            ClientEvent::CursorPosition(position) => self.cursor_position(client_id, room_hint, position),
        }
    }

    // =========================================================================
    // JOIN / LEAVE / HISTORY
    // =========================================================================

    fn join(&mut self, client_id: ClientId, hint: Option<RoomId>) -> Result<Outcome, Dropped> {
        let room_id = self.resolve_room(client_id, hint)?;
        let mut outcome = Outcome::none();

        if self.current_room(client_id) == Some(room_id.as_str()) {
            debug!(%client_id, %room_id, "re-join of current room; resending history");
        } else {
            if let Some(previous) = self.exit(client_id) {
                info!(%client_id, from = %previous, to = %room_id, "client switching rooms");
                outcome = self.depart(client_id, &previous).and_leave(&previous);
            }
            self.rooms.get_or_create(&room_id).empty_since = None;
            self.enter(client_id, &room_id);
            info!(%client_id, %room_id, members = self.members(&room_id), "client joined room");
            outcome = outcome.and_join(&room_id);
        }

        Ok(outcome.and_reply(self.history(&room_id)))
    }

    fn leave(&mut self, client_id: ClientId, hint: Option<RoomId>) -> Result<Outcome, Dropped> {
        let Some(current) = self.sessions.get(&client_id).cloned() else {
            return Err(Dropped::NoRoom);
        };
        if let Some(hint) = hint.filter(|h| *h != current) {
            return Err(Dropped::NotInRoom(hint));
        }
        self.exit(client_id);
        info!(%client_id, room_id = %current, remaining = self.members(&current), "client left room");
        Ok(self.depart(client_id, &current).and_leave(&current))
    }

    fn request_history(&mut self, client_id: ClientId, hint: Option<RoomId>) -> Result<Outcome, Dropped> {
        let room_id = self.resolve_room(client_id, hint)?;
        debug!(%client_id, %room_id, "history requested");
        Ok(Outcome::reply(self.history(&room_id)))
    }

    /// Full-state snapshot. Unknown rooms read as empty without being created.
    fn history(&self, room_id: &str) -> ServerEvent {
        let (lines, text) = match self.rooms.get(room_id) {
            Some(room) => (room.strokes.lines().to_vec(), room.text.get().to_owned()),
            None => (Vec::new(), String::new()),
        };
        ServerEvent::History { room_id: room_id.to_owned(), lines, text }
    }

    /// Remove a connection's presence and cursor from a room it no longer
    /// belongs to. The session entry must already be gone.
    fn depart(&mut self, client_id: ClientId, room_id: &str) -> Outcome {
        let remaining = self.members(room_id);
        let Some(room) = self.rooms.get_mut(room_id) else {
            return Outcome::none();
        };

        room.cursors.remove(client_id);
        room.presence.remove(client_id);
        let outcome = Outcome::broadcast_exclude_sender(room_id, ServerEvent::UserLeft {
            room_id: room_id.to_owned(),
            user_id: client_id,
        })
        .and_broadcast_exclude_sender(room_id, ServerEvent::UsersInRoom {
            room_id: room_id.to_owned(),
            users: room.presence.users().to_vec(),
        });

        if remaining == 0 {
            room.presence.purge();
            room.cursors.clear();
            room.empty_since = Some(Instant::now());
            debug!(%room_id, "room is empty; presence numbering purged");
        }
        outcome
    }

    // =========================================================================
    // STROKES
    // =========================================================================

    fn drawing(&mut self, client_id: ClientId, hint: Option<RoomId>, line: Vec<Point>) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.room_mut(client_id, hint)?;
        let line = room.strokes.append(line)?.clone();
        debug!(%client_id, %room_id, points = line.len(), strokes = room.strokes.len(), "stroke appended");
        Ok(Outcome::broadcast_exclude_sender(&room_id, ServerEvent::Drawing { room_id: room_id.clone(), line }))
    }

    fn erase_drawing(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
        lines: Vec<Vec<Point>>,
    ) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.room_mut(client_id, hint)?;
        let filtered = room.strokes.replace_all(lines);
        debug!(%client_id, %room_id, strokes = room.strokes.len(), filtered, "strokes replaced by erase");
        let history = snapshot(&room_id, room);
        Ok(Outcome::broadcast(&room_id, history))
    }

    fn erase_path(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
        path: &[CanvasPosition],
        radius: f64,
        zoom: f64,
    ) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.room_mut(client_id, hint)?;
        if !room.strokes.erase_path(path, radius, zoom) {
            trace!(%client_id, %room_id, "erase path touched nothing");
            return Ok(Outcome::none());
        }
        debug!(%client_id, %room_id, strokes = room.strokes.len(), "strokes erased server-side");
        let history = snapshot(&room_id, room);
        Ok(Outcome::broadcast(&room_id, history))
    }

    fn clear_canvas(&mut self, client_id: ClientId, hint: Option<RoomId>) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.room_mut(client_id, hint)?;
        room.strokes.clear();
        info!(%client_id, %room_id, "canvas cleared");
        Ok(Outcome::broadcast(&room_id, ServerEvent::ClearCanvas { room_id: room_id.clone() }))
    }

    fn undo_redo(&mut self, client_id: ClientId, hint: Option<RoomId>, lines: Vec<Vec<Point>>) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.room_mut(client_id, hint)?;
        room.strokes.undo_redo_replace(lines);
        debug!(%client_id, %room_id, strokes = room.strokes.len(), "strokes replaced by undo/redo");
        let lines = room.strokes.lines().to_vec();
        Ok(Outcome::broadcast_exclude_sender(&room_id, ServerEvent::UndoRedo { room_id: room_id.clone(), lines }))
    }

    // =========================================================================
    // TEXT
    // =========================================================================

    fn text_update(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
        text: String,
        selection: Option<serde_json::Value>,
    ) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.room_mut(client_id, hint)?;
        let text = room.text.set_full(text).to_owned();
        debug!(%client_id, %room_id, version = room.text.version(), len = text.len(), "text replaced");
        Ok(Outcome::broadcast_exclude_sender(&room_id, ServerEvent::TextUpdate {
            room_id: room_id.clone(),
            text,
            selection,
        }))
    }

    fn text_delta(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
        text: Option<String>,
        version: Option<u64>,
    ) -> Result<Outcome, Dropped> {
        if let Some(text) = text {
            return self.text_update(client_id, hint, text, None);
        }

        let (room_id, room) = self.room_mut(client_id, hint)?;
        warn!(
            %client_id,
            %room_id,
            client_version = ?version,
            server_version = room.text.version(),
            "text delta without full text; re-syncing room"
        );
        let history = snapshot(&room_id, room);
        Ok(Outcome::broadcast(&room_id, history))
    }

    // =========================================================================
    // PRESENCE / CURSOR
    // =========================================================================

    fn user_presence(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
        color: Option<&str>,
    ) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.member_room_mut(client_id, hint)?;
        let announced = room.presence.announce(client_id, color);
        info!(%client_id, %room_id, name = %announced.user.name, is_new = announced.is_new, "presence announced");

        let mut outcome = Outcome::broadcast(&room_id, ServerEvent::UsersInRoom {
            room_id: room_id.clone(),
            users: room.presence.users().to_vec(),
        });
        if announced.is_new {
            outcome = outcome.and_broadcast_exclude_sender(&room_id, ServerEvent::UserJoined {
                room_id: room_id.clone(),
                user: announced.user,
            });
        }
        Ok(outcome)
    }

    fn cursor_position(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
        position: CanvasPosition,
    ) -> Result<Outcome, Dropped> {
        let (room_id, room) = self.member_room_mut(client_id, hint)?;
        room.cursors.update(client_id, position);
        trace!(%client_id, %room_id, x = position.x, y = position.y, "cursor moved");
        Ok(Outcome::broadcast_exclude_sender(&room_id, ServerEvent::CursorUpdate {
            room_id: room_id.clone(),
            user_id: client_id,
            canvas_x: position.x,
            canvas_y: position.y,
        }))
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Evict rooms that have been empty for longer than `ttl`.
    pub fn sweep(&mut self, now: Instant, ttl: Duration) -> Vec<RoomId> {
        let evicted = self.rooms.evict_idle(now, ttl);
        for room_id in &evicted {
            info!(%room_id, "evicted idle room");
        }
        evicted
    }

    #[must_use]
    pub fn stats(&self) -> Vec<RoomStats> {
        let mut stats: Vec<RoomStats> = self
            .rooms
            .iter()
            .map(|(room_id, room)| RoomStats {
                room_id: room_id.clone(),
                members: self.members(room_id),
                strokes: room.strokes.len(),
                text_length: room.text.get().len(),
                users: room.presence.users().len(),
            })
            .collect();
        stats.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        stats
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Explicit room id wins, else the connection's current room.
    fn resolve_room(&self, client_id: ClientId, hint: Option<RoomId>) -> Result<RoomId, Dropped> {
        hint.filter(|h| !h.is_empty())
            .or_else(|| self.sessions.get(&client_id).cloned())
            .ok_or(Dropped::NoRoom)
    }

    fn enter(&mut self, client_id: ClientId, room_id: &str) {
        self.sessions.insert(client_id, room_id.to_owned());
        *self.members.entry(room_id.to_owned()).or_default() += 1;
    }

    /// Drop the session entry and return the room it pointed at.
    fn exit(&mut self, client_id: ClientId) -> Option<RoomId> {
        let room_id = self.sessions.remove(&client_id)?;
        if let Some(count) = self.members.get_mut(&room_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.members.remove(&room_id);
            }
        }
        Some(room_id)
    }

    /// Resolve a room that must already exist (mutations).
    fn room_mut(&mut self, client_id: ClientId, hint: Option<RoomId>) -> Result<(RoomId, &mut RoomState), Dropped> {
        let room_id = self.resolve_room(client_id, hint)?;
        match self.rooms.get_mut(&room_id) {
            Some(room) => Ok((room_id, room)),
            None => Err(Dropped::UnknownRoom(room_id)),
        }
    }

    /// Like `room_mut`, but the room must also be the sender's current room.
    /// Per-connection entries (presence, cursor) are only cleaned up there.
    fn member_room_mut(
        &mut self,
        client_id: ClientId,
        hint: Option<RoomId>,
    ) -> Result<(RoomId, &mut RoomState), Dropped> {
        let room_id = self.resolve_room(client_id, hint)?;
        if !self.rooms.contains(&room_id) {
            return Err(Dropped::UnknownRoom(room_id));
        }
        if self.current_room(client_id) != Some(room_id.as_str()) {
            return Err(Dropped::NotInRoom(room_id));
        }
        self.room_mut(client_id, Some(room_id))
    }
}

fn snapshot(room_id: &str, room: &RoomState) -> ServerEvent {
    ServerEvent::History {
        room_id: room_id.to_owned(),
        lines: room.strokes.lines().to_vec(),
        text: room.text.get().to_owned(),
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
