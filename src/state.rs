//! Room state.
//!
//! DESIGN
//! ======
//! `Rooms` is the explicit room-id → `RoomState` map owned by the coordinator.
//! A room is created on first join with all four stores empty, so no room is
//! ever partially initialised. Rooms are only removed by the idle sweep; with
//! eviction disabled they live for the whole process.
//!
//! Only the hub task touches this map, one event at a time, so it needs no
//! locking. `AppState` is what the HTTP layer sees: a handle to that task and
//! the server config.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ServerConfig;
use crate::hub::HubHandle;
use crate::protocol::RoomId;
use crate::services::cursor::CursorTracker;
use crate::services::presence::PresenceRegistry;
use crate::services::strokes::StrokeStore;
use crate::services::text::TextStore;

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room collaborative state.
#[derive(Debug)]
pub struct RoomState {
    pub strokes: StrokeStore,
    pub text: TextStore,
    pub presence: PresenceRegistry,
    pub cursors: CursorTracker,
    /// When the member count last dropped to zero. `None` while occupied.
    pub empty_since: Option<Instant>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strokes: StrokeStore::new(),
            text: TextStore::new(),
            presence: PresenceRegistry::new(),
            cursors: CursorTracker::new(),
            empty_since: None,
        }
    }

    /// True when the room has had no members for longer than `ttl`.
    #[must_use]
    pub fn idle_longer_than(&self, now: Instant, ttl: Duration) -> bool {
        self.empty_since
            .is_some_and(|since| now.saturating_duration_since(since) > ttl)
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary row for the room stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub room_id: RoomId,
    pub members: usize,
    pub strokes: usize,
    pub text_length: usize,
    pub users: usize,
}

// =============================================================================
// ROOMS
// =============================================================================

#[derive(Debug, Default)]
pub struct Rooms {
    rooms: HashMap<RoomId, RoomState>,
}

impl Rooms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a room, creating it with empty stores on first touch.
    pub fn get_or_create(&mut self, room_id: &str) -> &mut RoomState {
        self.rooms.entry(room_id.to_owned()).or_default()
    }

    #[must_use]
    pub fn get(&self, room_id: &str) -> Option<&RoomState> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut RoomState> {
        self.rooms.get_mut(room_id)
    }

    #[must_use]
    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RoomId, &RoomState)> {
        self.rooms.iter()
    }

    /// Remove rooms that have been empty for longer than `ttl`.
    /// Returns the evicted room ids.
    pub fn evict_idle(&mut self, now: Instant, ttl: Duration) -> Vec<RoomId> {
        let idle: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.idle_longer_than(now, ttl))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &idle {
            self.rooms.remove(id);
        }
        idle
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(hub: HubHandle, config: ServerConfig) -> Self {
        Self { hub, config: Arc::new(config) }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
