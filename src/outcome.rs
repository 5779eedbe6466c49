//! Handler results.
//!
//! DESIGN
//! ======
//! Coordinator handlers are pure business logic: they validate, mutate room
//! state, and return an `Outcome` describing who receives what. The hub owns
//! delivery. A handler that refuses an event returns `Dropped` instead, which
//! carries a grepable code for logs and tests. Nothing is ever sent back to
//! the client for a dropped event; convergence comes from history re-sync.

use crate::frame::ErrorCode;
use crate::protocol::{RoomId, ServerEvent};

// =============================================================================
// DROPPED
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Dropped {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("malformed {event} payload: {reason}")]
    MalformedPayload { event: &'static str, reason: String },
    #[error("no room id and no current room")]
    NoRoom,
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),
    #[error("not a member of room: {0}")]
    NotInRoom(RoomId),
    #[error("empty stroke")]
    EmptyStroke,
    #[error("rate limited")]
    RateLimited,
    #[error("handler panicked")]
    Panicked,
}

impl ErrorCode for Dropped {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedFrame(_) => "E_MALFORMED_FRAME",
            Self::UnknownEvent(_) => "E_UNKNOWN_EVENT",
            Self::MalformedPayload { .. } => "E_MALFORMED_PAYLOAD",
            Self::NoRoom => "E_NO_ROOM",
            Self::UnknownRoom(_) => "E_UNKNOWN_ROOM",
            Self::NotInRoom(_) => "E_NOT_IN_ROOM",
            Self::EmptyStroke => "E_EMPTY_STROKE",
            Self::RateLimited => "E_RATE_LIMITED",
            Self::Panicked => "E_HANDLER_PANIC",
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// One delivery or group-membership step, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send to the originating connection only.
    Reply(ServerEvent),
    /// Send to every member of the room, sender included.
    Broadcast { room_id: RoomId, event: ServerEvent },
    /// Send to every member of the room except the sender.
    BroadcastExcludeSender { room_id: RoomId, event: ServerEvent },
    /// Add the sender to the room's broadcast group.
    JoinGroup(RoomId),
    /// Remove the sender from the room's broadcast group.
    LeaveGroup(RoomId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub effects: Vec<Effect>,
}

impl Outcome {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(event: ServerEvent) -> Self {
        Self::none().and_reply(event)
    }

    #[must_use]
    pub fn broadcast(room_id: &str, event: ServerEvent) -> Self {
        Self::none().and_broadcast(room_id, event)
    }

    #[must_use]
    pub fn broadcast_exclude_sender(room_id: &str, event: ServerEvent) -> Self {
        Self::none().and_broadcast_exclude_sender(room_id, event)
    }

    #[must_use]
    pub fn and_reply(mut self, event: ServerEvent) -> Self {
        self.effects.push(Effect::Reply(event));
        self
    }

    #[must_use]
    pub fn and_broadcast(mut self, room_id: &str, event: ServerEvent) -> Self {
        self.effects.push(Effect::Broadcast { room_id: room_id.to_owned(), event });
        self
    }

    #[must_use]
    pub fn and_broadcast_exclude_sender(mut self, room_id: &str, event: ServerEvent) -> Self {
        self.effects
            .push(Effect::BroadcastExcludeSender { room_id: room_id.to_owned(), event });
        self
    }

    #[must_use]
    pub fn and_join(mut self, room_id: &str) -> Self {
        self.effects.push(Effect::JoinGroup(room_id.to_owned()));
        self
    }

    #[must_use]
    pub fn and_leave(mut self, room_id: &str) -> Self {
        self.effects.push(Effect::LeaveGroup(room_id.to_owned()));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
