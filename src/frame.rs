//! Frame: the wire envelope for every websocket message.
//!
//! ARCHITECTURE
//! ============
//! Every message in either direction is one JSON text frame shaped
//! `{"event": <name>, "data": <payload>}`. The hub decodes inbound text into
//! a `Frame`, and `protocol::ClientEvent` interprets the payload by event name.
//! Outbound `protocol::ServerEvent` values serialize to the same shape.
//!
//! DESIGN
//! ======
//! - `data` is kept as raw JSON here. Payload shape checks belong to the
//!   protocol layer so that a bad payload drops one event, never the frame
//!   decoder.
//! - Room routing never inspects `data` at this layer; see `room_hint`.

use serde::Deserialize;

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// Payload key carrying the target room.
pub const FRAME_ROOM_ID: &str = "roomId";

// =============================================================================
// TYPES
// =============================================================================

/// The universal message envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has an empty event name")]
    EmptyEvent,
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code for structured drop logs.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

impl ErrorCode for FrameError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Json(_) => "E_FRAME_JSON",
            Self::EmptyEvent => "E_FRAME_EVENT",
        }
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl Frame {
    /// Decode one inbound text message.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Json` for anything that is not a `{event, data}`
    /// object and `FrameError::EmptyEvent` when the event name is blank.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let frame: Frame = serde_json::from_str(text)?;
        if frame.event.trim().is_empty() {
            return Err(FrameError::EmptyEvent);
        }
        Ok(frame)
    }

    #[cfg(test)]
    pub(crate) fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self { event: event.into(), data }
    }
}

// =============================================================================
// ROUTING
// =============================================================================

impl Frame {
    /// Explicit room id carried by the payload, if any.
    ///
    /// A bare string payload counts as a room id (the `joinRoom` form).
    /// Empty strings are treated as absent so the current room applies.
    #[must_use]
    pub fn room_hint(&self) -> Option<&str> {
        let room = match &self.data {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map.get(FRAME_ROOM_ID).and_then(serde_json::Value::as_str),
            _ => None,
        };
        room.filter(|r| !r.is_empty())
    }

    /// Cursor frames are high-frequency and logged at trace level only.
    #[must_use]
    pub fn is_cursor(&self) -> bool {
        self.event == "cursorPosition"
    }
}

// =============================================================================
// TESTS
// =============================================================================
