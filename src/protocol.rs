//! Typed events carried inside frames.
//!
//! DESIGN
//! ======
//! Inbound: `parse` turns a decoded `Frame` into an `Inbound` (optional room
//! hint + `ClientEvent`). Any payload that does not match the expected shape
//! becomes `Dropped::MalformedPayload`, which the hub logs and discards.
//!
//! Outbound: `ServerEvent` serializes straight to `{"event", "data"}` with
//! camelCase payload fields, so clients see the same envelope both ways.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::frame::Frame;
use crate::outcome::Dropped;

pub type RoomId = String;
pub type ClientId = Uuid;

// =============================================================================
// GEOMETRY
// =============================================================================

/// One sample of a freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub width: f64,
}

/// A completed stroke. Never empty; construct through `Stroke::new`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Stroke(Vec<Point>);

impl Stroke {
    /// Wrap a point sequence, rejecting empty ones.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() { None } else { Some(Self(points)) }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Absolute canvas coordinate (cursor reports, eraser samples).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

/// A present user as seen by every client in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUser {
    pub id: ClientId,
    pub name: String,
    pub color: String,
}

// =============================================================================
// INBOUND
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Join,
    Leave,
    RequestHistory,
    ClearCanvas,
    Drawing { line: Vec<Point> },
    EraseDrawing { lines: Vec<Vec<Point>> },
    ErasePath { path: Vec<CanvasPosition>, radius: f64, zoom: f64 },
    UndoRedo { lines: Vec<Vec<Point>> },
    TextUpdate { text: String, selection: Option<serde_json::Value> },
    TextDelta { text: Option<String>, version: Option<u64> },
    UserPresence { color: Option<String> },
    CursorPosition(CanvasPosition),
}

impl ClientEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leaveRoom",
            Self::RequestHistory => "requestHistory",
            Self::ClearCanvas => "clearCanvas",
            Self::Drawing { .. } => "drawing",
            Self::EraseDrawing { .. } => "eraseDrawing",
            Self::ErasePath { .. } => "erasePath",
            Self::UndoRedo { .. } => "undoRedo",
            Self::TextUpdate { .. } => "textUpdate",
            Self::TextDelta { .. } => "textDelta",
            Self::UserPresence { .. } => "userPresence",
            Self::CursorPosition(_) => "cursorPosition",
        }
    }
}

/// A parsed inbound event plus the explicit room id it named, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub room_hint: Option<RoomId>,
    pub event: ClientEvent,
}

#[derive(Deserialize)]
struct DrawingPayload {
    line: Vec<Point>,
}

#[derive(Deserialize)]
struct LinesPayload {
    lines: Vec<Vec<Point>>,
}

#[derive(Deserialize)]
struct ErasePathPayload {
    path: Vec<CanvasPosition>,
    radius: f64,
    #[serde(default)]
    zoom: Option<f64>,
}

#[derive(Deserialize)]
struct TextUpdatePayload {
    text: String,
    #[serde(default)]
    selection: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct TextDeltaPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    version: Option<u64>,
}

#[derive(Deserialize)]
struct PresencePayload {
    #[serde(default)]
    user: Option<PresenceUser>,
}

#[derive(Deserialize)]
struct PresenceUser {
    #[serde(default)]
    color: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorPayload {
    canvas_x: f64,
    canvas_y: f64,
}

/// Interpret a decoded frame.
///
/// # Errors
///
/// `Dropped::UnknownEvent` for unrecognised names and
/// `Dropped::MalformedPayload` when the payload has the wrong shape.
pub fn parse(frame: &Frame) -> Result<Inbound, Dropped> {
    let event = match frame.event.as_str() {
        "join" | "joinRoom" => ClientEvent::Join,
        "leaveRoom" => ClientEvent::Leave,
        "requestHistory" => ClientEvent::RequestHistory,
        "clearCanvas" => ClientEvent::ClearCanvas,
        "drawing" => {
            let p: DrawingPayload = payload(frame, "drawing")?;
            ClientEvent::Drawing { line: p.line }
        }
        "eraseDrawing" => {
            let p: LinesPayload = payload(frame, "eraseDrawing")?;
            ClientEvent::EraseDrawing { lines: p.lines }
        }
        "undoRedo" => {
            let p: LinesPayload = payload(frame, "undoRedo")?;
            ClientEvent::UndoRedo { lines: p.lines }
        }
        "erasePath" => {
            let p: ErasePathPayload = payload(frame, "erasePath")?;
            let zoom = p.zoom.unwrap_or(1.0);
            if !p.radius.is_finite() || p.radius < 0.0 {
                return Err(malformed("erasePath", "radius must be a non-negative number"));
            }
            if !zoom.is_finite() || zoom <= 0.0 {
                return Err(malformed("erasePath", "zoom must be a positive number"));
            }
            ClientEvent::ErasePath { path: p.path, radius: p.radius, zoom }
        }
        "textUpdate" => {
            let p: TextUpdatePayload = payload(frame, "textUpdate")?;
            ClientEvent::TextUpdate { text: p.text, selection: p.selection.filter(|s| !s.is_null()) }
        }
        "textDelta" => {
            let p: TextDeltaPayload = payload(frame, "textDelta")?;
            ClientEvent::TextDelta { text: p.text, version: p.version }
        }
        "userPresence" => {
            let p: PresencePayload = payload(frame, "userPresence")?;
            ClientEvent::UserPresence { color: p.user.and_then(|u| u.color) }
        }
        "cursorPosition" => {
            let p: CursorPayload = payload(frame, "cursorPosition")?;
            ClientEvent::CursorPosition(CanvasPosition { x: p.canvas_x, y: p.canvas_y })
        }
        other => return Err(Dropped::UnknownEvent(other.to_string())),
    };

    Ok(Inbound { room_hint: frame.room_hint().map(str::to_owned), event })
}

fn payload<T: serde::de::DeserializeOwned>(frame: &Frame, event: &'static str) -> Result<T, Dropped> {
    T::deserialize(&frame.data).map_err(|e| malformed(event, e.to_string()))
}

fn malformed(event: &'static str, reason: impl Into<String>) -> Dropped {
    Dropped::MalformedPayload { event, reason: reason.into() }
}

// =============================================================================
// OUTBOUND
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Connected {
        client_id: ClientId,
    },
    History {
        room_id: RoomId,
        lines: Vec<Stroke>,
        text: String,
    },
    Drawing {
        room_id: RoomId,
        line: Stroke,
    },
    ClearCanvas {
        room_id: RoomId,
    },
    UndoRedo {
        room_id: RoomId,
        lines: Vec<Stroke>,
    },
    TextUpdate {
        room_id: RoomId,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        selection: Option<serde_json::Value>,
    },
    CursorUpdate {
        room_id: RoomId,
        user_id: ClientId,
        canvas_x: f64,
        canvas_y: f64,
    },
    UserJoined {
        room_id: RoomId,
        user: RoomUser,
    },
    UserLeft {
        room_id: RoomId,
        user_id: ClientId,
    },
    UsersInRoom {
        room_id: RoomId,
        users: Vec<RoomUser>,
    },
}

impl ServerEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::History { .. } => "history",
            Self::Drawing { .. } => "drawing",
            Self::ClearCanvas { .. } => "clearCanvas",
            Self::UndoRedo { .. } => "undoRedo",
            Self::TextUpdate { .. } => "textUpdate",
            Self::CursorUpdate { .. } => "cursorUpdate",
            Self::UserJoined { .. } => "userJoined",
            Self::UserLeft { .. } => "userLeft",
            Self::UsersInRoom { .. } => "usersInRoom",
        }
    }

    #[must_use]
    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::CursorUpdate { .. })
    }

    /// Encode to the wire envelope.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
