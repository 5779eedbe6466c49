//! Real-time collaborative room server.
//!
//! ARCHITECTURE
//! ============
//! Clients join named rooms over a websocket and share four kinds of state:
//! freehand strokes, one rich-text document, presence, and cursors. Every
//! inbound event flows through a single hub task (`hub`) into the room
//! session coordinator (`coordinator`), which mutates the per-room stores
//! (`services`) and returns the fan-out it wants. New joiners always receive
//! a full snapshot, so late arrivals converge without replaying deltas.
//!
//! State lives in memory only.

pub mod config;
pub mod coordinator;
pub mod frame;
pub mod hub;
pub mod outcome;
pub mod protocol;
pub mod rate_limit;
pub mod routes;
pub mod services;
pub mod state;
