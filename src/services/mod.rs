//! Room stores and background services.
//!
//! ARCHITECTURE
//! ============
//! Each store owns one slice of a room's state and knows nothing about
//! connections or delivery. The coordinator composes them per room; the
//! eviction task drives periodic maintenance through the hub.

pub mod cursor;
pub mod eviction;
pub mod presence;
pub mod strokes;
pub mod text;
