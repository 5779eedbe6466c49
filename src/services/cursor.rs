//! Cursor tracker: last known pointer position per user.
//!
//! DESIGN
//! ======
//! Positions are ephemeral: overwritten on every report, removed on leave or
//! disconnect, never replayed to joiners. Last report wins; a stale report
//! from a slow connection self-corrects on the next one. Throttling is the
//! client's job.

use std::collections::HashMap;

use crate::protocol::{CanvasPosition, ClientId};

#[derive(Debug, Clone, Default)]
pub struct CursorTracker {
    positions: HashMap<ClientId, CanvasPosition>,
}

impl CursorTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, client_id: ClientId, position: CanvasPosition) {
        self.positions.insert(client_id, position);
    }

    pub fn remove(&mut self, client_id: ClientId) -> Option<CanvasPosition> {
        self.positions.remove(&client_id)
    }

    #[must_use]
    pub fn get(&self, client_id: ClientId) -> Option<CanvasPosition> {
        self.positions.get(&client_id).copied()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn update_overwrites_previous_position() {
        let mut cursors = CursorTracker::new();
        let a = Uuid::new_v4();
        cursors.update(a, CanvasPosition { x: 1.0, y: 1.0 });
        cursors.update(a, CanvasPosition { x: 9.0, y: -3.0 });
        assert_eq!(cursors.get(a), Some(CanvasPosition { x: 9.0, y: -3.0 }));
        assert_eq!(cursors.len(), 1);
    }

    #[test]
    fn remove_forgets_user() {
        let mut cursors = CursorTracker::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cursors.update(a, CanvasPosition { x: 1.0, y: 1.0 });
        cursors.update(b, CanvasPosition { x: 2.0, y: 2.0 });

        assert!(cursors.remove(a).is_some());
        assert!(cursors.remove(a).is_none());
        assert_eq!(cursors.get(a), None);
        assert!(cursors.get(b).is_some());
    }

    #[test]
    fn clear_empties_tracker() {
        let mut cursors = CursorTracker::new();
        cursors.update(Uuid::new_v4(), CanvasPosition { x: 0.0, y: 0.0 });
        cursors.clear();
        assert!(cursors.is_empty());
    }
}
