//! Stroke store: ordered freehand strokes for one room, plus eraser geometry.
//!
//! DESIGN
//! ======
//! Strokes are immutable once appended. The only ways to change existing
//! strokes are a whole-list replace (client-computed erase or undo/redo
//! result), a server-side erase against the stored list, or a clear.
//! Every stored stroke has at least one point; empties are rejected on append
//! and filtered out on replace.
//!
//! ERASER
//! ======
//! A point is erased when its distance to any eraser sample is within the
//! effective radius (`radius / zoom`, so the perceived eraser size does not
//! change with view zoom). A run of erased points splits a stroke; every
//! surviving run becomes its own stroke and keeps its points' color and width.

use crate::outcome::Dropped;
use crate::protocol::{CanvasPosition, Point, Stroke};

#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    lines: Vec<Stroke>,
}

impl StrokeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[Stroke] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append one completed stroke and return it for broadcast.
    ///
    /// # Errors
    ///
    /// `Dropped::EmptyStroke` when `points` is empty; the store is untouched.
    pub fn append(&mut self, points: Vec<Point>) -> Result<&Stroke, Dropped> {
        let stroke = Stroke::new(points).ok_or(Dropped::EmptyStroke)?;
        self.lines.push(stroke);
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Replace the whole list with a client-computed erase result.
    /// Returns the number of empty strokes that were filtered out.
    pub fn replace_all(&mut self, lines: Vec<Vec<Point>>) -> usize {
        let total = lines.len();
        self.lines = lines.into_iter().filter_map(Stroke::new).collect();
        total - self.lines.len()
    }

    /// Same store semantics as `replace_all`; only the fan-out differs
    /// (undo/redo goes to other members, erase goes to everyone).
    pub fn undo_redo_replace(&mut self, lines: Vec<Vec<Point>>) -> usize {
        self.replace_all(lines)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Erase against the stored strokes. Returns true if anything changed;
    /// when nothing is within reach the list is left exactly as it was.
    pub fn erase_path(&mut self, path: &[CanvasPosition], radius: f64, zoom: f64) -> bool {
        let threshold = effective_radius(radius, zoom);
        match erase(&self.lines, path, threshold) {
            Some(lines) => {
                self.lines = lines;
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Eraser radius in canvas units for the given view zoom.
#[must_use]
pub fn effective_radius(radius: f64, zoom: f64) -> f64 {
    if zoom > 0.0 { radius / zoom } else { radius }
}

fn is_erased(point: &Point, path: &[CanvasPosition], threshold: f64) -> bool {
    path.iter().any(|sample| {
        let dx = point.x - sample.x;
        let dy = point.y - sample.y;
        dx.hypot(dy) <= threshold
    })
}

/// Split one stroke around erased points. Returns `None` if no point was hit.
#[must_use]
pub fn erase_stroke(stroke: &Stroke, path: &[CanvasPosition], threshold: f64) -> Option<Vec<Stroke>> {
    let mut hit = false;
    let mut pieces = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for point in stroke.points() {
        if is_erased(point, path, threshold) {
            hit = true;
            if let Some(piece) = Stroke::new(std::mem::take(&mut current)) {
                pieces.push(piece);
            }
        } else {
            current.push(point.clone());
        }
    }

    if !hit {
        return None;
    }
    if let Some(piece) = Stroke::new(current) {
        pieces.push(piece);
    }
    Some(pieces)
}

/// Apply an eraser path to a stroke list, preserving order.
/// Returns `None` when no stroke was touched.
#[must_use]
pub fn erase(lines: &[Stroke], path: &[CanvasPosition], threshold: f64) -> Option<Vec<Stroke>> {
    if path.is_empty() {
        return None;
    }

    let mut changed = false;
    let mut out = Vec::with_capacity(lines.len());
    for stroke in lines {
        match erase_stroke(stroke, path, threshold) {
            Some(pieces) => {
                changed = true;
                out.extend(pieces);
            }
            None => out.push(stroke.clone()),
        }
    }

    changed.then_some(out)
}

#[cfg(test)]
#[path = "strokes_test.rs"]
mod tests;
