use crate::geometry::PreviewPoint;

/// Turns a press/drag/release stream into per-sample pan deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerTracker {
    last: Option<PreviewPoint>,
}

impl PointerTracker {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub const fn is_dragging(&self) -> bool {
        self.last.is_some()
    }

    pub fn press(&mut self, point: PreviewPoint) {
        self.last = Some(point);
    }

    /// Returns the movement since the previous sample, or `None` when no
    /// press is active.
    pub fn drag(&mut self, point: PreviewPoint) -> Option<(f64, f64)> {
        let last = self.last?;
        self.last = Some(point);
        Some((point.x - last.x, point.y - last.y))
    }

    pub fn release(&mut self) {
        self.last = None;
    }
}
