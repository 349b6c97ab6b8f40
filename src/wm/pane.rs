//! Pane - A single content session within a window

use std::fmt;

use tracing::debug;

use super::layout::Rect;
use crate::core::content::{Lifecycle, PaneContent, PaneFactory};
use crate::core::frame::Frame;
use crate::core::key::Key;

/// Unique identifier for a pane
pub type PaneId = u64;

/// A single pane owning one content session
pub struct Pane {
    /// Unique identifier
    pub id: PaneId,
    /// Displayed box in absolute content-area coordinates
    pub rect: Rect,
    content: Box<dyn PaneContent>,
}

impl Pane {
    pub fn new(id: PaneId, content: Box<dyn PaneContent>) -> Self {
        let (cols, rows) = content.size();
        Self {
            id,
            rect: Rect::new(0, 0, cols, rows),
            content,
        }
    }

    /// Move the pane to `rect`, resizing the session only when its size
    /// actually changes
    pub fn apply_geometry(&mut self, rect: Rect) {
        self.rect = rect;
        if self.content.size() != (rect.width, rect.height) {
            self.content.set_size(rect.width, rect.height);
        }
    }

    /// Re-apply the current box, e.g. after the session was swapped in
    pub fn refit(&mut self) {
        self.apply_geometry(self.rect);
    }

    pub fn feed_key(&mut self, key: &Key) -> Lifecycle {
        self.content.feed_key(key)
    }

    pub fn render_frame(&self) -> Frame {
        self.content.render_frame()
    }

    pub fn history(&self) -> Vec<String> {
        self.content.history()
    }

    pub fn content_size(&self) -> (u16, u16) {
        self.content.size()
    }

    /// Exchange content sessions with another pane; geometry stays put
    pub fn swap_content(&mut self, other: &mut Pane) {
        std::mem::swap(&mut self.content, &mut other.content);
        self.refit();
        other.refit();
    }
}

impl fmt::Debug for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pane")
            .field("id", &self.id)
            .field("rect", &self.rect)
            .finish_non_exhaustive()
    }
}

/// Creates panes through the injected content factory, handing out ids
/// unique across the whole multiplexer
pub struct PaneSpawner {
    factory: PaneFactory,
    next_id: PaneId,
}

impl PaneSpawner {
    pub fn new(factory: PaneFactory) -> Self {
        Self { factory, next_id: 1 }
    }

    pub fn spawn(&mut self, cols: u16, rows: u16) -> Pane {
        let id = self.next_id;
        self.next_id += 1;
        debug!(pane = id, cols, rows, "spawning pane");
        Pane::new(id, (self.factory)(cols, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::echo::EchoSession;

    fn spawner() -> PaneSpawner {
        PaneSpawner::new(Box::new(|cols, rows| Box::new(EchoSession::new(cols, rows))))
    }

    #[test]
    fn test_spawner_hands_out_fresh_ids() {
        let mut spawner = spawner();
        let a = spawner.spawn(10, 5);
        let b = spawner.spawn(10, 5);
        assert_ne!(a.id, b.id);
        assert_eq!(a.rect, Rect::new(0, 0, 10, 5));
    }

    #[test]
    fn test_geometry_resizes_content() {
        let mut pane = spawner().spawn(10, 5);
        pane.apply_geometry(Rect::new(2, 3, 20, 4));
        assert_eq!(pane.content_size(), (20, 4));
        let frame = pane.render_frame();
        assert_eq!((frame.cols, frame.rows), (20, 4));
    }

    #[test]
    fn test_swap_content_keeps_geometry() {
        let mut spawner = spawner();
        let mut left = spawner.spawn(10, 5);
        let mut right = spawner.spawn(10, 5);
        right.apply_geometry(Rect::new(0, 11, 6, 5));
        for c in "abc".chars() {
            left.feed_key(&Key::Char(c));
        }

        left.swap_content(&mut right);
        assert_eq!(right.rect, Rect::new(0, 11, 6, 5));
        assert_eq!(right.content_size(), (6, 5));
        assert_eq!(left.content_size(), (10, 5));
        assert_eq!(right.render_frame().row_text(0), "$ abc ");
    }
}
