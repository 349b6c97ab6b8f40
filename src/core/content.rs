//! The interactive application hosted by a pane.
//!
//! vmux never parses escape sequences or spawns processes. Whatever runs in a
//! pane (a shell, an editor) implements `PaneContent` and hands the
//! multiplexer finished frames.

use super::frame::Frame;
use super::key::Key;

/// Result of feeding one key to a content session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Continue,
    /// The underlying program has exited; the pane should close
    Exited,
}

pub trait PaneContent {
    /// Process one key
    fn feed_key(&mut self, key: &Key) -> Lifecycle;

    /// Current screen, `cols` x `rows`
    fn render_frame(&self) -> Frame;

    /// Current size as (cols, rows)
    fn size(&self) -> (u16, u16);

    /// Set a new size; the multiplexer only calls this on an actual change
    fn set_size(&mut self, cols: u16, rows: u16);

    /// Lines scrolled off the top of the screen, oldest first
    fn history(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Creates a content session of the given (cols, rows)
pub type PaneFactory = Box<dyn FnMut(u16, u16) -> Box<dyn PaneContent>>;
