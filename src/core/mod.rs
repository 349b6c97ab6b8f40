//! Core pane-content model.
//!
//! This module holds everything a pane exchanges with the program it hosts:
//!
//! - **key**: normalized key tokens fed into the multiplexer and panes
//! - **frame**: the rendered-screen data model (lines of styled runs)
//! - **content**: the `PaneContent` collaborator trait and its lifecycle
//! - **echo**: a minimal line shell implementing `PaneContent`
//!
//! # Architecture
//!
//! ```text
//! Key ──► PaneContent::feed_key ──► Lifecycle
//!              │
//!              └──► render_frame ──► Frame
//! ```

pub mod content;
pub mod echo;
pub mod frame;
pub mod key;

pub use content::{Lifecycle, PaneContent, PaneFactory};
pub use echo::EchoSession;
pub use frame::{Cell, Cursor, CursorShape, Frame, Line, Run, Style};
pub use key::{Direction, Key, PREFIX_KEY};
