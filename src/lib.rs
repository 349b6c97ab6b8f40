//! vmux - an in-memory tmux-style multiplexer engine.
//!
//! Sessions hold windows, windows hold a binary split tree of panes, and a
//! prefix-key mode machine drives it all. Every pane hosts a `PaneContent`
//! that renders its own `Frame`; the multiplexer composites those frames with
//! borders, overlays and a status bar into one `Frame` for the host to draw.
//!
//! ```text
//! host key ──► Multiplexer::feed_key ──► mode handlers ──► Window / Session
//!                                                              │
//! host draw ◄── Multiplexer::render_frame ◄── pane frames ◄────┘
//! ```

pub mod config;
pub mod copymode;
pub mod core;
pub mod error;
pub mod mux;
pub mod ui;
pub mod wm;

pub use config::{Color, ColorScheme, Config};
pub use core::{Frame, Key, Lifecycle, PaneContent, PaneFactory};
pub use error::MuxError;
pub use mux::{Mode, Multiplexer};
