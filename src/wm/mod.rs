//! Window Manager - tmux-like session, window and pane management.
//!
//! This module provides the structural half of the multiplexer:
//!
//! - **session**: `Session`, an ordered list of windows
//! - **window**: `Window`, the panes of one layout tree
//! - **pane**: `Pane`, geometry plus an owned content session
//! - **layout**: the binary split tree and its presets
//!
//! # Module Hierarchy
//!
//! ```text
//! wm/
//! ├── mod.rs      - Module exports
//! ├── session.rs  - Session (container for windows)
//! ├── window.rs   - Window (container for panes)
//! ├── pane.rs     - Pane + PaneSpawner
//! └── layout.rs   - Layout tree and presets
//! ```

pub mod layout;
pub mod pane;
pub mod session;
pub mod window;

pub use layout::{Layout, LayoutPreset, Rect, SplitDirection};
pub use pane::{Pane, PaneId, PaneSpawner};
pub use session::{Session, SessionId};
pub use window::{Window, WindowId};
