//! Terminal host glue.
//!
//! The multiplexer itself never touches the console; these pieces let the
//! demo binary drive it from a real terminal:
//!
//! - **keymapper**: crossterm key events to normalized `Key`s
//! - **renderer**: draws composited `Frame`s with crossterm

pub mod keymapper;
pub mod renderer;

pub use keymapper::KeyMapper;
pub use renderer::TerminalRenderer;
