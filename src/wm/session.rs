//! Session - An ordered list of windows

use tracing::debug;

use super::pane::{Pane, PaneSpawner};
use super::window::{Window, WindowId};
use crate::error::{MuxError, Result};

/// Unique identifier for a session
pub type SessionId = u64;

pub struct Session {
    pub id: SessionId,
    pub name: String,
    windows: Vec<Window>,
    active_index: usize,
    last_index: Option<usize>,
    next_window_id: WindowId,
}

impl Session {
    /// Create a session with one window
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        window_name: &str,
        spawner: &mut PaneSpawner,
        cols: u16,
        rows: u16,
    ) -> Self {
        let mut session = Self {
            id,
            name: name.into(),
            windows: Vec::new(),
            active_index: 0,
            last_index: None,
            next_window_id: 0,
        };
        session.create_window(window_name, spawner, cols, rows);
        session
    }

    /// Append a window holding a fresh pane and make it active
    pub fn create_window(&mut self, name: &str, spawner: &mut PaneSpawner, cols: u16, rows: u16) -> usize {
        let pane = spawner.spawn(cols, rows);
        self.add_window(name, pane, cols, rows)
    }

    /// Append a window holding a fresh pane, leaving the active window alone
    pub fn create_window_detached(
        &mut self,
        name: &str,
        spawner: &mut PaneSpawner,
        cols: u16,
        rows: u16,
    ) -> usize {
        let pane = spawner.spawn(cols, rows);
        self.push_window(name, pane, cols, rows)
    }

    /// Append a window around an existing pane (break-pane) and make it active
    pub fn add_window(&mut self, name: &str, pane: Pane, cols: u16, rows: u16) -> usize {
        let index = self.push_window(name, pane, cols, rows);
        self.activate(index);
        index
    }

    fn push_window(&mut self, name: &str, pane: Pane, cols: u16, rows: u16) -> usize {
        let id = self.next_window_id;
        self.next_window_id += 1;
        self.windows.push(Window::new(id, name, pane, cols, rows));
        let index = self.windows.len() - 1;
        debug!(session = %self.name, window = id, index, "created window");
        index
    }

    fn activate(&mut self, index: usize) {
        if index != self.active_index && self.active_index < self.windows.len() {
            self.last_index = Some(self.active_index);
        }
        self.active_index = index;
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window_names(&self) -> Vec<&str> {
        self.windows.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    pub fn active_window(&self) -> &Window {
        &self.windows[self.active_index]
    }

    pub fn active_window_mut(&mut self) -> &mut Window {
        &mut self.windows[self.active_index]
    }

    /// Bounds-checked switch to `index`
    pub fn switch_window(&mut self, index: usize) -> Result<()> {
        if index >= self.windows.len() {
            return Err(MuxError::WindowOutOfRange(index));
        }
        self.activate(index);
        debug!(session = %self.name, index, "switched window");
        Ok(())
    }

    pub fn next_window(&mut self) -> bool {
        if self.windows.len() <= 1 {
            return false;
        }
        self.activate((self.active_index + 1) % self.windows.len());
        true
    }

    pub fn prev_window(&mut self) -> bool {
        if self.windows.len() <= 1 {
            return false;
        }
        let len = self.windows.len();
        self.activate((self.active_index + len - 1) % len);
        true
    }

    /// Toggle between the active and the last-active window
    pub fn last_window(&mut self) -> bool {
        match self.last_index {
            Some(index) if index < self.windows.len() => {
                self.activate(index);
                true
            }
            _ => false,
        }
    }

    /// Remove the window at `index`. Refused (false) for the only window.
    pub fn close_window(&mut self, index: usize) -> bool {
        if self.windows.len() <= 1 || index >= self.windows.len() {
            return false;
        }
        let closed = self.windows.remove(index);

        let shift = |i: usize| if i > index { i - 1 } else { i };
        let last = self.last_index.filter(|&i| i != index).map(shift);
        if self.active_index == index {
            self.active_index = last.unwrap_or(index.min(self.windows.len() - 1));
            self.last_index = None;
        } else {
            self.active_index = shift(self.active_index);
            self.last_index = last.filter(|&i| i != self.active_index);
        }
        debug!(session = %self.name, window = closed.id, index, "closed window");
        true
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Bounds-checked rename of the window at `index`
    pub fn rename_window(&mut self, index: usize, name: &str) -> Result<()> {
        let window = self
            .windows
            .get_mut(index)
            .ok_or(MuxError::WindowOutOfRange(index))?;
        window.name = name.to_string();
        debug!(session = %self.name, index, name, "renamed window");
        Ok(())
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        for window in &mut self.windows {
            window.resize(cols, rows);
        }
    }
}
