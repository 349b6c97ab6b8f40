//! Key dispatch for the ten interaction modes

use tracing::debug;

use super::{ConfirmAction, Mode, Multiplexer, RenameTarget};
use crate::copymode::{CopyAction, CopyMode};
use crate::core::key::{Direction, Key, ParseKeyError, PREFIX_KEY};
use crate::wm::SplitDirection;

/// Default prefix-table bindings as `(key, command)`, shown by the help
/// overlay and `list-keys`
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    // Panes
    ("%", "split-window -h"),
    ("\"", "split-window -v"),
    ("Up", "select-pane -U"),
    ("Down", "select-pane -D"),
    ("Left", "select-pane -L"),
    ("Right", "select-pane -R"),
    ("C-Up", "resize-pane -U"),
    ("C-Down", "resize-pane -D"),
    ("C-Left", "resize-pane -L"),
    ("C-Right", "resize-pane -R"),
    ("o", "select-pane -t +"),
    (";", "last-pane"),
    ("z", "resize-pane -Z"),
    ("x", "kill-pane"),
    ("{", "swap-pane -U"),
    ("}", "swap-pane -D"),
    ("!", "break-pane"),
    ("q", "display-panes"),
    ("Space", "next-layout"),
    // Windows
    ("c", "new-window"),
    ("0-9", "select-window -t N"),
    ("n", "next-window"),
    ("p", "previous-window"),
    ("l", "last-window"),
    (",", "rename-window"),
    ("&", "kill-window"),
    ("w", "choose-window"),
    // Sessions
    ("$", "rename-session"),
    ("(", "switch-client -p"),
    (")", "switch-client -n"),
    ("d", "detach-client"),
    // Misc
    ("[", "copy-mode"),
    ("]", "paste-buffer"),
    (":", "command-prompt"),
    ("t", "clock-mode"),
    ("?", "list-keys"),
    ("C-b", "send-prefix"),
];

impl Multiplexer {
    /// Process one key in the current mode
    pub fn feed_key(&mut self, key: &Key) {
        if self.detached {
            debug!(%key, "ignoring key after detach");
            return;
        }
        self.message = None;

        // Handlers own the outgoing mode's state and leave the next mode
        // behind (Normal unless they set another).
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let from = mode.name();
        match mode {
            Mode::Normal => self.handle_normal(key),
            Mode::Prefix => self.handle_prefix(key),
            Mode::Command { buffer } => self.handle_command(buffer, key),
            Mode::Confirm { action, .. } => self.handle_confirm(action, key),
            Mode::Rename { buffer, target } => self.handle_rename(buffer, target, key),
            Mode::Copy(copy) => self.handle_copy(copy, key),
            Mode::WindowList { cursor } => self.handle_window_list(cursor, key),
            Mode::PaneNumbers { .. } => self.handle_pane_numbers(key),
            Mode::Clock => {}
            Mode::Help { scroll } => self.handle_help(scroll, key),
        }

        let to = self.mode.name();
        if from != to {
            debug!(from, to, %key, "mode change");
        }
    }

    /// Parse a normalized key token and feed it
    pub fn feed_token(&mut self, token: &str) -> Result<(), ParseKeyError> {
        let key: Key = token.parse()?;
        self.feed_key(&key);
        Ok(())
    }

    fn handle_normal(&mut self, key: &Key) {
        if *key == PREFIX_KEY {
            self.mode = Mode::Prefix;
        } else {
            self.forward_key(key);
        }
    }

    fn handle_prefix(&mut self, key: &Key) {
        match key {
            Key::Arrow(dir) => {
                self.active_window_mut().navigate_pane(*dir);
            }
            Key::CtrlArrow(dir) => {
                self.active_window_mut().resize_pane(*dir, 1);
            }
            k if *k == PREFIX_KEY => {
                self.forward_key(&PREFIX_KEY);
            }
            Key::Char(c) => self.handle_prefix_char(*c),
            _ => {}
        }
    }

    fn handle_prefix_char(&mut self, c: char) {
        match c {
            '%' => {
                let result = self.split(SplitDirection::Vertical).map(|_| ());
                self.report(result);
            }
            '"' => {
                let result = self.split(SplitDirection::Horizontal).map(|_| ());
                self.report(result);
            }
            'o' => {
                self.active_window_mut().next_pane();
            }
            ';' => {
                self.active_window_mut().last_pane();
            }
            'z' => {
                self.active_window_mut().toggle_zoom();
            }
            'x' => {
                let window = self.active_window();
                let index = window.pane_index(window.active_pane_id()).unwrap_or(0);
                self.mode = Mode::Confirm {
                    prompt: format!("kill-pane {}? (y/n)", index),
                    action: ConfirmAction::KillPane,
                };
            }
            '&' => {
                self.mode = Mode::Confirm {
                    prompt: format!("kill-window {}? (y/n)", self.active_window().name),
                    action: ConfirmAction::KillWindow,
                };
            }
            '{' => {
                self.active_window_mut().swap_pane_prev();
            }
            '}' => {
                self.active_window_mut().swap_pane_next();
            }
            '!' => {
                self.break_pane();
            }
            'q' => self.display_panes(),
            ' ' => {
                self.active_window_mut().cycle_layout();
            }
            'c' => {
                self.new_window(None);
            }
            '0'..='9' => {
                let index = c.to_digit(10).unwrap_or(0) as usize;
                let result = self.select_window(index);
                self.report(result);
            }
            'n' => {
                self.active_session_mut().next_window();
            }
            'p' => {
                self.active_session_mut().prev_window();
            }
            'l' => {
                self.active_session_mut().last_window();
            }
            ',' => {
                self.mode = Mode::Rename {
                    buffer: self.active_window().name.clone(),
                    target: RenameTarget::Window,
                };
            }
            '$' => {
                self.mode = Mode::Rename {
                    buffer: self.active_session().name.clone(),
                    target: RenameTarget::Session,
                };
            }
            'w' => {
                self.mode = Mode::WindowList {
                    cursor: self.active_session().active_index(),
                };
            }
            '(' => {
                self.prev_session();
            }
            ')' => {
                self.next_session();
            }
            'd' => self.detach(),
            '[' => self.enter_copy_mode(),
            ']' => {
                let result = self.paste();
                self.report(result);
            }
            ':' => {
                self.mode = Mode::Command {
                    buffer: String::new(),
                };
            }
            't' => self.mode = Mode::Clock,
            '?' => self.mode = Mode::Help { scroll: 0 },
            _ => debug!(key = %c, "unbound prefix key"),
        }
    }

    fn handle_command(&mut self, mut buffer: String, key: &Key) {
        match key {
            Key::Enter => {
                let line = buffer.trim();
                if !line.is_empty() {
                    let result = self.run_command(line);
                    self.report(result);
                }
                return;
            }
            Key::Escape => return,
            Key::Backspace => {
                buffer.pop();
            }
            Key::Ctrl('u') => buffer.clear(),
            Key::Char(c) => buffer.push(*c),
            _ => {}
        }
        self.mode = Mode::Command { buffer };
    }

    fn handle_confirm(&mut self, action: ConfirmAction, key: &Key) {
        if !matches!(key, Key::Char('y') | Key::Char('Y')) {
            return;
        }
        match action {
            ConfirmAction::KillPane => self.kill_pane(),
            ConfirmAction::KillWindow => self.kill_window(),
        }
    }

    fn handle_rename(&mut self, mut buffer: String, target: RenameTarget, key: &Key) {
        match key {
            Key::Enter => {
                if buffer.is_empty() {
                    return;
                }
                match target {
                    RenameTarget::Window => self.rename_window(&buffer),
                    RenameTarget::Session => {
                        let result = self.rename_session(&buffer);
                        self.report(result);
                    }
                }
                return;
            }
            Key::Escape => return,
            Key::Backspace => {
                buffer.pop();
            }
            Key::Ctrl('u') => buffer.clear(),
            Key::Char(c) => buffer.push(*c),
            _ => {}
        }
        self.mode = Mode::Rename { buffer, target };
    }

    fn handle_copy(&mut self, mut copy: Box<CopyMode>, key: &Key) {
        match copy.handle_key(key) {
            CopyAction::Continue => self.mode = Mode::Copy(copy),
            CopyAction::Exit => {}
            CopyAction::Yank(text) => self.store_paste_buffer(text),
        }
    }

    fn handle_window_list(&mut self, cursor: usize, key: &Key) {
        let last = self.active_session().window_count().saturating_sub(1);
        let cursor = match key {
            Key::Char('j') | Key::Arrow(Direction::Down) => (cursor + 1).min(last),
            Key::Char('k') | Key::Arrow(Direction::Up) => cursor.saturating_sub(1),
            Key::Enter => {
                let result = self.select_window(cursor);
                self.report(result);
                return;
            }
            Key::Char('q') | Key::Escape => return,
            _ => cursor,
        };
        self.mode = Mode::WindowList { cursor };
    }

    fn handle_pane_numbers(&mut self, key: &Key) {
        if let Some(index) = key.as_char().and_then(|c| c.to_digit(10)) {
            let result = self.active_window_mut().select_pane(index as usize);
            self.report(result);
        }
    }

    /// Largest help scroll offset that still fills the content area
    pub fn help_max_scroll(&self) -> usize {
        KEY_BINDINGS
            .len()
            .saturating_sub(self.content_rows() as usize)
    }

    fn handle_help(&mut self, scroll: usize, key: &Key) {
        let scroll = match key {
            Key::Char('j') | Key::Arrow(Direction::Down) => (scroll + 1).min(self.help_max_scroll()),
            Key::Char('k') | Key::Arrow(Direction::Up) => scroll.saturating_sub(1),
            _ => return,
        };
        self.mode = Mode::Help { scroll };
    }
}
