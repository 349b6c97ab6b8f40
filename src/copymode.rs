//! Copy mode - vim-like scrollback navigation and text selection
//!
//! Entering copy mode takes a snapshot of the active pane (its history plus
//! the visible screen). Navigation and selection work on that snapshot, so
//! the pane itself is never disturbed.

use crate::core::key::{Direction, Key};
use crate::wm::PaneId;

/// What the multiplexer should do after a copy-mode key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyAction {
    Continue,
    Exit,
    /// Leave copy mode, storing the text in the paste buffer
    Yank(String),
}

/// Copy mode state
#[derive(Debug, Clone, PartialEq)]
pub struct CopyMode {
    /// Pane the snapshot was taken from
    pub pane: PaneId,
    /// History followed by the screen rows, oldest first
    lines: Vec<String>,
    /// Viewport size (the pane's size)
    width: u16,
    height: u16,
    /// Cursor position in snapshot coordinates
    pub cursor_col: u16,
    pub cursor_row: usize,
    /// Selection anchor (col, row) - None if not selecting
    pub selection_start: Option<(u16, usize)>,
    /// First snapshot row shown in the viewport
    top: usize,
}

impl CopyMode {
    /// Enter copy mode over `history` + `screen`, with the cursor at the
    /// pane's cursor
    pub fn enter(
        pane: PaneId,
        history: Vec<String>,
        screen: Vec<String>,
        cursor: (u16, u16),
        width: u16,
        height: u16,
    ) -> Self {
        let history_len = history.len();
        let mut lines = history;
        lines.extend(screen);
        if lines.is_empty() {
            lines.push(String::new());
        }
        let (row, col) = cursor;
        let cursor_row = (history_len + row as usize).min(lines.len() - 1);
        let mut mode = Self {
            pane,
            lines,
            width,
            height,
            cursor_col: col.min(width.saturating_sub(1)),
            cursor_row,
            selection_start: None,
            top: 0,
        };
        mode.top = mode.max_top();
        mode.adjust_scroll();
        mode
    }

    pub fn handle_key(&mut self, key: &Key) -> CopyAction {
        match key {
            Key::Char('q') | Key::Escape => return CopyAction::Exit,
            Key::Char('y') | Key::Enter => return CopyAction::Yank(self.copy_selection()),
            Key::Char('h') | Key::Arrow(Direction::Left) => self.cursor_left(),
            Key::Char('l') | Key::Arrow(Direction::Right) => self.cursor_right(),
            Key::Char('k') | Key::Arrow(Direction::Up) => self.cursor_up(),
            Key::Char('j') | Key::Arrow(Direction::Down) => self.cursor_down(),
            Key::Char('0') | Key::Home => self.line_start(),
            Key::Char('$') | Key::End => self.line_end(),
            Key::Char('g') => self.goto_top(),
            Key::Char('G') => self.goto_bottom(),
            Key::Char('w') => self.word_forward(),
            Key::Char('b') => self.word_backward(),
            Key::Ctrl('f') | Key::PageDown => self.page_down(),
            Key::Ctrl('b') | Key::PageUp => self.page_up(),
            Key::Ctrl('d') => self.half_page_down(),
            Key::Ctrl('u') => self.half_page_up(),
            Key::Char('v') | Key::Char(' ') => self.toggle_selection(),
            _ => {}
        }
        CopyAction::Continue
    }

    fn max_row(&self) -> usize {
        self.lines.len() - 1
    }

    fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    fn line_chars(&self, row: usize) -> Vec<char> {
        self.lines
            .get(row)
            .map(|l| l.chars().collect())
            .unwrap_or_default()
    }

    /// Move cursor up
    pub fn cursor_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.adjust_scroll();
        }
    }

    /// Move cursor down
    pub fn cursor_down(&mut self) {
        if self.cursor_row < self.max_row() {
            self.cursor_row += 1;
            self.adjust_scroll();
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_col + 1 < self.width {
            self.cursor_col += 1;
        }
    }

    /// Move to line start
    pub fn line_start(&mut self) {
        self.cursor_col = 0;
    }

    /// Move to the last non-blank character of the line
    pub fn line_end(&mut self) {
        let len = self.lines[self.cursor_row].trim_end().chars().count() as u16;
        self.cursor_col = len.saturating_sub(1).min(self.width.saturating_sub(1));
    }

    /// Go to top
    pub fn goto_top(&mut self) {
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.adjust_scroll();
    }

    /// Go to bottom
    pub fn goto_bottom(&mut self) {
        self.cursor_row = self.max_row();
        self.cursor_col = 0;
        self.adjust_scroll();
    }

    fn move_rows(&mut self, rows: usize, down: bool) {
        self.cursor_row = if down {
            (self.cursor_row + rows).min(self.max_row())
        } else {
            self.cursor_row.saturating_sub(rows)
        };
        self.adjust_scroll();
    }

    pub fn page_up(&mut self) {
        self.move_rows((self.height as usize).max(1), false);
    }

    pub fn page_down(&mut self) {
        self.move_rows((self.height as usize).max(1), true);
    }

    pub fn half_page_up(&mut self) {
        self.move_rows((self.height as usize / 2).max(1), false);
    }

    pub fn half_page_down(&mut self) {
        self.move_rows((self.height as usize / 2).max(1), true);
    }

    /// Start of the next whitespace-separated word, continuing on later lines
    pub fn word_forward(&mut self) {
        let chars = self.line_chars(self.cursor_row);
        let mut col = self.cursor_col as usize;
        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        while col < chars.len() && chars[col].is_whitespace() {
            col += 1;
        }
        if col < chars.len() {
            self.cursor_col = (col as u16).min(self.width.saturating_sub(1));
        } else if self.cursor_row < self.max_row() {
            self.cursor_down();
            let next = self.line_chars(self.cursor_row);
            let first = next.iter().position(|c| !c.is_whitespace()).unwrap_or(0);
            self.cursor_col = (first as u16).min(self.width.saturating_sub(1));
        }
    }

    /// Start of the current or previous word on this line
    pub fn word_backward(&mut self) {
        let chars = self.line_chars(self.cursor_row);
        let mut col = (self.cursor_col as usize).min(chars.len());
        while col > 0 && chars[col - 1].is_whitespace() {
            col -= 1;
        }
        while col > 0 && !chars[col - 1].is_whitespace() {
            col -= 1;
        }
        if col == 0 && self.cursor_col == 0 && self.cursor_row > 0 {
            self.cursor_up();
            self.line_end();
            return;
        }
        self.cursor_col = col as u16;
    }

    /// Toggle selection
    pub fn toggle_selection(&mut self) {
        if self.selection_start.is_some() {
            self.selection_start = None;
        } else {
            self.selection_start = Some((self.cursor_col, self.cursor_row));
        }
    }

    /// Selection bounds in reading order: (from_row, from_col, to_row, to_col)
    fn selection_bounds(&self) -> Option<(usize, u16, usize, u16)> {
        let (start_col, start_row) = self.selection_start?;
        Some(
            if start_row < self.cursor_row
                || (start_row == self.cursor_row && start_col <= self.cursor_col)
            {
                (start_row, start_col, self.cursor_row, self.cursor_col)
            } else {
                (self.cursor_row, self.cursor_col, start_row, start_col)
            },
        )
    }

    /// Selected text, or the cursor line when nothing is selected. Trailing
    /// blanks are trimmed per line.
    pub fn copy_selection(&self) -> String {
        let Some((from_row, from_col, to_row, to_col)) = self.selection_bounds() else {
            return self.lines[self.cursor_row].trim_end().to_string();
        };

        let mut out = Vec::new();
        for row in from_row..=to_row {
            let chars = self.line_chars(row);
            let start = if row == from_row { from_col as usize } else { 0 };
            let end = if row == to_row {
                to_col as usize + 1
            } else {
                chars.len()
            };
            let end = end.min(chars.len());
            let text: String = chars.get(start..end).map(|s| s.iter().collect()).unwrap_or_default();
            out.push(text.trim_end().to_string());
        }
        out.join("\n")
    }

    /// Adjust scroll to keep cursor visible
    fn adjust_scroll(&mut self) {
        let visible_rows = (self.height as usize).max(1);
        if self.cursor_row < self.top {
            self.top = self.cursor_row;
        } else if self.cursor_row >= self.top + visible_rows {
            self.top = self.cursor_row + 1 - visible_rows;
        }
        self.top = self.top.min(self.max_top());
    }

    /// Snapshot rows currently in the viewport, top to bottom
    pub fn visible_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let end = (self.top + self.height as usize).min(self.lines.len());
        (self.top..end).map(move |row| (row, self.lines[row].as_str()))
    }

    /// Viewport-relative cursor (row, col)
    pub fn cursor_on_screen(&self) -> (u16, u16) {
        ((self.cursor_row - self.top) as u16, self.cursor_col)
    }

    /// Check if a cell is in selection
    pub fn is_selected(&self, row: usize, col: u16) -> bool {
        let Some((from_row, from_col, to_row, to_col)) = self.selection_bounds() else {
            return false;
        };
        if row < from_row || row > to_row {
            return false;
        }
        if row == from_row && row == to_row {
            col >= from_col && col <= to_col
        } else if row == from_row {
            col >= from_col
        } else if row == to_row {
            col <= to_col
        } else {
            true
        }
    }

    /// tmux-style "[scrolled/total-history]" indicator
    pub fn position_indicator(&self) -> String {
        format!("[{}/{}]", self.max_top() - self.top, self.max_top())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    fn copy_mode() -> CopyMode {
        // 3 lines of history, 2 screen rows, cursor on the last row
        CopyMode::enter(
            7,
            lines(&["first line", "second one", "third"]),
            lines(&["hello world", "$ "]),
            (1, 2),
            20,
            2,
        )
    }

    #[test]
    fn test_enter_starts_at_pane_cursor() {
        let mode = copy_mode();
        assert_eq!((mode.cursor_row, mode.cursor_col), (4, 2));
        assert_eq!(mode.cursor_on_screen(), (1, 2));
        assert_eq!(mode.position_indicator(), "[0/3]");
        let visible: Vec<&str> = mode.visible_lines().map(|(_, l)| l).collect();
        assert_eq!(visible, vec!["hello world", "$ "]);
    }

    #[test]
    fn test_scrolls_into_history() {
        let mut mode = copy_mode();
        for _ in 0..3 {
            mode.handle_key(&Key::Char('k'));
        }
        assert_eq!(mode.cursor_row, 1);
        assert_eq!(mode.cursor_on_screen(), (0, 2));
        assert_eq!(mode.position_indicator(), "[2/3]");

        mode.handle_key(&Key::Char('g'));
        assert_eq!((mode.cursor_row, mode.cursor_col), (0, 0));
        mode.handle_key(&Key::Char('G'));
        assert_eq!(mode.cursor_row, 4);
        mode.handle_key(&Key::Ctrl('b'));
        assert_eq!(mode.cursor_row, 2);
        mode.handle_key(&Key::Ctrl('d'));
        assert_eq!(mode.cursor_row, 3);
    }

    #[test]
    fn test_line_and_word_motions() {
        let mut mode = copy_mode();
        mode.handle_key(&Key::Char('k'));
        mode.handle_key(&Key::Char('0'));
        mode.handle_key(&Key::Char('w'));
        assert_eq!(mode.cursor_col, 6);
        mode.handle_key(&Key::Char('$'));
        assert_eq!(mode.cursor_col, 10);
        mode.handle_key(&Key::Char('b'));
        assert_eq!(mode.cursor_col, 6);
        mode.handle_key(&Key::Char('h'));
        assert_eq!(mode.cursor_col, 5);
    }

    #[test]
    fn test_yank_selection_across_lines() {
        let mut mode = copy_mode();
        mode.goto_top();
        for _ in 0..6 {
            mode.handle_key(&Key::Char('l'));
        }
        mode.handle_key(&Key::Char('v'));
        mode.handle_key(&Key::Char('j'));
        for _ in 0..5 {
            mode.handle_key(&Key::Char('h'));
        }
        assert!(mode.is_selected(0, 9));
        assert!(mode.is_selected(1, 0));
        assert!(!mode.is_selected(1, 2));
        assert_eq!(mode.handle_key(&Key::Char('y')), CopyAction::Yank("line\nse".to_string()));
    }

    #[test]
    fn test_yank_without_selection_takes_line() {
        let mut mode = copy_mode();
        mode.handle_key(&Key::Char('k'));
        assert_eq!(mode.handle_key(&Key::Enter), CopyAction::Yank("hello world".to_string()));
        assert_eq!(mode.handle_key(&Key::Escape), CopyAction::Exit);
    }
}
