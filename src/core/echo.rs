//! EchoSession - a tiny line shell used by the demo host and the tests.
//!
//! It understands `echo`, `clear` and `exit`; anything else prints
//! "command not found". Output scrolls, and lines that leave the screen are
//! reported as history for copy mode.

use super::content::{Lifecycle, PaneContent};
use super::frame::{Cursor, CursorShape, Frame, Line, Style};
use super::key::Key;
use crate::config::Color;

const PROMPT: &str = "$ ";

pub struct EchoSession {
    cols: u16,
    rows: u16,
    /// Completed lines, oldest first
    output: Vec<String>,
    /// Current input line (after the prompt)
    input: String,
    fg: Color,
    bg: Color,
}

impl EchoSession {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            output: Vec::new(),
            input: String::new(),
            fg: Color::new(229, 229, 229),
            bg: Color::new(0, 0, 0),
        }
    }

    pub fn with_colors(mut self, fg: Color, bg: Color) -> Self {
        self.fg = fg;
        self.bg = bg;
        self
    }

    /// Every line including the live prompt line
    fn screen_lines(&self) -> Vec<String> {
        let mut lines = self.output.clone();
        lines.push(format!("{}{}", PROMPT, self.input));
        lines
    }

    fn run(&mut self, command: &str) -> Lifecycle {
        let command = command.trim();
        let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
        match name {
            "" => {}
            "exit" => return Lifecycle::Exited,
            "clear" => self.output.clear(),
            "echo" => self.output.push(rest.trim_start().to_string()),
            other => self.output.push(format!("{}: command not found", other)),
        }
        Lifecycle::Continue
    }
}

impl PaneContent for EchoSession {
    fn feed_key(&mut self, key: &Key) -> Lifecycle {
        match key {
            Key::Char(c) => self.input.push(*c),
            Key::Tab => self.input.push(' '),
            Key::Backspace => {
                self.input.pop();
            }
            Key::Ctrl('u') => self.input.clear(),
            Key::Ctrl('l') => self.output.clear(),
            Key::Ctrl('c') => {
                self.output.push(format!("{}{}^C", PROMPT, self.input));
                self.input.clear();
            }
            Key::Ctrl('d') if self.input.is_empty() => return Lifecycle::Exited,
            Key::Enter => {
                let command = std::mem::take(&mut self.input);
                self.output.push(format!("{}{}", PROMPT, command));
                return self.run(&command);
            }
            _ => {}
        }
        Lifecycle::Continue
    }

    fn render_frame(&self) -> Frame {
        let mut frame = Frame::blank(self.cols, self.rows, self.fg, self.bg);
        let style = Style::new(self.fg, self.bg);
        let lines = self.screen_lines();
        let start = lines.len().saturating_sub(self.rows as usize);

        for (row, text) in lines[start..].iter().enumerate() {
            let mut clipped: String = text.chars().take(self.cols as usize).collect();
            let pad = self.cols as usize - clipped.chars().count();
            clipped.extend(std::iter::repeat(' ').take(pad));
            frame.lines[row] = Line::styled(&clipped, style);
        }

        let cursor_row = (lines.len() - start).saturating_sub(1) as u16;
        let cursor_col = (PROMPT.len() + self.input.chars().count()) as u16;
        frame.cursor = Cursor {
            row: cursor_row,
            col: cursor_col.min(self.cols.saturating_sub(1)),
            visible: true,
            shape: Some(CursorShape::Block),
        };
        frame
    }

    fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn set_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    fn history(&self) -> Vec<String> {
        let lines = self.screen_lines();
        let start = lines.len().saturating_sub(self.rows as usize);
        lines[..start].to_vec()
    }
}
