//! Frame - a fully materialized screen exchanged at the rendering boundary.
//!
//! Each line stores its text plus a run-length list of styles. The runs of a
//! well-formed line partition the text exactly: their lengths sum to `cols`
//! and the text holds `cols` characters.

use serde::{Deserialize, Serialize};

use crate::config::Color;

/// Cursor shape hint for the external renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorShape {
    Block,
    Underline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub row: u16,
    pub col: u16,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<CursorShape>,
}

impl Cursor {
    pub fn at(row: u16, col: u16) -> Self {
        Self {
            row,
            col,
            visible: true,
            shape: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            row: 0,
            col: 0,
            visible: false,
            shape: None,
        }
    }
}

/// Per-cell style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
}

impl Style {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg, bold: false }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A single character cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Cell {
    pub fn blank(style: Style) -> Self {
        Self { ch: ' ', style }
    }
}

/// A span of `n` cells sharing one style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub n: u16,
    pub fg: Color,
    pub bg: Color,
    #[serde(default, skip_serializing_if = "is_false")]
    pub b: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Run {
    pub fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            bold: self.b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub runs: Vec<Run>,
}

impl Line {
    /// A line of `width` spaces in one style
    pub fn blank(width: u16, style: Style) -> Self {
        Self::styled(&" ".repeat(width as usize), style)
    }

    /// A single-run line; the run covers every character of `text`
    pub fn styled(text: &str, style: Style) -> Self {
        let n = text.chars().count() as u16;
        Self {
            text: text.to_string(),
            runs: vec![Run {
                n,
                fg: style.fg,
                bg: style.bg,
                b: style.bold,
            }],
        }
    }

    /// Expand into exactly `width` cells. Missing text becomes spaces and
    /// cells not covered by any run take `fallback`.
    pub fn cells(&self, width: u16, fallback: Style) -> Vec<Cell> {
        let width = width as usize;
        let mut styles = Vec::with_capacity(width);
        for run in &self.runs {
            let style = run.style();
            for _ in 0..run.n {
                if styles.len() == width {
                    break;
                }
                styles.push(style);
            }
        }
        styles.resize(width, fallback);

        let mut chars = self.text.chars();
        styles
            .into_iter()
            .map(|style| Cell {
                ch: chars.next().unwrap_or(' '),
                style,
            })
            .collect()
    }

    /// Compact cells into text plus runs of equal style
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut text = String::with_capacity(cells.len());
        let mut runs: Vec<Run> = Vec::new();
        for cell in cells {
            text.push(cell.ch);
            match runs.last_mut() {
                Some(run) if run.style() == cell.style => run.n += 1,
                _ => runs.push(Run {
                    n: 1,
                    fg: cell.style.fg,
                    bg: cell.style.bg,
                    b: cell.style.bold,
                }),
            }
        }
        Self { text, runs }
    }

    /// Total cells covered by the runs
    pub fn width(&self) -> usize {
        self.runs.iter().map(|r| r.n as usize).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub rows: u16,
    pub cols: u16,
    pub cursor: Cursor,
    pub default_fg: Color,
    pub default_bg: Color,
    pub lines: Vec<Line>,
}

impl Frame {
    /// A frame filled with spaces in the default colors
    pub fn blank(cols: u16, rows: u16, fg: Color, bg: Color) -> Self {
        let style = Style::new(fg, bg);
        Self {
            rows,
            cols,
            cursor: Cursor::at(0, 0),
            default_fg: fg,
            default_bg: bg,
            lines: (0..rows).map(|_| Line::blank(cols, style)).collect(),
        }
    }

    pub fn default_style(&self) -> Style {
        Style::new(self.default_fg, self.default_bg)
    }

    /// Text of a row, or "" past the end
    pub fn row_text(&self, row: u16) -> &str {
        self.lines.get(row as usize).map(|l| l.text.as_str()).unwrap_or("")
    }

    /// Character at a position, if inside the frame
    pub fn char_at(&self, row: u16, col: u16) -> Option<char> {
        self.lines.get(row as usize)?.text.chars().nth(col as usize)
    }

    /// Style at a position, if covered by a run
    pub fn style_at(&self, row: u16, col: u16) -> Option<Style> {
        let line = self.lines.get(row as usize)?;
        let mut offset = 0usize;
        for run in &line.runs {
            offset += run.n as usize;
            if (col as usize) < offset {
                return Some(run.style());
            }
        }
        None
    }

    /// Every line has `cols` characters and runs summing to `cols`
    pub fn is_well_formed(&self) -> bool {
        self.lines.len() == self.rows as usize
            && self.lines.iter().all(|line| {
                line.width() == self.cols as usize
                    && line.text.chars().count() == self.cols as usize
            })
    }
}
