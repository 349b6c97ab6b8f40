//! Compositor - turns the multiplexer state into one `Frame`.
//!
//! # Rendering Order
//!
//! ```text
//! panes      → every pane's own frame blitted at its box (only the active
//!              pane, full size, while zoomed)
//!     ↓
//! borders    → one row/column past each split's first child, junctions
//!              resolved to tees and crosses
//!     ↓
//! overlays   → copy viewport, window list, pane numbers, clock, help
//!     ↓
//! status bar → last row; prompts and messages replace it entirely
//! ```

use bitflags::bitflags;

use super::{Mode, Multiplexer, RenameTarget, KEY_BINDINGS};
use crate::config::ColorScheme;
use crate::copymode::CopyMode;
use crate::core::frame::{Cell, Cursor, Frame, Line, Style};
use crate::wm::{Layout, PaneId, Rect, SplitDirection, Window};

/// Name shown for the active window while in copy mode
pub const COPY_MODE_NAME: &str = "[copy]";

bitflags! {
    /// Border arms meeting in one cell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Arms: u8 {
        const UP = 0b0001;
        const DOWN = 0b0010;
        const LEFT = 0b0100;
        const RIGHT = 0b1000;
    }
}

/// Border characters
struct BorderChars {
    horizontal: char,
    vertical: char,
    t_down: char,
    t_up: char,
    t_left: char,
    t_right: char,
    cross: char,
}

impl BorderChars {
    const SINGLE: BorderChars = BorderChars {
        horizontal: '─',
        vertical: '│',
        t_down: '┬',
        t_up: '┴',
        t_left: '┤',
        t_right: '├',
        cross: '┼',
    };

    fn glyph(&self, arms: Arms) -> char {
        let vertical = Arms::UP | Arms::DOWN;
        let horizontal = Arms::LEFT | Arms::RIGHT;
        if arms.contains(vertical | horizontal) {
            self.cross
        } else if arms.contains(vertical | Arms::RIGHT) {
            self.t_right
        } else if arms.contains(vertical | Arms::LEFT) {
            self.t_left
        } else if arms.contains(horizontal | Arms::DOWN) {
            self.t_down
        } else if arms.contains(horizontal | Arms::UP) {
            self.t_up
        } else if arms.intersects(vertical) {
            self.vertical
        } else {
            self.horizontal
        }
    }
}

/// Every glyph a border cell may show
pub const BORDER_GLYPHS: [char; 7] = ['─', '│', '┬', '┴', '┤', '├', '┼'];

/// Per-cell scratch screen
struct Canvas {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    /// Own arms of border cells; empty elsewhere
    arms: Vec<Arms>,
}

impl Canvas {
    fn new(cols: u16, rows: u16, style: Style) -> Self {
        let len = cols as usize * rows as usize;
        Self {
            cols,
            rows,
            cells: vec![Cell::blank(style); len],
            arms: vec![Arms::empty(); len],
        }
    }

    fn index(&self, row: u16, col: u16) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row as usize * self.cols as usize + col as usize)
    }

    fn put(&mut self, row: u16, col: u16, ch: char, style: Style) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = Cell { ch, style };
        }
    }

    /// Write `text` from (row, col), clipped at `limit`; returns the column
    /// after the last character written
    fn put_str(&mut self, row: u16, col: u16, text: &str, style: Style, limit: u16) -> u16 {
        let mut c = col;
        for ch in text.chars() {
            if c >= limit.min(self.cols) {
                break;
            }
            self.put(row, c, ch, style);
            c += 1;
        }
        c
    }

    fn fill(&mut self, rect: Rect, style: Style) {
        for row in rect.top..rect.bottom() {
            for col in rect.left..rect.right() {
                self.put(row, col, ' ', style);
            }
        }
    }

    /// Copy a pane frame into `rect`, cell by cell. Rows or columns the frame
    /// lacks are blanked in its default style.
    fn blit(&mut self, frame: &Frame, rect: Rect) {
        let fallback = frame.default_style();
        for r in 0..rect.height {
            let cells = match frame.lines.get(r as usize) {
                Some(line) => line.cells(rect.width, fallback),
                None => vec![Cell::blank(fallback); rect.width as usize],
            };
            for (c, cell) in cells.into_iter().enumerate() {
                self.put(rect.top + r, rect.left + c as u16, cell.ch, cell.style);
            }
        }
    }

    fn mark_border(&mut self, rect: Rect, arms: Arms, style: Style) {
        for row in rect.top..rect.bottom() {
            for col in rect.left..rect.right() {
                if let Some(i) = self.index(row, col) {
                    self.arms[i] |= arms;
                    self.cells[i].style = style;
                }
            }
        }
    }

    /// Pick each border cell's glyph from its own arms plus the arms its
    /// neighbours reach into it with
    fn resolve_borders(&mut self, chars: &BorderChars) {
        let own = self.arms.clone();
        let at = |row: Option<u16>, col: Option<u16>| -> Arms {
            match (row, col) {
                (Some(r), Some(c)) if r < self.rows && c < self.cols => {
                    own[r as usize * self.cols as usize + c as usize]
                }
                _ => Arms::empty(),
            }
        };

        let mut resolved = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let i = row as usize * self.cols as usize + col as usize;
                if own[i].is_empty() {
                    continue;
                }
                let mut arms = own[i];
                if at(row.checked_sub(1), Some(col)).contains(Arms::DOWN) {
                    arms |= Arms::UP;
                }
                if at(row.checked_add(1), Some(col)).contains(Arms::UP) {
                    arms |= Arms::DOWN;
                }
                if at(Some(row), col.checked_sub(1)).contains(Arms::RIGHT) {
                    arms |= Arms::LEFT;
                }
                if at(Some(row), col.checked_add(1)).contains(Arms::LEFT) {
                    arms |= Arms::RIGHT;
                }
                resolved.push((i, chars.glyph(arms)));
            }
        }
        for (i, ch) in resolved {
            self.cells[i].ch = ch;
        }
    }

    fn into_lines(self) -> Vec<Line> {
        if self.cols == 0 {
            return (0..self.rows).map(|_| Line { text: String::new(), runs: Vec::new() }).collect();
        }
        self.cells
            .chunks(self.cols as usize)
            .map(Line::from_cells)
            .collect()
    }
}

fn border_style(scheme: &ColorScheme, active: bool) -> Style {
    let fg = if active {
        scheme.pane_border_active
    } else {
        scheme.pane_border
    };
    Style::new(fg, scheme.default_bg)
}

fn draw_borders(canvas: &mut Canvas, layout: &Layout, active: PaneId, scheme: &ColorScheme) {
    let Layout::Split {
        direction,
        first,
        second,
        ..
    } = layout
    else {
        return;
    };
    if let Some(rect) = layout.border_rect() {
        let arms = match direction {
            SplitDirection::Vertical => Arms::UP | Arms::DOWN,
            SplitDirection::Horizontal => Arms::LEFT | Arms::RIGHT,
        };
        canvas.mark_border(rect, arms, border_style(scheme, first.contains(active)));
    }
    draw_borders(canvas, first, active, scheme);
    draw_borders(canvas, second, active, scheme);
}

/// Top-left corner that centers `len` cells in `rect`
fn centered(rect: Rect, len: usize) -> (u16, u16) {
    let len = (len as u16).min(rect.width);
    (
        rect.top + rect.height.saturating_sub(1) / 2,
        rect.left + (rect.width - len) / 2,
    )
}

impl Multiplexer {
    /// Composite the whole screen. Side-effect free.
    pub fn render_frame(&self) -> Frame {
        let scheme = self.scheme();
        let default = Style::new(scheme.default_fg, scheme.default_bg);
        if self.rows == 0 {
            return Frame::blank(self.cols, 0, scheme.default_fg, scheme.default_bg);
        }

        let mut canvas = Canvas::new(self.cols, self.rows, default);
        let window = self.active_window();
        let pane_cursor = self.draw_panes(&mut canvas, window);
        self.draw_overlay(&mut canvas, window);
        let prompt_end = self.draw_status(&mut canvas);

        let status_row = self.rows - 1;
        let last_col = self.cols.saturating_sub(1);
        let cursor = match &self.mode {
            Mode::Copy(copy) => window
                .pane(copy.pane)
                .map(|pane| {
                    let (row, col) = copy.cursor_on_screen();
                    Cursor::at(pane.rect.top + row, pane.rect.left + col)
                })
                .unwrap_or_else(Cursor::hidden),
            Mode::Command { .. } | Mode::Rename { .. } | Mode::Confirm { .. } => {
                Cursor::at(status_row, prompt_end.min(last_col))
            }
            Mode::WindowList { .. } | Mode::PaneNumbers { .. } | Mode::Clock | Mode::Help { .. } => {
                Cursor::hidden()
            }
            Mode::Normal | Mode::Prefix => pane_cursor.unwrap_or_else(Cursor::hidden),
        };

        Frame {
            rows: self.rows,
            cols: self.cols,
            cursor,
            default_fg: scheme.default_fg,
            default_bg: scheme.default_bg,
            lines: canvas.into_lines(),
        }
    }

    /// Blit panes and borders; returns the active pane's cursor in screen
    /// coordinates
    fn draw_panes(&self, canvas: &mut Canvas, window: &Window) -> Option<Cursor> {
        let active = window.active_pane_id();
        let mut cursor = None;

        for pane in window.panes() {
            if window.is_zoomed() && pane.id != active {
                continue;
            }
            let frame = pane.render_frame();
            canvas.blit(&frame, pane.rect);

            if pane.id == active {
                let c = frame.cursor;
                cursor = Some(if c.row < pane.rect.height && c.col < pane.rect.width {
                    Cursor {
                        row: pane.rect.top + c.row,
                        col: pane.rect.left + c.col,
                        ..c
                    }
                } else {
                    Cursor::hidden()
                });
            }
        }

        if !window.is_zoomed() {
            draw_borders(canvas, window.layout(), active, self.scheme());
            canvas.resolve_borders(&BorderChars::SINGLE);
        }
        cursor
    }

    fn draw_overlay(&self, canvas: &mut Canvas, window: &Window) {
        let scheme = self.scheme();
        let content = Rect::new(0, 0, self.cols, self.content_rows());
        match &self.mode {
            Mode::Copy(copy) => {
                if let Some(pane) = window.pane(copy.pane) {
                    self.draw_copy(canvas, copy, pane.rect);
                }
            }
            Mode::WindowList { cursor } => {
                let session = self.active_session();
                let visible = content.height as usize;
                let start = (cursor + 1).saturating_sub(visible);
                for (row, (i, w)) in session.windows().iter().enumerate().skip(start).take(visible).enumerate() {
                    let style = if i == *cursor {
                        Style::new(scheme.selector_selected_fg, scheme.selector_selected_bg)
                    } else {
                        Style::new(scheme.selector_fg, scheme.selector_bg)
                    };
                    let marker = if i == session.active_index() { " (active)" } else { "" };
                    let text = format!("({}) {}: {} panes{}", i, w.name, w.pane_count(), marker);
                    let row = row as u16;
                    canvas.fill(Rect::new(row, 0, self.cols, 1), style);
                    canvas.put_str(row, 1, &text, style, self.cols);
                }
            }
            Mode::PaneNumbers { .. } => {
                for (i, pane) in window.panes().iter().enumerate() {
                    if window.is_zoomed() && pane.id != window.active_pane_id() {
                        continue;
                    }
                    let fg = if pane.id == window.active_pane_id() {
                        scheme.pane_border_active
                    } else {
                        scheme.pane_border
                    };
                    let label = i.to_string();
                    let (row, col) = centered(pane.rect, label.len());
                    canvas.put_str(row, col, &label, Style::new(fg, scheme.default_bg).bold(), pane.rect.right());
                }
            }
            Mode::Clock => {
                if let Some(pane) = window.active_pane() {
                    let time = self.now().format("%H:%M").to_string();
                    let style = Style::new(scheme.pane_border_active, scheme.default_bg).bold();
                    canvas.fill(pane.rect, Style::new(scheme.default_fg, scheme.default_bg));
                    let (row, col) = centered(pane.rect, time.len());
                    canvas.put_str(row, col, &time, style, pane.rect.right());
                }
            }
            Mode::Help { scroll } => {
                let style = Style::new(scheme.default_fg, scheme.default_bg);
                canvas.fill(content, style);
                for (row, (key, command)) in KEY_BINDINGS.iter().skip(*scroll).take(content.height as usize).enumerate() {
                    let text = format!("{:<8} {}", key, command);
                    canvas.put_str(row as u16, 1, &text, style, self.cols);
                }
            }
            _ => {}
        }
    }

    /// Copy viewport over the pane, with the selection highlighted and the
    /// scroll position in the top-right corner
    fn draw_copy(&self, canvas: &mut Canvas, copy: &CopyMode, rect: Rect) {
        let scheme = self.scheme();
        let plain = Style::new(scheme.default_fg, scheme.default_bg);
        let selected = Style::new(scheme.selection_fg, scheme.selection_bg);

        canvas.fill(rect, plain);
        for (r, (row, text)) in copy.visible_lines().enumerate() {
            let mut chars = text.chars();
            for col in 0..rect.width {
                let ch = chars.next().unwrap_or(' ');
                let style = if copy.is_selected(row, col) { selected } else { plain };
                canvas.put(rect.top + r as u16, rect.left + col, ch, style);
            }
        }

        let indicator = copy.position_indicator();
        let len = (indicator.chars().count() as u16).min(rect.width);
        canvas.put_str(rect.top, rect.right() - len, &indicator, selected, rect.right());
    }

    /// The status bar as segments; the bool marks the active window entry
    fn status_segments(&self) -> Vec<(String, bool)> {
        let session = self.active_session();
        let copying = matches!(self.mode, Mode::Copy(_));
        let mut segments = vec![(format!("{} | ", session.name), false)];

        for (i, window) in session.windows().iter().enumerate() {
            let active = i == session.active_index();
            let marker = if active {
                "*"
            } else if session.last_index() == Some(i) {
                "-"
            } else {
                ""
            };
            let name = if active && copying { COPY_MODE_NAME } else { window.name.as_str() };
            let zoom = if active && window.is_zoomed() { "Z" } else { "" };
            if i > 0 {
                segments.push((" ".to_string(), false));
            }
            segments.push((format!("{}:{}{}{}", i, name, marker, zoom), active));
        }

        if self.config().status.show_clock {
            let now = self.now();
            segments.push((format!(" | {} | {}", now.format("%H:%M"), now.format("%d-%b-%y")), false));
        }
        segments
    }

    /// Plain text of the status bar (without prompt or message overlays)
    pub fn status_line(&self) -> String {
        self.status_segments().into_iter().map(|(text, _)| text).collect()
    }

    /// Prompt shown on the status row, if the mode has one
    fn prompt(&self) -> Option<String> {
        match &self.mode {
            Mode::Command { buffer } => Some(format!(":{}", buffer)),
            Mode::Rename { buffer, target } => {
                let label = match target {
                    RenameTarget::Window => "rename-window",
                    RenameTarget::Session => "rename-session",
                };
                Some(format!("({}) {}", label, buffer))
            }
            Mode::Confirm { prompt, .. } => Some(prompt.clone()),
            _ => None,
        }
    }

    /// Draw the last row; returns the column after the prompt text
    fn draw_status(&self, canvas: &mut Canvas) -> u16 {
        let scheme = self.scheme();
        let row = self.rows - 1;
        let full = Rect::new(row, 0, self.cols, 1);

        if let Some(text) = self.prompt().or_else(|| self.message.clone()) {
            let style = Style::new(scheme.message_fg, scheme.message_bg);
            canvas.fill(full, style);
            return canvas.put_str(row, 0, &text, style, self.cols);
        }

        let style = Style::new(scheme.status_bar_fg, scheme.status_bar_bg);
        canvas.fill(full, style);
        let mut col = 0;
        for (text, highlight) in self.status_segments() {
            let style = if highlight { style.bold() } else { style };
            col = canvas.put_str(row, col, &text, style, self.cols);
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::tests::mux;

    fn keys(m: &mut Multiplexer, tokens: &[&str]) {
        for token in tokens {
            m.feed_token(token).unwrap();
        }
    }

    fn border_count(frame: &Frame, rows: u16) -> usize {
        (0..rows)
            .map(|r| frame.row_text(r).chars().filter(|c| BORDER_GLYPHS.contains(c)).count())
            .sum()
    }

    #[test]
    fn test_status_bar_format() {
        let m = mux();
        let frame = m.render_frame();
        assert!(frame.is_well_formed());
        assert_eq!(frame.row_text(23).trim_end(), "0 | 0:zsh* | 14:07 | 05-Mar-24");
        assert_eq!(frame.style_at(23, 0).unwrap().bg, m.scheme().status_bar_bg);
        assert!(frame.style_at(23, 4).unwrap().bold);
    }

    #[test]
    fn test_vertical_split_scenario() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "%"]);
        let panes: Vec<Rect> = m.active_window().panes().iter().map(|p| p.rect).collect();
        assert_eq!(panes[0].width, 40);
        assert_eq!(panes[1].width, 39);

        let frame = m.render_frame();
        assert!(frame.is_well_formed());
        for row in 0..23 {
            assert_eq!(frame.char_at(row, 40), Some('│'), "row {}", row);
        }
        // The right pane is active, so the border uses the inactive color
        assert_eq!(frame.style_at(0, 40).unwrap().fg, m.scheme().pane_border);
        assert_eq!((frame.cursor.row, frame.cursor.col), (0, 43));
    }

    #[test]
    fn test_horizontal_split_scenario() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "\""]);
        let panes: Vec<Rect> = m.active_window().panes().iter().map(|p| p.rect).collect();
        assert_eq!(panes[0].height, 11);
        assert_eq!(panes[1].height, 11);

        let frame = m.render_frame();
        assert_eq!(frame.row_text(11), "─".repeat(80));
        assert!(frame.row_text(23).starts_with("0 | 0:zsh*"));
        assert_eq!((frame.cursor.row, frame.cursor.col), (12, 2));
    }

    #[test]
    fn test_window_switch_scenario() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "c", "Ctrl-b", "c"]);
        assert_eq!(m.active_session().window_count(), 3);
        keys(&mut m, &["Ctrl-b", "1"]);
        let status = m.render_frame().row_text(23).to_string();
        assert!(status.contains("1:zsh*"), "{}", status);
        assert!(status.contains("0:zsh 1:zsh* 2:zsh-"), "{}", status);
    }

    #[test]
    fn test_zoom_scenario() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "%"]);
        let layout = m.active_window().layout().clone();

        keys(&mut m, &["Ctrl-b", "z"]);
        let frame = m.render_frame();
        assert_eq!(border_count(&frame, 23), 0);
        assert_eq!(m.active_window().active_pane().unwrap().rect.width, 80);
        assert!(frame.row_text(23).contains("0:zsh*Z"));

        keys(&mut m, &["Ctrl-b", "z"]);
        assert_eq!(*m.active_window().layout(), layout);
        assert_eq!(border_count(&m.render_frame(), 23), 23);
    }

    #[test]
    fn test_rename_scenario() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", ",", "Ctrl-u", "e", "d", "i", "t", "o", "r"]);
        let frame = m.render_frame();
        assert_eq!(frame.row_text(23).trim_end(), "(rename-window) editor");
        assert_eq!((frame.cursor.row, frame.cursor.col), (23, 22));

        keys(&mut m, &["Enter"]);
        assert!(m.render_frame().row_text(23).contains("0:editor*"));
    }

    #[test]
    fn test_resize_scenario() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "%"]);
        for _ in 0..3 {
            keys(&mut m, &["Ctrl-b", "Ctrl-Left"]);
        }
        let frame = m.render_frame();
        assert_eq!(frame.char_at(5, 37), Some('│'));
        assert_eq!(frame.char_at(5, 40), Some(' '));
    }

    #[test]
    fn test_junction_glyphs() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "%", "Ctrl-b", "\""]);
        let frame = m.render_frame();
        assert_eq!(frame.char_at(11, 40), Some('├'));
        assert_eq!(frame.char_at(11, 41), Some('─'));
        assert_eq!(frame.char_at(10, 40), Some('│'));

        keys(&mut m, &["Ctrl-b", "Left", "Ctrl-b", "\""]);
        let frame = m.render_frame();
        assert_eq!(frame.char_at(11, 40), Some('┼'));
    }

    #[test]
    fn test_prompt_and_message_replace_status() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", ":", "l", "s"]);
        let frame = m.render_frame();
        assert_eq!(frame.row_text(23).trim_end(), ":ls");
        assert_eq!(frame.style_at(23, 0).unwrap().bg, m.scheme().message_bg);
        assert_eq!((frame.cursor.row, frame.cursor.col), (23, 3));

        keys(&mut m, &["Enter"]);
        assert_eq!(m.render_frame().row_text(23).trim_end(), "0: 1 windows (attached)");
    }

    #[test]
    fn test_copy_mode_sentinel_and_cursor() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "["]);
        let frame = m.render_frame();
        assert!(frame.row_text(23).contains(&format!("0:{}*", COPY_MODE_NAME)));
        assert!(frame.row_text(0).trim_end().ends_with("[0/0]"));
        assert_eq!((frame.cursor.row, frame.cursor.col), (0, 2));
        keys(&mut m, &["h"]);
        assert_eq!(m.render_frame().cursor.col, 1);
    }

    #[test]
    fn test_every_mode_renders_well_formed() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "%", "Ctrl-b", "c"]);
        let sequences: &[&[&str]] = &[
            &["Ctrl-b"],
            &["Escape", "Ctrl-b", ":"],
            &["Escape", "Ctrl-b", "x"],
            &["n", "Ctrl-b", ","],
            &["Escape", "Ctrl-b", "["],
            &["q", "Ctrl-b", "w"],
            &["q", "Ctrl-b", "q"],
            &["a", "Ctrl-b", "t"],
            &["a", "Ctrl-b", "?"],
        ];
        for seq in sequences {
            keys(&mut m, seq);
            let frame = m.render_frame();
            assert!(frame.is_well_formed(), "mode {}", m.mode().name());
            assert_eq!((frame.rows, frame.cols), (24, 80));
        }
    }

    #[test]
    fn test_overlays() {
        let mut m = mux();
        keys(&mut m, &["Ctrl-b", "c", "Ctrl-b", "w"]);
        let frame = m.render_frame();
        assert_eq!(frame.row_text(0).trim_end(), " (0) zsh: 1 panes");
        assert_eq!(frame.row_text(1).trim_end(), " (1) zsh: 1 panes (active)");
        assert!(!frame.cursor.visible);

        keys(&mut m, &["q", "Ctrl-b", "t"]);
        assert_eq!(m.render_frame().row_text(11).trim(), "14:07");

        keys(&mut m, &["a", "Ctrl-b", "?"]);
        assert_eq!(m.render_frame().row_text(0).trim_end(), format!(" {:<8} {}", "%", "split-window -h"));
    }

    #[test]
    fn test_small_terminal() {
        let mut m = mux();
        m.resize(3, 2);
        keys(&mut m, &["Ctrl-b", "%"]);
        assert!(m.message().is_some());
        let frame = m.render_frame();
        assert!(frame.is_well_formed());
        assert_eq!(frame.rows, 2);
    }
}
