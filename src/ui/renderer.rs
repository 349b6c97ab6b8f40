//! Terminal renderer using crossterm
//!
//! Draws composited frames to the console. Only rows that changed since the
//! previous frame are rewritten.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    execute, queue,
    style::{Attribute, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::debug;

use crate::core::frame::{CursorShape, Frame, Line};

/// Begin a render frame (synchronized update, no autowrap, hidden cursor)
fn begin_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?2026h")?; // Begin synchronized update
    write!(out, "\x1b[?7l")?; // Disable autowrap
    queue!(out, Hide)?;
    Ok(())
}

/// End a render frame (enable autowrap, end synchronized update, flush)
fn end_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?7h")?; // Enable autowrap
    write!(out, "\x1b[?2026l")?; // End synchronized update
    out.flush()?;
    Ok(())
}

/// Execute a render operation with frame guards, ensuring cleanup on error
fn with_frame<W: Write, F, R>(out: &mut W, f: F) -> io::Result<R>
where
    F: FnOnce(&mut W) -> io::Result<R>,
{
    begin_frame(out)?;
    let result = f(out);
    // Always end frame, even on error
    let _ = end_frame(out);
    result
}

/// Terminal renderer
#[derive(Default)]
pub struct TerminalRenderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Last frame drawn; rows equal to it are skipped
    last_frame: Option<Frame>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        self.initialized = true;
        debug!("terminal initialized");
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, SetCursorStyle::DefaultUserShape, Show);
        let _ = execute!(stdout, EnableLineWrap);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;
        debug!("terminal restored");
        Ok(())
    }

    /// Forget the previous frame so the next render redraws every row
    pub fn invalidate(&mut self) {
        self.last_frame = None;
    }

    /// Draw a frame to stdout
    pub fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());
        self.render_to(&mut out, frame)
    }

    /// Draw a frame to any writer
    pub fn render_to<W: Write>(&mut self, out: &mut W, frame: &Frame) -> io::Result<()> {
        let previous = self
            .last_frame
            .take()
            .filter(|prev| prev.rows == frame.rows && prev.cols == frame.cols);

        with_frame(out, |out| {
            for (row, line) in frame.lines.iter().enumerate() {
                let unchanged = previous
                    .as_ref()
                    .and_then(|prev| prev.lines.get(row))
                    .is_some_and(|prev| prev == line);
                if !unchanged {
                    write_line(out, row as u16, line)?;
                }
            }
            queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;

            let cursor = frame.cursor;
            if cursor.visible {
                if let Some(shape) = cursor.shape {
                    queue!(out, cursor_style(shape))?;
                }
                queue!(out, MoveTo(cursor.col, cursor.row), Show)?;
            }
            Ok(())
        })?;

        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn cursor_style(shape: CursorShape) -> SetCursorStyle {
    match shape {
        CursorShape::Block => SetCursorStyle::SteadyBlock,
        CursorShape::Underline => SetCursorStyle::SteadyUnderScore,
        CursorShape::Bar => SetCursorStyle::SteadyBar,
    }
}

/// Write one row, switching colors at each run boundary
fn write_line<W: Write>(out: &mut W, row: u16, line: &Line) -> io::Result<()> {
    queue!(out, MoveTo(0, row))?;
    let mut chars = line.text.chars();
    let mut bold = false;
    for run in &line.runs {
        if run.b != bold {
            let attr = if run.b { Attribute::Bold } else { Attribute::NormalIntensity };
            queue!(out, SetAttribute(attr))?;
            bold = run.b;
        }
        queue!(
            out,
            SetForegroundColor(run.fg.to_crossterm()),
            SetBackgroundColor(run.bg.to_crossterm())
        )?;
        let text: String = chars.by_ref().take(run.n as usize).collect();
        out.write_all(text.as_bytes())?;
    }
    if bold {
        queue!(out, SetAttribute(Attribute::NormalIntensity))?;
    }
    Ok(())
}
