//! Normalized key tokens.
//!
//! Hosts hand the multiplexer one `Key` per input event. Keys parse from and
//! display as the textual tokens hosts exchange: a printable character,
//! `Enter`, `Escape`, `Backspace`, `Tab`, arrows (`Up`), `Ctrl-<letter>`,
//! `Ctrl-<arrow>`, `PageUp` and friends.

use std::fmt;
use std::str::FromStr;

/// Arrow direction, shared by navigation and resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn name(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.strip_prefix("Arrow").unwrap_or(s) {
            "Up" => Some(Direction::Up),
            "Down" => Some(Direction::Down),
            "Left" => Some(Direction::Left),
            "Right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// One input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    /// Control chord; the letter is stored lowercase
    Ctrl(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Arrow(Direction),
    CtrlArrow(Direction),
}

/// The fixed prefix key (Ctrl-b)
pub const PREFIX_KEY: Key = Key::Ctrl('b');

impl Key {
    pub fn ctrl(c: char) -> Self {
        Key::Ctrl(c.to_ascii_lowercase())
    }

    /// Printable character carried by this key, if any
    pub fn as_char(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError(pub String);

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized key token: {:?}", self.0)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c));
        }

        let key = match s {
            "Enter" | "Return" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "Backspace" => Key::Backspace,
            "Tab" => Key::Tab,
            "Delete" => Key::Delete,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            "Space" => Key::Char(' '),
            _ => {
                if let Some(dir) = Direction::parse(s) {
                    Key::Arrow(dir)
                } else if let Some(rest) = s.strip_prefix("Ctrl-").or_else(|| s.strip_prefix("C-")) {
                    if let Some(dir) = Direction::parse(rest) {
                        Key::CtrlArrow(dir)
                    } else {
                        let mut rest_chars = rest.chars();
                        match (rest_chars.next(), rest_chars.next()) {
                            (Some(c), None) if c.is_ascii_alphabetic() => Key::ctrl(c),
                            _ => return Err(ParseKeyError(s.to_string())),
                        }
                    }
                } else {
                    return Err(ParseKeyError(s.to_string()));
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Ctrl(c) => write!(f, "Ctrl-{}", c),
            Key::Enter => f.write_str("Enter"),
            Key::Escape => f.write_str("Escape"),
            Key::Backspace => f.write_str("Backspace"),
            Key::Tab => f.write_str("Tab"),
            Key::Delete => f.write_str("Delete"),
            Key::Home => f.write_str("Home"),
            Key::End => f.write_str("End"),
            Key::PageUp => f.write_str("PageUp"),
            Key::PageDown => f.write_str("PageDown"),
            Key::Arrow(dir) => f.write_str(dir.name()),
            Key::CtrlArrow(dir) => write!(f, "Ctrl-{}", dir.name()),
        }
    }
}
