//! Key mapping for terminal input
//!
//! Converts crossterm key events to the multiplexer's normalized keys.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::key::{Direction, Key};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to keys
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent; `None` for releases and keys the
    /// multiplexer has no token for
    pub fn map(event: &KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Tab => Some(Key::Tab),
            KeyCode::Esc => Some(Key::Escape),

            KeyCode::Up => Some(Self::arrow_key(Direction::Up, mods)),
            KeyCode::Down => Some(Self::arrow_key(Direction::Down, mods)),
            KeyCode::Left => Some(Self::arrow_key(Direction::Left, mods)),
            KeyCode::Right => Some(Self::arrow_key(Direction::Right, mods)),

            KeyCode::Home => Some(Key::Home),
            KeyCode::End => Some(Key::End),
            KeyCode::PageUp => Some(Key::PageUp),
            KeyCode::PageDown => Some(Key::PageDown),
            KeyCode::Delete => Some(Key::Delete),

            _ => None,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Option<Key> {
        if mods.contains(Modifiers::CTRL) {
            // Ctrl + letter only; Ctrl + Alt chords have no token
            return (ch.is_ascii_alphabetic() && !mods.contains(Modifiers::ALT))
                .then(|| Key::ctrl(ch));
        }
        if mods.contains(Modifiers::ALT) {
            return None;
        }
        Some(Key::Char(ch))
    }

    fn arrow_key(dir: Direction, mods: Modifiers) -> Key {
        if mods.contains(Modifiers::CTRL) {
            Key::CtrlArrow(dir)
        } else {
            Key::Arrow(dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_char_keys() {
        // Normal character
        let event = key_event(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(Key::Char('a')));

        // Shifted characters arrive already shifted
        let event = key_event(KeyCode::Char('%'), KeyModifiers::SHIFT);
        assert_eq!(KeyMapper::map(&event), Some(Key::Char('%')));

        // Ctrl+B is the prefix
        let event = key_event(KeyCode::Char('B'), KeyModifiers::CONTROL);
        assert_eq!(KeyMapper::map(&event), Some(Key::Ctrl('b')));

        // Alt+x has no token
        let event = key_event(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(KeyMapper::map(&event), None);
    }

    #[test]
    fn test_arrow_keys() {
        let event = key_event(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(Key::Arrow(Direction::Up)));

        // With Ctrl
        let event = key_event(KeyCode::Left, KeyModifiers::CONTROL);
        assert_eq!(KeyMapper::map(&event), Some(Key::CtrlArrow(Direction::Left)));
    }

    #[test]
    fn test_special_keys_and_release() {
        let event = key_event(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(Key::Escape));

        let event = key_event(KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), Some(Key::PageDown));

        let event = key_event(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(KeyMapper::map(&event), None);

        let mut event = key_event(KeyCode::Char('a'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(KeyMapper::map(&event), None);
    }

    #[test]
    fn test_mapped_keys_round_trip_as_tokens() {
        let event = key_event(KeyCode::Right, KeyModifiers::CONTROL);
        let key = KeyMapper::map(&event).unwrap();
        assert_eq!(key.to_string().parse::<Key>(), Ok(key));
    }
}
