//! Input events delivered to the editor by the host surface.

/// A keystroke, already decoded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character (operators included)
    Char(char),
    Enter,
    Backspace,
    Left,
    Right,
    Escape,
}

impl Key {
    /// Decode a DOM-style key name ("Enter", "ArrowLeft", "a", "+").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Enter" => Some(Key::Enter),
            "Backspace" => Some(Key::Backspace),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "Escape" => Some(Key::Escape),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

/// Everything the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    /// Click between tokens; the index is the insertion point.
    ClickAt(usize),
    /// Pick a candidate from the visible list by candidate id.
    SelectCandidate(String),
}

impl From<Key> for InputEvent {
    fn from(key: Key) -> Self {
        InputEvent::Key(key)
    }
}
