//! Parsing and formatting of key-event descriptors.
//!
//! The grammar is deliberately tiny so it can double as a wire format between
//! the planner ([`crate::context`]) and the host presser ([`crate::host`]):
//! whatever the planner emits can be replayed verbatim through
//! [`crate::caret::CaretTracker::apply_keys`].

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// KeyParseError
// ---------------------------------------------------------------------------

/// Structural errors in a key descriptor.
///
/// Unknown key *names* are not errors — they become [`KeyTarget::Other`] so
/// the tracker can desynchronize on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// A descriptor token was empty (double space, leading/trailing space).
    #[error("empty key descriptor")]
    EmptyDescriptor,

    /// The `:count` suffix was present but not a positive integer.
    #[error("invalid repeat count in key descriptor '{0}'")]
    InvalidCount(String),
}

// ---------------------------------------------------------------------------
// Modifier
// ---------------------------------------------------------------------------

/// Held modifier keys recognised in descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Ctrl,
    /// macOS command key.
    Cmd,
    /// Linux super / Windows key.
    Super,
    Alt,
}

impl Modifier {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "shift" => Some(Self::Shift),
            "ctrl" => Some(Self::Ctrl),
            "cmd" => Some(Self::Cmd),
            "super" => Some(Self::Super),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Shift => "shift",
            Self::Ctrl => "ctrl",
            Self::Cmd => "cmd",
            Self::Super => "super",
            Self::Alt => "alt",
        }
    }

    /// Whether this modifier performs word-wise jumps on the current
    /// platform (`cmd`/`alt` on macOS hosts behave differently, but every
    /// platform routes one of these to a word jump).
    pub fn is_word_jump(self) -> bool {
        matches!(self, Self::Ctrl | Self::Cmd | Self::Super | Self::Alt)
    }
}

// ---------------------------------------------------------------------------
// KeyTarget
// ---------------------------------------------------------------------------

/// The key a descriptor presses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Backspace,
    Delete,
    /// A single-character key, e.g. the `s` in `ctrl-s`.
    Hotkey(char),
    /// Anything the grammar does not know.  Treated as desynchronizing by
    /// the caret tracker.
    Other(String),
}

impl KeyTarget {
    fn parse(s: &str) -> Self {
        match s {
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            "home" => Self::Home,
            "end" => Self::End,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Hotkey(c),
                    _ => Self::Other(other.to_string()),
                }
            }
        }
    }

    /// Whether the key moves the caret horizontally.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl fmt::Display for KeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Home => write!(f, "home"),
            Self::End => write!(f, "end"),
            Self::Backspace => write!(f, "backspace"),
            Self::Delete => write!(f, "delete"),
            Self::Hotkey(c) => write!(f, "{c}"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// KeyPress / KeyEvent
// ---------------------------------------------------------------------------

/// One key press with held modifiers and a repeat count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub modifiers: Vec<Modifier>,
    pub target: KeyTarget,
    /// Repeat factor, always ≥ 1.
    pub count: usize,
}

impl KeyPress {
    pub fn new(target: KeyTarget, count: usize) -> Self {
        Self {
            modifiers: Vec::new(),
            target,
            count: count.max(1),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// `left:count`
    pub fn left(count: usize) -> Self {
        Self::new(KeyTarget::Left, count)
    }

    /// `right:count`
    pub fn right(count: usize) -> Self {
        Self::new(KeyTarget::Right, count)
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether any word-jump modifier is held (and shift is not the only
    /// modifier present).
    pub fn has_word_jump_modifier(&self) -> bool {
        self.modifiers.iter().any(|m| m.is_word_jump())
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}-", m.name())?;
        }
        write!(f, "{}", self.target)?;
        if self.count > 1 {
            write!(f, ":{}", self.count)?;
        }
        Ok(())
    }
}

/// A parsed descriptor token: either a key press or a bare modifier
/// transition (`shift:down` / `shift:up`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Press(KeyPress),
    Hold { modifier: Modifier, down: bool },
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press(press) => write!(f, "{press}"),
            Self::Hold { modifier, down } => {
                write!(f, "{}:{}", modifier.name(), if *down { "down" } else { "up" })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a single descriptor token.
pub fn parse_descriptor(token: &str) -> Result<KeyEvent, KeyParseError> {
    if token.is_empty() {
        return Err(KeyParseError::EmptyDescriptor);
    }

    // `modifier:(up|down)` takes precedence over the `:count` suffix.
    if let Some((head, tail)) = token.split_once(':') {
        if let Some(modifier) = Modifier::parse(head) {
            match tail {
                "down" => return Ok(KeyEvent::Hold { modifier, down: true }),
                "up" => return Ok(KeyEvent::Hold { modifier, down: false }),
                _ => {}
            }
        }
    }

    let (body, count) = match token.rsplit_once(':') {
        Some((body, count_str)) => {
            let count: usize = count_str
                .parse()
                .map_err(|_| KeyParseError::InvalidCount(token.to_string()))?;
            if count == 0 {
                return Err(KeyParseError::InvalidCount(token.to_string()));
            }
            (body, count)
        }
        None => (token, 1),
    };

    if body.is_empty() {
        return Err(KeyParseError::EmptyDescriptor);
    }

    // Leading `-`-separated segments that name modifiers are modifiers; the
    // remainder (which may itself contain `-`) is the key.
    let mut modifiers = Vec::new();
    let mut rest = body;
    while let Some((head, tail)) = rest.split_once('-') {
        match Modifier::parse(head) {
            Some(m) if !tail.is_empty() => {
                modifiers.push(m);
                rest = tail;
            }
            _ => break,
        }
    }

    Ok(KeyEvent::Press(KeyPress {
        modifiers,
        target: KeyTarget::parse(rest),
        count,
    }))
}

/// Parse a space-separated batch of descriptors, preserving order.
pub fn parse_descriptors(input: &str) -> Result<Vec<KeyEvent>, KeyParseError> {
    input
        .split_whitespace()
        .map(parse_descriptor)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_directions() {
        assert_eq!(
            parse_descriptor("left").unwrap(),
            KeyEvent::Press(KeyPress::left(1))
        );
        assert_eq!(
            parse_descriptor("right:4").unwrap(),
            KeyEvent::Press(KeyPress::right(4))
        );
    }

    #[test]
    fn modifier_chains() {
        let ev = parse_descriptor("ctrl-shift-left:2").unwrap();
        match ev {
            KeyEvent::Press(press) => {
                assert_eq!(press.modifiers, vec![Modifier::Ctrl, Modifier::Shift]);
                assert_eq!(press.target, KeyTarget::Left);
                assert_eq!(press.count, 2);
            }
            other => panic!("expected press, got {other:?}"),
        }
    }

    #[test]
    fn modifier_hold_transitions() {
        assert_eq!(
            parse_descriptor("shift:down").unwrap(),
            KeyEvent::Hold {
                modifier: Modifier::Shift,
                down: true
            }
        );
        assert_eq!(
            parse_descriptor("shift:up").unwrap(),
            KeyEvent::Hold {
                modifier: Modifier::Shift,
                down: false
            }
        );
    }

    #[test]
    fn hotkeys_and_unknown_keys() {
        assert_eq!(
            parse_descriptor("ctrl-s").unwrap(),
            KeyEvent::Press(KeyPress {
                modifiers: vec![Modifier::Ctrl],
                target: KeyTarget::Hotkey('s'),
                count: 1
            })
        );
        assert_eq!(
            parse_descriptor("alt-f4").unwrap(),
            KeyEvent::Press(KeyPress {
                modifiers: vec![Modifier::Alt],
                target: KeyTarget::Other("f4".into()),
                count: 1
            })
        );
    }

    #[test]
    fn malformed_count_is_an_error() {
        assert_eq!(
            parse_descriptor("left:abc"),
            Err(KeyParseError::InvalidCount("left:abc".into()))
        );
        assert_eq!(
            parse_descriptor("left:0"),
            Err(KeyParseError::InvalidCount("left:0".into()))
        );
    }

    #[test]
    fn batch_preserves_order() {
        let events = parse_descriptors("left:22 shift:down right:9 shift:up").unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], KeyEvent::Press(KeyPress::left(22)));
        assert_eq!(events[2], KeyEvent::Press(KeyPress::right(9)));
    }

    #[test]
    fn display_round_trip() {
        for text in ["left", "right:4", "shift-left", "ctrl-right:2", "shift:down"] {
            let ev = parse_descriptor(text).unwrap();
            assert_eq!(ev.to_string(), text);
        }
    }
}
