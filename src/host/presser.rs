//! Key-event delivery backed by the `enigo` crate.
//!
//! [`EnigoPresser`] maps parsed key descriptors onto enigo key chords: held
//! modifiers are pressed, the key is clicked `count` times, the modifiers
//! are released in reverse order.  A new [`Enigo`] handle is created per
//! batch because `Enigo` is not `Send` and the handle is cheap to
//! construct.

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use log::trace;

use crate::keys::{parse_descriptors, KeyEvent, KeyPress, KeyTarget, Modifier};

use super::HostError;

// ---------------------------------------------------------------------------
// KeyPresser trait
// ---------------------------------------------------------------------------

/// Object-safe interface for delivering key descriptors to the host.
///
/// Implementations must deliver the presses in order and synchronously —
/// callers assume the host caret has moved by the time this returns.
pub trait KeyPresser {
    /// Parse and deliver a space-separated descriptor batch.
    fn press(&mut self, descriptors: &str) -> Result<(), HostError>;
}

// ---------------------------------------------------------------------------
// EnigoPresser
// ---------------------------------------------------------------------------

/// Production presser that simulates the keys via `enigo`.
#[derive(Debug, Default)]
pub struct EnigoPresser {
    /// Milliseconds to pause between delivered events, for hosts that drop
    /// input under fast simulation.  Zero delivers as fast as possible.
    pub delay_ms: u64,
}

impl EnigoPresser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn modifier_key(modifier: Modifier) -> Key {
        match modifier {
            Modifier::Shift => Key::Shift,
            Modifier::Ctrl => Key::Control,
            Modifier::Cmd | Modifier::Super => Key::Meta,
            Modifier::Alt => Key::Alt,
        }
    }

    fn target_key(target: &KeyTarget) -> Option<Key> {
        match target {
            KeyTarget::Left => Some(Key::LeftArrow),
            KeyTarget::Right => Some(Key::RightArrow),
            KeyTarget::Up => Some(Key::UpArrow),
            KeyTarget::Down => Some(Key::DownArrow),
            KeyTarget::Home => Some(Key::Home),
            KeyTarget::End => Some(Key::End),
            KeyTarget::Backspace => Some(Key::Backspace),
            KeyTarget::Delete => Some(Key::Delete),
            KeyTarget::Hotkey(c) => Some(Key::Unicode(*c)),
            KeyTarget::Other(_) => None,
        }
    }

    fn deliver_press(enigo: &mut Enigo, press: &KeyPress) -> Result<(), HostError> {
        let Some(key) = Self::target_key(&press.target) else {
            return Err(HostError::KeySimulation(format!(
                "unmapped key '{}'",
                press.target
            )));
        };
        for modifier in &press.modifiers {
            enigo
                .key(Self::modifier_key(*modifier), Direction::Press)
                .map_err(|e| HostError::KeySimulation(e.to_string()))?;
        }
        for _ in 0..press.count {
            enigo
                .key(key, Direction::Click)
                .map_err(|e| HostError::KeySimulation(e.to_string()))?;
        }
        for modifier in press.modifiers.iter().rev() {
            enigo
                .key(Self::modifier_key(*modifier), Direction::Release)
                .map_err(|e| HostError::KeySimulation(e.to_string()))?;
        }
        Ok(())
    }
}

impl KeyPresser for EnigoPresser {
    fn press(&mut self, descriptors: &str) -> Result<(), HostError> {
        let events = parse_descriptors(descriptors)?;
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| HostError::KeySimulation(e.to_string()))?;

        for event in &events {
            trace!("delivering key event {event}");
            match event {
                KeyEvent::Press(press) => Self::deliver_press(&mut enigo, press)?,
                KeyEvent::Hold { modifier, down } => {
                    let direction = if *down {
                        Direction::Press
                    } else {
                        Direction::Release
                    };
                    enigo
                        .key(Self::modifier_key(*modifier), direction)
                        .map_err(|e| HostError::KeySimulation(e.to_string()))?;
                }
            }
            if self.delay_ms > 0 {
                std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingPresser
// ---------------------------------------------------------------------------

/// Test double that records every batch instead of touching the OS.
#[derive(Debug, Default)]
pub struct RecordingPresser {
    pub batches: Vec<String>,
}

impl RecordingPresser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyPresser for RecordingPresser {
    fn press(&mut self, descriptors: &str) -> Result<(), HostError> {
        // Still validate the grammar so tests catch malformed plans.
        parse_descriptors(descriptors)?;
        self.batches.push(descriptors.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_presser_captures_batches() {
        let mut presser = RecordingPresser::new();
        presser.press("left:22 shift:down right:9 shift:up").unwrap();
        presser.press("backspace").unwrap();
        assert_eq!(
            presser.batches,
            vec!["left:22 shift:down right:9 shift:up", "backspace"]
        );
    }

    #[test]
    fn recording_presser_rejects_malformed_descriptors() {
        let mut presser = RecordingPresser::new();
        assert!(presser.press("left:zero").is_err());
        assert!(presser.batches.is_empty());
    }

    #[test]
    fn every_navigation_target_maps_to_a_key() {
        for target in [
            KeyTarget::Left,
            KeyTarget::Right,
            KeyTarget::Up,
            KeyTarget::Down,
            KeyTarget::Home,
            KeyTarget::End,
            KeyTarget::Backspace,
            KeyTarget::Delete,
        ] {
            assert!(EnigoPresser::target_key(&target).is_some(), "{target}");
        }
        assert!(EnigoPresser::target_key(&KeyTarget::Other("f4".into())).is_none());
    }
}
