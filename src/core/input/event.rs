//=========================================================================
// Input Event Types
//
// Defines the internal representation of low-level input events.
//
// This module abstracts away platform-specific input (e.g. Winit) into a
// unified, engine-friendly format. Events are produced on the window
// thread and consumed by the InputStateTracker on the render thread.
//
// Event Flow:
// ```text
// Platform Layer (Winit, window thread)
//         ↓
//    InputEvent (this module)
//         ↓  crossbeam channel, one batch per event-loop wake-up
//    InputStateTracker::update() (render thread, once per iteration)
// ```
//
// Equality and hashing ignore the payload of continuous events
// (cursor position, scroll offset, cursor enter/leave) so the platform
// buffer can coalesce them: the last value wins.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::hash::{Hash, Hasher};

//=== MouseButton =========================================================

/// Physical mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (typically left).
    Left,

    /// Secondary button (typically right).
    Right,

    /// Middle button (wheel click).
    Middle,

    /// Thumb button, "back".
    Back,

    /// Thumb button, "forward".
    Forward,

    /// Any other button.
    Other(u16),
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the physical key location, not the character produced.
/// `KeyA` is the same physical key on QWERTY and AZERTY layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Numeric Keys -----------------------------------------------------

    /// Number row: 0-9
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic Keys --------------------------------------------------

    /// Letter keys: A-Z (physical location, not character)
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Function Keys ----------------------------------------------------

    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Modifier Keys ----------------------------------------------------

    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,

    /// Fallback for keys not explicitly mapped by the input layer.
    Unidentified,
}

//=== Modifiers ===========================================================

/// Modifier key state (Shift, Ctrl, Alt) carried by discrete events.
///
/// Left and right variants are not distinguished. Ctrl is Command on
/// macOS, Alt is Option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };

    pub const ALT: Self = Self {
        shift: false,
        ctrl: false,
        alt: true,
    };
}

//=== InputEvent ==========================================================

/// Low-level input event from the platform layer.
///
/// # Event Types
///
/// - **KeyDown/KeyUp**: discrete keyboard events with modifier state
/// - **MouseButtonDown/MouseButtonUp**: discrete mouse button events
/// - **MouseMoved**: cursor position in window pixels (top-left origin)
/// - **Scrolled**: wheel offset for this frame
/// - **CursorEntered**: cursor entered (`true`) or left the window
/// - **ControllerConnected/ControllerDisconnected**: gamepad hot-plug
/// - **Unidentified**: unknown events, ignored by the tracker
#[derive(Debug, Clone)]
pub enum InputEvent {
    KeyDown {
        key: KeyCode,
        modifiers: Modifiers,
    },

    KeyUp {
        key: KeyCode,
        modifiers: Modifiers,
    },

    MouseButtonDown {
        button: MouseButton,
        modifiers: Modifiers,
    },

    MouseButtonUp {
        button: MouseButton,
        modifiers: Modifiers,
    },

    MouseMoved { x: f64, y: f64 },

    Scrolled { x: f64, y: f64 },

    CursorEntered(bool),

    ControllerConnected {
        id: u32,
        name: String,
        is_gamepad: bool,
    },

    ControllerDisconnected { id: u32 },

    Unidentified,
}

impl InputEvent {
    /// Returns `true` for events whose latest value supersedes earlier ones.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::MouseMoved { .. } | Self::Scrolled { .. } | Self::CursorEntered(_)
        )
    }

    /// Returns a new event with updated modifiers (consumes self).
    ///
    /// Has no effect on events that carry no modifier state.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        match &mut self {
            Self::KeyDown { modifiers: m, .. }
            | Self::KeyUp { modifiers: m, .. }
            | Self::MouseButtonDown { modifiers: m, .. }
            | Self::MouseButtonUp { modifiers: m, .. } => {
                *m = modifiers;
            }
            _ => {}
        }
        self
    }
}

//--- Trait Implementations -----------------------------------------------

/// Discrete events compare by type and payload; continuous events compare
/// by type only, so a set keeps just the latest one.
impl PartialEq for InputEvent {
    fn eq(&self, other: &Self) -> bool {
        use InputEvent::*;
        match (self, other) {
            (KeyDown { key: a, modifiers: ma }, KeyDown { key: b, modifiers: mb })
            | (KeyUp { key: a, modifiers: ma }, KeyUp { key: b, modifiers: mb }) => {
                a == b && ma == mb
            }
            (
                MouseButtonDown { button: a, modifiers: ma },
                MouseButtonDown { button: b, modifiers: mb },
            )
            | (
                MouseButtonUp { button: a, modifiers: ma },
                MouseButtonUp { button: b, modifiers: mb },
            ) => a == b && ma == mb,
            (ControllerConnected { id: a, .. }, ControllerConnected { id: b, .. })
            | (ControllerDisconnected { id: a }, ControllerDisconnected { id: b }) => a == b,
            (MouseMoved { .. }, MouseMoved { .. })
            | (Scrolled { .. }, Scrolled { .. })
            | (CursorEntered(_), CursorEntered(_))
            | (Unidentified, Unidentified) => true,
            _ => false,
        }
    }
}

impl Eq for InputEvent {}

/// Consistent with equality: continuous payloads are not hashed.
impl Hash for InputEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Self::KeyDown { key, modifiers } | Self::KeyUp { key, modifiers } => {
                key.hash(state);
                modifiers.hash(state);
            }
            Self::MouseButtonDown { button, modifiers }
            | Self::MouseButtonUp { button, modifiers } => {
                button.hash(state);
                modifiers.hash(state);
            }
            Self::ControllerConnected { id, .. } | Self::ControllerDisconnected { id } => {
                id.hash(state);
            }
            _ => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn key_down(key: KeyCode) -> InputEvent {
        InputEvent::KeyDown {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn key_events_compare_by_key_and_modifiers() {
        assert_eq!(key_down(KeyCode::KeyA), key_down(KeyCode::KeyA));
        assert_ne!(key_down(KeyCode::KeyA), key_down(KeyCode::KeyB));
        assert_ne!(
            key_down(KeyCode::KeyA),
            key_down(KeyCode::KeyA).with_modifiers(Modifiers::CTRL)
        );
    }

    #[test]
    fn continuous_events_ignore_payload() {
        let a = InputEvent::MouseMoved { x: 1.0, y: 2.0 };
        let b = InputEvent::MouseMoved { x: 300.0, y: 400.0 };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let a = InputEvent::Scrolled { x: 0.0, y: 1.0 };
        let b = InputEvent::Scrolled { x: 0.0, y: -3.0 };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn hashset_keeps_latest_continuous_event() {
        let mut set = HashSet::new();
        set.insert(InputEvent::MouseMoved { x: 10.0, y: 10.0 });
        set.replace(InputEvent::MouseMoved { x: 20.0, y: 30.0 });
        set.insert(InputEvent::Scrolled { x: 0.0, y: 1.0 });

        assert_eq!(set.len(), 2);
        let moved = set
            .iter()
            .find_map(|e| match e {
                InputEvent::MouseMoved { x, y } => Some((*x, *y)),
                _ => None,
            })
            .unwrap();
        assert_eq!(moved, (20.0, 30.0));
    }

    #[test]
    fn with_modifiers_leaves_continuous_events_untouched() {
        let event = InputEvent::MouseMoved { x: 5.0, y: 6.0 }.with_modifiers(Modifiers::SHIFT);
        assert!(matches!(event, InputEvent::MouseMoved { x, y } if x == 5.0 && y == 6.0));
    }

    #[test]
    fn continuity_classification() {
        assert!(InputEvent::CursorEntered(true).is_continuous());
        assert!(!key_down(KeyCode::Space).is_continuous());
        assert!(!InputEvent::ControllerDisconnected { id: 0 }.is_continuous());
    }
}
