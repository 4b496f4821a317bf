//=========================================================================
// Input State Tracker
//=========================================================================
//
// Per-code press/release state machine for keys, mouse buttons and
// controllers, advanced once per render-loop iteration.
//
// Architecture:
// ```text
//   events ──handle_event()──> Pressed / Released   (any time)
//
//   update(events):
//     1. scroll reset to zero
//     2. Pressed → Down, Released → None
//     3. events since last update applied
//     4. mouse delta = current - last; last = current
//     5. controllers re-sampled in full
// ```
//
// `None` and `Down` are stable until an event moves them. A key that is
// pressed and released between two updates ends up `Released`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::info;

//=== Internal Dependencies ===============================================

use super::controller::{ControllerSource, GameController, NoControllers};
use super::event::{InputEvent, KeyCode, Modifiers, MouseButton};

//=== InputState ==========================================================

/// State of a single key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputState {
    /// Up, and was up at the last update.
    #[default]
    None,
    /// Went down since the last update.
    Pressed,
    /// Held for at least one full update.
    Down,
    /// Went up since the last update.
    Released,
}

impl InputState {
    /// State after one update with no new events.
    pub fn advanced(self) -> Self {
        match self {
            Self::Pressed => Self::Down,
            Self::Released => Self::None,
            stable => stable,
        }
    }

    pub fn is_down(self) -> bool {
        matches!(self, Self::Pressed | Self::Down)
    }
}

//=== InputAxis ===========================================================

/// Virtual axes combining keyboard (WASD) and the first controller's left stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAxis {
    /// A = -1, D = +1, controller axis 0.
    Horizontal,
    /// W = -1, S = +1, controller axis 1.
    Vertical,
}

//=== InputStateTracker ===================================================

/// Double-buffered input state owned by the render thread.
pub struct InputStateTracker {
    //--- Discrete State --------------------------------------------------
    keys: HashMap<KeyCode, InputState>,
    mouse_buttons: HashMap<MouseButton, InputState>,
    modifiers: Modifiers,

    //--- Continuous State ------------------------------------------------
    mouse_position: (f64, f64),
    last_mouse_position: (f64, f64),
    mouse_delta: (f64, f64),
    scroll: (f64, f64),
    cursor_entered: bool,

    //--- Controllers -----------------------------------------------------
    controllers: BTreeMap<u32, GameController>,
    controller_source: Box<dyn ControllerSource>,
}

impl InputStateTracker {
    /// Creates a tracker with no controller backend.
    pub fn new() -> Self {
        Self::with_controller_source(Box::new(NoControllers))
    }

    pub fn with_controller_source(controller_source: Box<dyn ControllerSource>) -> Self {
        Self {
            keys: HashMap::new(),
            mouse_buttons: HashMap::new(),
            modifiers: Modifiers::NONE,
            mouse_position: (0.0, 0.0),
            last_mouse_position: (0.0, 0.0),
            mouse_delta: (0.0, 0.0),
            scroll: (0.0, 0.0),
            cursor_entered: false,
            controllers: BTreeMap::new(),
            controller_source,
        }
    }

    //--- Frame Processing -------------------------------------------------

    /// Advances every state machine by one iteration and applies `events`.
    pub fn update<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a InputEvent>,
    {
        self.scroll = (0.0, 0.0);

        for state in self.keys.values_mut().chain(self.mouse_buttons.values_mut()) {
            *state = state.advanced();
        }

        for event in events {
            self.handle_event(event);
        }

        self.mouse_delta = (
            self.mouse_position.0 - self.last_mouse_position.0,
            self.mouse_position.1 - self.last_mouse_position.1,
        );
        self.last_mouse_position = self.mouse_position;

        for (id, controller) in self.controllers.iter_mut() {
            if let Some(sample) = self.controller_source.sample(*id) {
                controller.refresh(sample);
            }
        }
    }

    /// Applies a single event immediately, the way an OS callback would.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { key, modifiers } => {
                self.modifiers = *modifiers;
                self.keys.insert(*key, InputState::Pressed);
            }

            InputEvent::KeyUp { key, modifiers } => {
                self.modifiers = *modifiers;
                self.keys.insert(*key, InputState::Released);
            }

            InputEvent::MouseButtonDown { button, modifiers } => {
                self.modifiers = *modifiers;
                self.mouse_buttons.insert(*button, InputState::Pressed);
            }

            InputEvent::MouseButtonUp { button, modifiers } => {
                self.modifiers = *modifiers;
                self.mouse_buttons.insert(*button, InputState::Released);
            }

            InputEvent::MouseMoved { x, y } => {
                self.mouse_position = (*x, *y);
            }

            InputEvent::Scrolled { x, y } => {
                self.scroll = (*x, *y);
            }

            InputEvent::CursorEntered(entered) => {
                self.cursor_entered = *entered;
            }

            InputEvent::ControllerConnected { id, name, is_gamepad } => {
                let mut controller = GameController::new(*id, name.clone(), *is_gamepad);
                if let Some(sample) = self.controller_source.sample(*id) {
                    controller.refresh(sample);
                }
                info!(target: "input", "Controller connected. ({}, {})", id, name);
                self.controllers.insert(*id, controller);
            }

            InputEvent::ControllerDisconnected { id } => {
                if let Some(controller) = self.controllers.remove(id) {
                    info!(
                        target: "input",
                        "Controller disconnected. ({}, {})",
                        id,
                        controller.name()
                    );
                }
            }

            InputEvent::Unidentified => {}
        }
    }

    //=====================================================================
    // Query API - Keyboard
    //=====================================================================

    /// Current state of `key` (`None` if never seen).
    pub fn key_state(&self, key: KeyCode) -> InputState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// Returns `true` while the key is held (pressed this update or earlier).
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.key_state(key).is_down()
    }

    /// Returns `true` only on the update the key went down.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.key_state(key) == InputState::Pressed
    }

    /// Returns `true` only on the update the key went up.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.key_state(key) == InputState::Released
    }

    //=====================================================================
    // Query API - Mouse
    //=====================================================================

    pub fn mouse_state(&self, button: MouseButton) -> InputState {
        self.mouse_buttons.get(&button).copied().unwrap_or_default()
    }

    /// Like [`is_key_down`](Self::is_key_down) but for mouse buttons.
    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_state(button).is_down()
    }

    /// Like [`is_key_pressed`](Self::is_key_pressed) but for mouse buttons.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_state(button) == InputState::Pressed
    }

    /// Like [`is_key_released`](Self::is_key_released) but for mouse buttons.
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_state(button) == InputState::Released
    }

    /// Cursor position in window pixels (top-left origin).
    pub fn mouse_position(&self) -> (f64, f64) {
        self.mouse_position
    }

    /// Position at the previous update.
    pub fn last_mouse_position(&self) -> (f64, f64) {
        self.last_mouse_position
    }

    /// Cursor movement since the previous update.
    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    /// Scroll offset received during this update.
    pub fn scroll(&self) -> (f64, f64) {
        self.scroll
    }

    pub fn is_cursor_entered(&self) -> bool {
        self.cursor_entered
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    //=====================================================================
    // Query API - Controllers
    //=====================================================================

    pub fn is_controller_connected(&self) -> bool {
        !self.controllers.is_empty()
    }

    /// The connected controller with the lowest id.
    pub fn first_controller(&self) -> Option<&GameController> {
        self.controllers.values().next()
    }

    pub fn controller(&self, id: u32) -> Option<&GameController> {
        self.controllers.get(&id)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &GameController> {
        self.controllers.values()
    }

    /// Combined keyboard/controller axis in `[-1, 1]`.
    ///
    /// Whichever of the two inputs has the larger magnitude wins.
    pub fn axis(&self, axis: InputAxis) -> f32 {
        let (negative, positive, controller_axis) = match axis {
            InputAxis::Horizontal => (KeyCode::KeyA, KeyCode::KeyD, 0),
            InputAxis::Vertical => (KeyCode::KeyW, KeyCode::KeyS, 1),
        };

        let mut keyboard = 0.0f32;
        if self.is_key_down(negative) {
            keyboard -= 1.0;
        }
        if self.is_key_down(positive) {
            keyboard += 1.0;
        }

        let controller = self
            .first_controller()
            .map_or(0.0, |c| c.axis(controller_axis).clamp(-1.0, 1.0));

        if keyboard.abs() > controller.abs() {
            keyboard
        } else {
            controller
        }
    }
}

//--- Trait Implementations -----------------------------------------------

impl Default for InputStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InputStateTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStateTracker")
            .field("keys", &self.keys)
            .field("mouse_buttons", &self.mouse_buttons)
            .field("mouse_position", &self.mouse_position)
            .field("mouse_delta", &self.mouse_delta)
            .field("scroll", &self.scroll)
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
