//=========================================================================
// Game Controllers
//=========================================================================
//
// Polled controller state with edge detection.
//
// Architecture:
//   ControllerSource (backend) ──sample(id)──> GameController::refresh()
//                                               └─ ControllerSnapshot
//                                                  (replaced wholesale)
//
// Each update the snapshot is rebuilt in full. The buttons of the previous
// snapshot are kept as `previous_buttons`, so "pressed this update" is
// `down now && up before`.
//
//=========================================================================

//=== ButtonState =========================================================

/// Digital state of a controller button as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    Pressed,
}

impl ButtonState {
    pub fn is_pressed(self) -> bool {
        self == Self::Pressed
    }
}

impl From<bool> for ButtonState {
    fn from(pressed: bool) -> Self {
        if pressed {
            Self::Pressed
        } else {
            Self::Released
        }
    }
}

//=== ControllerSample ====================================================

/// Raw axes and buttons read from the backend for one controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSample {
    pub axes: Vec<f32>,
    pub buttons: Vec<ButtonState>,
}

//=== ControllerSource ====================================================

/// Backend that can be polled for controller state.
///
/// Lives on the render thread next to the input tracker. Connection and
/// disconnection are reported separately as input events.
pub trait ControllerSource: Send {
    /// Reads the current state of controller `id`, or `None` if unavailable.
    fn sample(&mut self, id: u32) -> Option<ControllerSample>;
}

/// Source used when no controller backend is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoControllers;

impl ControllerSource for NoControllers {
    fn sample(&mut self, _id: u32) -> Option<ControllerSample> {
        None
    }
}

//=== ControllerSnapshot ==================================================

/// One full read of a controller plus the buttons of the read before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub axes: Vec<f32>,
    pub buttons: Vec<ButtonState>,
    pub previous_buttons: Vec<ButtonState>,
}

impl ControllerSnapshot {
    /// Builds the snapshot that follows `self` given a fresh sample.
    ///
    /// The very first snapshot treats every button as previously released.
    fn next(&self, sample: ControllerSample, first: bool) -> Self {
        let previous_buttons = if first {
            vec![ButtonState::Released; sample.buttons.len()]
        } else {
            self.buttons.clone()
        };

        Self {
            axes: sample.axes,
            buttons: sample.buttons,
            previous_buttons,
        }
    }

    fn previous(&self, button: usize) -> ButtonState {
        self.previous_buttons
            .get(button)
            .copied()
            .unwrap_or(ButtonState::Released)
    }
}

//=== GameController ======================================================

/// A connected controller tracked by the input system.
#[derive(Debug, Clone)]
pub struct GameController {
    id: u32,
    name: String,
    is_gamepad: bool,
    snapshot: ControllerSnapshot,
    sampled: bool,
}

impl GameController {
    pub fn new(id: u32, name: impl Into<String>, is_gamepad: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_gamepad,
            snapshot: ControllerSnapshot::default(),
            sampled: false,
        }
    }

    /// Replaces the snapshot with `sample`, keeping the old buttons as previous.
    pub fn refresh(&mut self, sample: ControllerSample) {
        self.snapshot = self.snapshot.next(sample, !self.sampled);
        self.sampled = true;
    }

    //--- Queries ----------------------------------------------------------

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_gamepad(&self) -> bool {
        self.is_gamepad
    }

    pub fn snapshot(&self) -> &ControllerSnapshot {
        &self.snapshot
    }

    /// Returns `true` if the button went down since the previous update.
    pub fn is_button_pressed(&self, button: usize) -> bool {
        self.is_button_down(button) && !self.snapshot.previous(button).is_pressed()
    }

    /// Returns `true` while the button is held.
    pub fn is_button_down(&self, button: usize) -> bool {
        self.snapshot
            .buttons
            .get(button)
            .is_some_and(|state| state.is_pressed())
    }

    /// Returns `true` if the button went up since the previous update.
    pub fn is_button_released(&self, button: usize) -> bool {
        let up_now = self
            .snapshot
            .buttons
            .get(button)
            .is_some_and(|state| !state.is_pressed());
        up_now && self.snapshot.previous(button).is_pressed()
    }

    /// Axis value in `[-1, 1]`, or `0.0` for an axis the controller lacks.
    pub fn axis(&self, axis: usize) -> f32 {
        self.snapshot.axes.get(axis).copied().unwrap_or(0.0)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
