//=========================================================================
// Input System
//
// Engine-side input representation and per-iteration state tracking.
//
// Responsibilities:
// - Define the platform-independent `InputEvent` vocabulary
// - Advance key/button state machines once per render-loop iteration
// - Poll controllers through a pluggable `ControllerSource`
//
// Notes:
// The tracker is owned by the render loop. Events arrive in batches from
// the window thread over a crossbeam channel and are applied in `update`.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod controller;
pub mod event;
mod state_tracker;

//=== Public Exports ======================================================

pub use controller::{
    ButtonState, ControllerSample, ControllerSnapshot, ControllerSource, GameController,
    NoControllers,
};
pub use event::{InputEvent, KeyCode, Modifiers, MouseButton};
pub use state_tracker::{InputAxis, InputState, InputStateTracker};
