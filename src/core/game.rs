//=========================================================================
// Game Hooks
//=========================================================================
//
// User code plugged into the render loop. Every hook runs on the render
// thread, so implementations may own GPU resources.
//
// Call order:
// ```text
//   Init task      ──> init()
//   each tick      ──> update()          (0..=10 per iteration)
//   each iteration ──> render(partial)
//   resize task    ──> resize(w, h)
//   finalize       ──> dispose()
// ```
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::config::EngineConfig;
use crate::core::context::EngineTaskSender;
use crate::core::error::EngineError;
use crate::core::input::InputStateTracker;

//=== Game ================================================================

/// Simulation and drawing callbacks driven by the scheduler.
pub trait Game: Send {
    /// Called once from the Init task, after the framebuffer exists.
    ///
    /// `tasks` may be kept to schedule render-thread work later, from any
    /// thread. An error here aborts startup.
    fn init(&mut self, _config: &EngineConfig, _tasks: &EngineTaskSender) -> Result<(), EngineError> {
        Ok(())
    }

    /// One fixed step of simulation (1/20 s of game time).
    fn update(&mut self, input: &InputStateTracker, config: &EngineConfig);

    /// Draws the current state. `partial_tick` is in `[0, 1)`.
    fn render(&mut self, partial_tick: f32) -> Result<(), EngineError>;

    /// The framebuffer was recreated at a new size.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Called once when the render loop exits.
    fn dispose(&mut self) {}
}

/// Game that does nothing. Useful for driving the engine without content.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyGame;

impl Game for EmptyGame {
    fn update(&mut self, _input: &InputStateTracker, _config: &EngineConfig) {}

    fn render(&mut self, _partial_tick: f32) -> Result<(), EngineError> {
        Ok(())
    }
}
