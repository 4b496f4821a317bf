//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use cadence_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine facade
pub use crate::engine::{Engine, EngineBuilder, EngineHandle};
pub use crate::core::lifecycle::{CursorMode, WindowIcon};

// Configuration and errors
pub use crate::core::config::{ClearColor, DebugMode, EngineConfig, WindowMode};
pub use crate::core::error::EngineError;

// Game hooks and tasks
pub use crate::core::context::{EngineTaskSender, RenderContext};
pub use crate::core::game::Game;

// Input system
pub use crate::core::input::{InputAxis, InputState, InputStateTracker, KeyCode, Modifiers, MouseButton};

// Rendering
pub use crate::core::render::{Capabilities, ContextInfo, HeadlessBackend, RenderBackend};
