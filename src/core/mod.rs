//=========================================================================
// Core Systems
//
// Everything that runs independently of the windowing backend.
//
// Responsibilities:
// - Shared configuration and the error taxonomy
// - Cross-thread task queue and the render-thread context it feeds
// - Fixed-timestep bookkeeping and the render loop built on it
// - Startup/shutdown primitives (latch, close flag, render thread)
// - Input state tracking and the render backend seam
//
// Notes:
// Only `platform` knows about Winit. The modules here can be driven by
// tests with synthetic time, a headless backend and plain channels.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod config;
pub mod context;
pub mod error;
pub mod game;
pub mod input;
pub mod lifecycle;
pub mod render;
pub mod scheduler;
pub mod task_queue;
pub mod timestep;

#[cfg(test)]
pub(crate) mod log_capture;

//=== Public Exports ======================================================

pub use config::{ClearColor, DebugMode, EngineConfig, WindowMode};
pub use context::{EngineTask, EngineTaskSender, RenderContext};
pub use error::EngineError;
pub use game::{EmptyGame, Game};
pub use task_queue::{DrainReport, Task, TaskQueue, TaskSender};
