//=========================================================================
// Render Backend
//
// Seam between the scheduler and whatever owns the GPU context.
//
// Responsibilities:
// - Define the calls the render thread makes on the graphics context
// - Describe the created context (`ContextInfo`) and derive `Capabilities`
// - Provide a headless implementation that records every call
//
// Notes:
// A backend is built on the window thread (it may need the native window)
// and then moved into the render thread, which is its only user from then
// on. Nothing outside the render thread can reach it.
//
//=========================================================================

//=== Submodules ==========================================================

mod capabilities;
mod headless;

//=== Public Exports ======================================================

pub use capabilities::{log_context_summary, Capabilities, ContextInfo};
pub use headless::{BackendCall, CallLog, HeadlessBackend};

//=== Internal Dependencies ===============================================

use crate::core::config::ClearColor;
use crate::core::error::EngineError;

//=== RenderBackend =======================================================

/// Graphics context operations, called only from the render thread.
pub trait RenderBackend: Send {
    /// Makes the context current on the calling thread and describes it.
    fn init_context(&mut self) -> Result<ContextInfo, EngineError>;

    /// Sets the swap interval (`1` = vsync on, `0` = off).
    fn set_swap_interval(&mut self, interval: u32) -> Result<(), EngineError>;

    /// (Re)allocates the off-screen framebuffer at the given size.
    fn recreate_frame_buffer(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    /// Clears color and depth before the frame is drawn.
    fn clear(&mut self, color: ClearColor) -> Result<(), EngineError>;

    /// Blocks until all submitted GPU work has completed.
    fn flush_and_finish(&mut self) -> Result<(), EngineError>;

    /// Presents the frame.
    fn swap_buffers(&mut self) -> Result<(), EngineError>;

    /// Gives up ownership of the context. Called once during finalize.
    fn release_context(&mut self);
}
