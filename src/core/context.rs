//=========================================================================
// Render Context
//=========================================================================
//
// State owned by the render thread and handed to every task it executes,
// plus the engine-defined tasks (Init, framebuffer resize, vsync).
//
// Architecture:
// ```text
//   RenderContext (render thread only)
//     ├─ backend       Box<dyn RenderBackend>   GPU context
//     ├─ game          Box<dyn Game>            user hooks
//     ├─ capabilities  Option<Capabilities>     set by Init
//     ├─ config        Arc<EngineConfig>        shared with window thread
//     ├─ close         CloseFlag                shared with everyone
//     └─ tasks         EngineTaskSender         follow-up work, next drain
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::sync::Arc;

use log::info;

//=== Internal Dependencies ===============================================

use crate::core::config::EngineConfig;
use crate::core::error::EngineError;
use crate::core::game::Game;
use crate::core::lifecycle::{CloseFlag, StartupSignal};
use crate::core::render::{log_context_summary, Capabilities, RenderBackend};
use crate::core::task_queue::{Task, TaskQueue, TaskSender};

//=== Constants ===========================================================

pub const INIT_TASK_NAME: &str = "Init";
pub const RESIZE_TASK_NAME: &str = "Framebuffer size change";
pub const VSYNC_TASK_NAME: &str = "Set vsync";

//=== Type Aliases ========================================================

/// Task executed against the render-thread state.
pub type EngineTask = Task<RenderContext>;
pub type EngineTaskQueue = TaskQueue<RenderContext>;
pub type EngineTaskSender = TaskSender<RenderContext>;

//=== RenderContext =======================================================

/// Everything a task running on the render thread may touch.
pub struct RenderContext {
    pub backend: Box<dyn RenderBackend>,
    pub game: Box<dyn Game>,
    /// `None` until the Init task has run.
    pub capabilities: Option<Capabilities>,
    pub config: Arc<EngineConfig>,
    pub close: CloseFlag,
    /// Sender into the queue that runs this context's tasks.
    pub tasks: EngineTaskSender,
    context_created: bool,
}

impl RenderContext {
    pub fn new(
        backend: Box<dyn RenderBackend>,
        game: Box<dyn Game>,
        config: Arc<EngineConfig>,
        close: CloseFlag,
        tasks: EngineTaskSender,
    ) -> Self {
        Self {
            backend,
            game,
            capabilities: None,
            config,
            close,
            tasks,
            context_created: false,
        }
    }

    /// `true` once Init has completed the capability check.
    pub fn is_initialized(&self) -> bool {
        self.capabilities.is_some()
    }

    /// `true` once the backend has created a context, even if Init failed later.
    pub fn has_context(&self) -> bool {
        self.context_created
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("capabilities", &self.capabilities)
            .field("config", &self.config)
            .field("close", &self.close.is_raised())
            .finish_non_exhaustive()
    }
}

//=== Engine Tasks ========================================================

/// Context-dependent startup work. Fires `signal` once the first frame can
/// be shown.
///
/// On failure the close flag is raised and `signal` is dropped unfired,
/// which interrupts the window thread's startup wait.
pub fn init_task(signal: StartupSignal) -> EngineTask {
    Task::new(INIT_TASK_NAME, 0, move |ctx: &mut RenderContext| {
        if let Err(e) = initialize(ctx) {
            ctx.close.raise();
            return Err(e);
        }

        signal.signal();
        Ok(())
    })
}

fn initialize(ctx: &mut RenderContext) -> Result<(), EngineError> {
    let info = ctx.backend.init_context()?;
    ctx.context_created = true;
    let capabilities = Capabilities::derive(&info)?;
    log_context_summary(ctx.config.title(), ctx.config.version(), &info, &capabilities);
    ctx.capabilities = Some(capabilities);

    ctx.backend.set_swap_interval(u32::from(ctx.config.is_vsync()))?;

    let (width, height) = (ctx.config.window_width(), ctx.config.window_height());
    ctx.backend.recreate_frame_buffer(width, height)?;
    ctx.backend.set_viewport(width, height)?;

    ctx.game.init(&ctx.config, &ctx.tasks)?;

    // Everything must be on the GPU before the window becomes visible
    ctx.backend.flush_and_finish()?;

    info!(target: "lifecycle", "Render context initialized ({}x{})", width, height);
    Ok(())
}

/// Rebuilds the framebuffer for a new window size and tells the game.
pub fn resize_task(width: u32, height: u32) -> EngineTask {
    Task::new(RESIZE_TASK_NAME, 0, move |ctx: &mut RenderContext| {
        ctx.backend.recreate_frame_buffer(width, height)?;
        ctx.game.resize(width, height);
        ctx.backend.set_viewport(width, height)
    })
}

/// Applies the swap interval for `enabled`.
///
/// Before Init the context does not exist yet; Init reads the flag itself.
pub fn vsync_task(enabled: bool) -> EngineTask {
    Task::new(VSYNC_TASK_NAME, 0, move |ctx: &mut RenderContext| {
        if !ctx.is_initialized() {
            return Ok(());
        }
        ctx.backend.set_swap_interval(u32::from(enabled))
    })
}

//=========================================================================
// Unit Tests
//=========================================================================
