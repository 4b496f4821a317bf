//=========================================================================
// Window Event Pump
//=========================================================================
//
// Window-thread handling of OS window notifications.
//
// Architecture:
// ```text
//   winit WindowEvent ──> PlatformEvent ──> WindowEventPump::handle()
//                                             ├─ EngineConfig atomics
//                                             ├─ TaskSender (GPU work)
//                                             └─ CloseFlag
// ```
//
// The pump never touches the graphics context. Anything that needs it is
// wrapped in a task and executed by the render thread on its next drain.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use log::{debug, info, trace};

//=== Internal Dependencies ===============================================

use crate::core::config::EngineConfig;
use crate::core::context::{resize_task, EngineTaskSender};
use crate::core::lifecycle::CloseFlag;

//=== PlatformEvent =======================================================

/// Window notifications the pump reacts to, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// New framebuffer size in physical pixels.
    Resized { width: u32, height: u32 },

    /// Window minimized (`true`) or restored.
    Iconified(bool),

    /// Window maximized (`true`) or restored.
    Maximized(bool),

    /// User or OS asked the window to close.
    CloseRequested,
}

//=== WindowEventPump =====================================================

/// Applies window notifications to shared state. Lives on the window thread.
#[derive(Clone)]
pub struct WindowEventPump {
    config: Arc<EngineConfig>,
    tasks: EngineTaskSender,
    close: CloseFlag,
}

impl WindowEventPump {
    pub fn new(config: Arc<EngineConfig>, tasks: EngineTaskSender, close: CloseFlag) -> Self {
        Self { config, tasks, close }
    }

    /// Reacts to one notification.
    pub fn handle(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::Resized { width, height } => {
                if width == 0 || height == 0 {
                    trace!(target: "platform", "Ignoring resize to {}x{}", width, height);
                    return;
                }

                debug!(target: "platform", "Framebuffer resized to {}x{}", width, height);
                self.config.set_window_size(width, height);
                self.tasks.submit(resize_task(width, height));
            }

            PlatformEvent::Iconified(minimized) => {
                debug!(target: "platform", "Window minimized: {}", minimized);
                self.config.set_minimized(minimized);
            }

            PlatformEvent::Maximized(maximized) => {
                debug!(target: "platform", "Window maximized: {}", maximized);
                self.config.set_maximized(maximized);
            }

            PlatformEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.close.raise();
            }
        }
    }

    /// Returns `true` once any thread has raised the close flag.
    pub fn should_exit(&self) -> bool {
        self.close.is_raised()
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
