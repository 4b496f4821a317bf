//=========================================================================
// Engine Errors
//=========================================================================
//
// Error taxonomy shared by the lifecycle, the render backend and tasks.
//
// Startup-class errors are unrecoverable: the lifecycle controller aborts
// the launch when it sees one. Everything else is contained where it
// happens (a failing task is logged and dropped).
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== EngineError =========================================================

/// Errors produced by the engine shell.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Event loop creation failed (OS-level issue).
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(String),

    /// Event loop execution error.
    #[error("event loop error: {0}")]
    EventLoopExecution(String),

    /// The native window could not be created.
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    /// The graphics context could not be created or made current.
    #[error("graphics context error: {0}")]
    Context(String),

    /// A capability the engine cannot run without is missing.
    #[error("required capability missing: {0}")]
    MissingCapability(String),

    /// The render thread could not be spawned.
    #[error("failed to spawn render thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The startup latch was dropped before being signaled.
    #[error("startup wait interrupted: render thread never signaled readiness")]
    StartupInterrupted,

    /// The render thread panicked.
    #[error("render thread panicked")]
    RenderThreadPanicked,

    /// A render-thread backend call failed at runtime.
    #[error("render backend error: {0}")]
    Backend(String),

    /// A queued task failed.
    #[error("task [{name}] failed: {message}")]
    Task { name: String, message: String },
}

impl EngineError {
    /// Builds a task failure with the given task name.
    pub fn task(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Task {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors that must abort the launch sequence.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            Self::EventLoopCreation(_)
                | Self::EventLoopExecution(_)
                | Self::WindowCreation(_)
                | Self::Context(_)
                | Self::MissingCapability(_)
                | Self::ThreadSpawn(_)
                | Self::StartupInterrupted
                | Self::RenderThreadPanicked
        )
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_are_unrecoverable() {
        assert!(EngineError::StartupInterrupted.is_unrecoverable());
        assert!(EngineError::MissingCapability("fbo".into()).is_unrecoverable());
        assert!(EngineError::WindowCreation("no display".into()).is_unrecoverable());
    }

    #[test]
    fn event_loop_errors_carry_the_platform_message() {
        let err = EngineError::EventLoopCreation("display unavailable".into());
        assert!(err.is_unrecoverable());
        assert_eq!(err.to_string(), "event loop creation failed: display unavailable");
        assert!(std::error::Error::source(&err).is_none(), "Platform error is flattened to text");
    }

    #[test]
    fn runtime_errors_are_recoverable() {
        assert!(!EngineError::task("Resize", "boom").is_unrecoverable());
        assert!(!EngineError::Backend("swap failed".into()).is_unrecoverable());
    }

    #[test]
    fn task_error_display_names_the_task() {
        let err = EngineError::task("Framebuffer size change", "out of memory");
        assert_eq!(
            err.to_string(),
            "task [Framebuffer size change] failed: out of memory"
        );
    }
}
