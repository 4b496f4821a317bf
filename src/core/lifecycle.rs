//=========================================================================
// Lifecycle Primitives
//=========================================================================
//
// Startup handshake and shutdown plumbing shared by the window thread and
// the render thread.
//
// Architecture:
// ```text
//   Window thread                         Render thread
//   ─────────────                         ─────────────
//   enqueue Init(signal) ──────────────>  drain: Init task
//   RenderThread::spawn()                   ├─ context setup
//   latch.wait()  ◄──────────────────────── └─ signal.signal()
//   show window, pump events              loop until CloseFlag
//   CloseFlag::raise() ───────────────────> finalize
//   RenderThread::join() ◄──────────────── thread exits
// ```
//
// The latch is a one-shot crossbeam channel. If the signal is dropped
// without firing (the Init task failed or the render thread died) the
// wait returns `StartupInterrupted` instead of blocking forever.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

//=== Internal Dependencies ===============================================

use crate::core::error::EngineError;

//=== Constants ===========================================================

/// Name given to the thread that owns the graphics context.
pub const RENDER_THREAD_NAME: &str = "Render Thread";

//=== Startup Latch =======================================================

/// Firing half of the startup latch. Consumed on use.
#[derive(Debug)]
pub struct StartupSignal {
    sender: Sender<()>,
}

impl StartupSignal {
    /// Releases the waiting thread.
    pub fn signal(self) {
        // Capacity 1 and a single send, so this only fails if the waiter is gone
        if self.sender.try_send(()).is_err() {
            debug!(target: "lifecycle", "Startup latch signaled with nobody waiting");
        }
    }
}

/// Waiting half of the startup latch.
#[derive(Debug)]
pub struct StartupLatch {
    receiver: Receiver<()>,
}

impl StartupLatch {
    /// Blocks until the signal fires.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StartupInterrupted`] if the signal was dropped
    /// without firing.
    pub fn wait(&self) -> Result<(), EngineError> {
        self.receiver
            .recv()
            .map_err(|_| EngineError::StartupInterrupted)
    }
}

/// Creates a connected signal/latch pair.
pub fn startup_latch() -> (StartupSignal, StartupLatch) {
    let (sender, receiver) = bounded(1);
    (StartupSignal { sender }, StartupLatch { receiver })
}

//=== CloseFlag ===========================================================

/// Shared "please stop" flag. Any thread may raise it; it is never lowered.
#[derive(Debug, Clone, Default)]
pub struct CloseFlag(Arc<AtomicBool>);

impl CloseFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

//=== WindowControl =======================================================

/// How the OS cursor behaves over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// Visible and free.
    #[default]
    Normal,
    /// Invisible over the window, still free to leave it.
    Hidden,
    /// Invisible and grabbed by the window (mouse-look).
    Disabled,
}

/// Window icon as tightly packed 8-bit RGBA rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowIcon {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Requests other threads may send to the window thread.
///
/// The window itself stays on the window thread; implementations only
/// forward the request there. Requests that need a window are dropped
/// while none exists.
pub trait WindowControl: Send + Sync {
    fn set_title(&self, title: String);

    /// Wakes the event pump so it re-checks the close flag.
    fn wake(&self);

    fn set_cursor_mode(&self, _mode: CursorMode) {}

    /// Moves the cursor to `(x, y)` in window pixels.
    fn set_cursor_position(&self, _x: f64, _y: f64) {}

    /// Moves the cursor to the middle of the window.
    fn center_cursor(&self) {}

    /// `None` restores the platform default icon.
    fn set_icon(&self, _icon: Option<WindowIcon>) {}
}

/// Control that ignores every request (no window attached).
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedWindow;

impl WindowControl for DetachedWindow {
    fn set_title(&self, _title: String) {}

    fn wake(&self) {}
}

//=== RenderThread ========================================================

/// Handle to the spawned render thread.
#[derive(Debug)]
pub struct RenderThread {
    handle: JoinHandle<()>,
}

impl RenderThread {
    /// Spawns `body` on a thread named [`RENDER_THREAD_NAME`].
    pub fn spawn<F>(body: F) -> Result<Self, EngineError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(body)
            .map_err(EngineError::ThreadSpawn)?;

        info!(target: "lifecycle", "{} spawned", RENDER_THREAD_NAME);
        Ok(Self { handle })
    }

    /// Waits for the render thread to finish finalization.
    pub fn join(self) -> Result<(), EngineError> {
        match self.handle.join() {
            Ok(()) => {
                info!(target: "lifecycle", "{} terminated cleanly", RENDER_THREAD_NAME);
                Ok(())
            }
            Err(_) => {
                error!(target: "lifecycle", "{} panicked", RENDER_THREAD_NAME);
                Err(EngineError::RenderThreadPanicked)
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
