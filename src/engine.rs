//=========================================================================
// Cadence Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_title()            ├─ enqueues Init task
//         ├─ with_window_size()      ├─ runs platform (window thread)
//         ├─ with_game()             │    └─ spawns render thread
//         └─ with_backend()          └─ blocks until both threads exit
//
//     EngineHandle ──shutdown()──> CloseFlag + wake window thread
//                  ──tasks()─────> EngineTaskSender (render-thread work)
//                  ──set_vsync()─> config flag + "Set vsync" task
//                  ──cursor/icon─> WindowControl (window thread)
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::{Arc, OnceLock};

use crossbeam_channel::bounded;
use log::{debug, error, info};
use winit::event_loop::EventLoop;
use winit::window::Window;

//=== Internal Dependencies ===============================================

use crate::core::config::{ClearColor, DebugMode, EngineConfig, WindowMode};
use crate::core::context::{init_task, vsync_task, EngineTaskQueue, EngineTaskSender};
use crate::core::error::EngineError;
use crate::core::game::{EmptyGame, Game};
use crate::core::input::{ControllerSource, InputStateTracker, NoControllers};
use crate::core::lifecycle::{startup_latch, CloseFlag, CursorMode, WindowControl, WindowIcon};
use crate::core::render::{HeadlessBackend, RenderBackend};
use crate::platform::{
    BackendFactory, Platform, ProxyWindowControl, RenderStartup, WindowCommand, WindowEventPump,
};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// Provides a fluent API for setting engine parameters before construction.
///
/// # Default Values
///
/// - **Window**: 1280x720, windowed, resizable, vsync off
/// - **Debug mode**: `None`
/// - **Background FPS**: unlimited
/// - **Channel capacity**: 128 input batches
/// - **Game**: [`EmptyGame`]
/// - **Backend**: [`HeadlessBackend`]
///
/// # Examples
///
/// ```no_run
/// use cadence_engine::EngineBuilder;
/// use cadence_engine::core::config::DebugMode;
///
/// let result = EngineBuilder::new()
///     .with_title("Sandbox")
///     .with_window_size(1600, 900)
///     .with_debug_mode(DebugMode::Low)
///     .build()
///     .run();
///
/// if let Err(e) = result {
///     eprintln!("engine stopped: {e}");
/// }
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    game: Box<dyn Game>,
    backend_factory: BackendFactory,
    controller_source: Box<dyn ControllerSource>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            game: Box::new(EmptyGame),
            backend_factory: Box::new(
                |_: &Arc<Window>| -> Result<Box<dyn RenderBackend>, EngineError> {
                    Ok(Box::new(HeadlessBackend::new()))
                },
            ),
            controller_source: Box::new(NoControllers),
        }
    }

    //--- Window -----------------------------------------------------------

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Version shown in the debug window title. Defaults to the crate version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Initial window size in physical pixels.
    ///
    /// Each side is clamped to at least
    /// [`MIN_WINDOW_DIMENSION`](crate::core::config::MIN_WINDOW_DIMENSION).
    pub fn with_window_size(self, width: u32, height: u32) -> Self {
        self.config.set_window_size(width, height);
        self
    }

    /// Minimum and/or maximum window size.
    ///
    /// # Panics
    ///
    /// Panics if both are given and the minimum exceeds the maximum.
    pub fn with_size_limits(mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>) -> Self {
        if let (Some(min), Some(max)) = (min, max) {
            assert!(
                min.0 <= max.0 && min.1 <= max.1,
                "Minimum window size must not exceed maximum, got {:?} > {:?}",
                min,
                max
            );
        }
        self.config.min_size = min;
        self.config.max_size = max;
        self
    }

    pub fn with_window_mode(mut self, mode: WindowMode) -> Self {
        self.config.window_mode = mode;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.config.resizable = resizable;
        self
    }

    /// Starts maximized (windowed mode only).
    pub fn with_maximized(self, maximized: bool) -> Self {
        self.config.set_maximized(maximized);
        self
    }

    //--- Rendering --------------------------------------------------------

    pub fn with_vsync(self, vsync: bool) -> Self {
        self.config.set_vsync(vsync);
        self
    }

    pub fn with_clear_color(mut self, color: ClearColor) -> Self {
        self.config.clear_color = color;
        self
    }

    /// Frame-rate cap while minimized.
    ///
    /// Only takes effect for values above the tick rate (20).
    ///
    /// # Panics
    ///
    /// Panics if `fps == 0`.
    pub fn with_background_fps(mut self, fps: u32) -> Self {
        assert!(fps > 0, "Background FPS must be positive");
        self.config.background_fps = Some(fps);
        self
    }

    pub fn with_debug_mode(mut self, mode: DebugMode) -> Self {
        self.config.debug_mode = mode;
        self
    }

    //--- Plumbing ---------------------------------------------------------

    /// Sets the capacity of the window → render input channel, in batches.
    ///
    /// Default: 128
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.config.input_channel_capacity = capacity;
        self
    }

    pub fn with_game(mut self, game: impl Game + 'static) -> Self {
        self.game = Box::new(game);
        self
    }

    /// Sets how the render backend is created from the native window.
    ///
    /// The factory runs on the window thread; the backend it returns is
    /// moved to the render thread.
    pub fn with_backend<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&Arc<Window>) -> Result<Box<dyn RenderBackend>, EngineError> + 'static,
    {
        self.backend_factory = Box::new(factory);
        self
    }

    pub fn with_controller_source(mut self, source: impl ControllerSource + 'static) -> Self {
        self.controller_source = Box::new(source);
        self
    }

    /// Builds the engine instance.
    pub fn build(self) -> Engine {
        info!(
            "Building engine ({} v{}, {}x{}, channel: {})",
            self.config.title(),
            self.config.version(),
            self.config.window_width(),
            self.config.window_height(),
            self.config.input_channel_capacity()
        );

        let tasks = EngineTaskQueue::new().with_debug_mode(self.config.debug_mode());

        Engine {
            config: Arc::new(self.config),
            tasks,
            game: self.game,
            backend_factory: self.backend_factory,
            controller_source: self.controller_source,
            close: CloseFlag::new(),
            window_control: Arc::new(OnceLock::new()),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== EngineHandle ========================================================

/// Cloneable handle for driving the engine from any thread.
///
/// Window requests made before the window exists are dropped.
#[derive(Clone)]
pub struct EngineHandle {
    config: Arc<EngineConfig>,
    tasks: EngineTaskSender,
    close: CloseFlag,
    window_control: Arc<OnceLock<Arc<dyn WindowControl>>>,
}

impl EngineHandle {
    /// Asks both threads to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!(target: "lifecycle", "Shutdown requested");
        self.close.raise();
        if let Some(control) = self.window_control.get() {
            control.wake();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.close.is_raised()
    }

    //--- Render Thread ----------------------------------------------------

    /// Sender for work that must run on the render thread.
    pub fn tasks(&self) -> EngineTaskSender {
        self.tasks.clone()
    }

    /// Turns vsync on or off. Takes effect on the next drain.
    pub fn set_vsync(&self, enabled: bool) {
        self.config.set_vsync(enabled);
        self.tasks.submit(vsync_task(enabled));
    }

    //--- Window Thread ----------------------------------------------------

    pub fn set_title(&self, title: impl Into<String>) {
        self.with_window(|control| control.set_title(title.into()));
    }

    pub fn set_cursor_mode(&self, mode: CursorMode) {
        self.with_window(|control| control.set_cursor_mode(mode));
    }

    pub fn set_cursor_position(&self, x: f64, y: f64) {
        self.with_window(|control| control.set_cursor_position(x, y));
    }

    pub fn center_cursor(&self) {
        self.with_window(|control| control.center_cursor());
    }

    pub fn set_icon(&self, icon: Option<WindowIcon>) {
        self.with_window(|control| control.set_icon(icon));
    }

    fn with_window(&self, request: impl FnOnce(&dyn WindowControl)) {
        match self.window_control.get() {
            Some(control) => request(control.as_ref()),
            None => debug!(target: "platform", "Engine not running, window request dropped"),
        }
    }
}

//=== Engine ==============================================================

/// Cadence Engine runtime.
///
/// Create via [`EngineBuilder`] with `EngineBuilder::new().build()`.
///
/// # Architecture
///
/// ```text
/// Engine (window thread)
///   ├─► Platform (Winit event loop, blocks on OS events)
///   │     └─► WindowEventPump, input batching
///   │
///   └─► RenderLoop (render thread, owns the GPU context)
///         └─► tasks → input → ticks @ 20 TPS → render
/// ```
pub struct Engine {
    config: Arc<EngineConfig>,
    tasks: EngineTaskQueue,
    game: Box<dyn Game>,
    backend_factory: BackendFactory,
    controller_source: Box<dyn ControllerSource>,
    close: CloseFlag,
    window_control: Arc<OnceLock<Arc<dyn WindowControl>>>,
}

impl Engine {
    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Sender for render-thread work. Tasks sent before `run` execute
    /// right after Init.
    pub fn tasks(&self) -> EngineTaskSender {
        self.tasks.sender()
    }

    /// Handle for controlling the engine from any thread.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            config: self.config.clone(),
            tasks: self.tasks.sender(),
            close: self.close.clone(),
            window_control: self.window_control.clone(),
        }
    }

    //--- Execution --------------------------------------------------------

    /// Starts the engine runtime and blocks until the application exits.
    ///
    /// # Lifecycle
    ///
    /// 1. Enqueues the Init task (its completion releases the startup latch)
    /// 2. Creates the event loop and runs the platform on this thread
    /// 3. On first resume: window created hidden, render thread spawned,
    ///    window shown after Init
    /// 4. On close: event loop exits, render thread finalizes and is joined
    ///
    /// # Errors
    ///
    /// Returns an unrecoverable [`EngineError`] if startup fails, the event
    /// loop fails, or the render thread panics.
    pub fn run(self) -> Result<(), EngineError> {
        info!("Starting engine runtime ({} v{})", self.config.title(), self.config.version());

        //--- 1. Init task ------------------------------------------------
        let (signal, latch) = startup_latch();
        let mut tasks = self.tasks;
        tasks.submit_first(init_task(signal));

        //--- 2. Input channel ---------------------------------------------
        let capacity = self.config.input_channel_capacity();
        let (input_tx, input_rx) = bounded(capacity);
        info!("Input channel created (capacity: {})", capacity);

        //--- 3. Event loop and window control -----------------------------
        let event_loop = EventLoop::<WindowCommand>::with_user_event()
            .build()
            .map_err(|e| EngineError::EventLoopCreation(e.to_string()))?;

        let control: Arc<dyn WindowControl> =
            Arc::new(ProxyWindowControl::new(event_loop.create_proxy()));
        if self.window_control.set(control.clone()).is_err() {
            error!("Engine window control already installed");
        }

        //--- 4. Platform ---------------------------------------------------
        let pump = WindowEventPump::new(self.config.clone(), tasks.sender(), self.close.clone());
        let startup = RenderStartup {
            backend_factory: self.backend_factory,
            game: self.game,
            tasks,
            input: InputStateTracker::with_controller_source(self.controller_source),
            input_events: input_rx,
            latch,
        };
        let platform = Platform::new(pump, self.close.clone(), input_tx, Some(startup), control);
        info!("Platform initialized, entering event loop");

        let result = platform.run(event_loop);

        match &result {
            Ok(()) => info!("Engine shutdown complete"),
            Err(e) => error!("Engine stopped with error: {}", e),
        }
        result
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //=====================================================================
    // EngineBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let engine = EngineBuilder::new().build();
        let config = engine.config();

        assert_eq!(config.window_width(), 1280);
        assert_eq!(config.window_height(), 720);
        assert_eq!(config.input_channel_capacity(), 128);
        assert_eq!(config.debug_mode(), DebugMode::None);
        assert_eq!(config.background_fps(), None);
        assert!(config.is_windowed());
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let engine = EngineBuilder::new()
            .with_title("Sandbox")
            .with_version("0.9.0")
            .with_window_size(640, 480)
            .with_window_mode(WindowMode::BorderlessFullscreen)
            .with_resizable(false)
            .with_vsync(true)
            .with_debug_mode(DebugMode::Full)
            .with_background_fps(30)
            .with_channel_capacity(256)
            .build();
        let config = engine.config();

        assert_eq!(config.title(), "Sandbox");
        assert_eq!(config.version(), "0.9.0");
        assert_eq!((config.window_width(), config.window_height()), (640, 480));
        assert!(!config.is_windowed());
        assert!(!config.is_resizable());
        assert!(config.is_vsync());
        assert_eq!(config.debug_mode(), DebugMode::Full);
        assert_eq!(config.background_fps(), Some(30));
        assert_eq!(config.input_channel_capacity(), 256);
    }

    #[test]
    fn builder_clamps_window_size() {
        let engine = EngineBuilder::new().with_window_size(0, 3).build();
        assert_eq!(engine.config().window_width(), 10);
        assert_eq!(engine.config().window_height(), 10);
    }

    #[test]
    #[should_panic(expected = "Channel capacity must be positive")]
    fn builder_with_channel_capacity_panics_on_zero() {
        EngineBuilder::new().with_channel_capacity(0);
    }

    #[test]
    #[should_panic(expected = "Background FPS must be positive")]
    fn builder_with_background_fps_panics_on_zero() {
        EngineBuilder::new().with_background_fps(0);
    }

    #[test]
    #[should_panic(expected = "Minimum window size must not exceed maximum")]
    fn builder_rejects_inverted_size_limits() {
        EngineBuilder::new().with_size_limits(Some((800, 600)), Some((640, 480)));
    }

    #[test]
    fn builder_accepts_one_sided_limits() {
        let engine = EngineBuilder::new()
            .with_size_limits(Some((320, 240)), None)
            .build();
        assert_eq!(engine.config().min_size(), Some((320, 240)));
        assert_eq!(engine.config().max_size(), None);
    }

    //=====================================================================
    // EngineHandle Tests
    //=====================================================================

    #[test]
    fn handle_shutdown_before_run_raises_flag() {
        let engine = EngineBuilder::new().build();
        let handle = engine.handle();
        assert!(!handle.is_shutting_down());

        handle.shutdown();

        assert!(engine.handle().is_shutting_down(), "All handles share one flag");
    }

    #[test]
    fn handle_shutdown_wakes_installed_window_control() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct CountingControl(AtomicUsize);

        impl WindowControl for CountingControl {
            fn set_title(&self, _title: String) {}

            fn wake(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let engine = EngineBuilder::new().build();
        let control = Arc::new(CountingControl::default());
        assert!(engine.window_control.set(control.clone()).is_ok());

        engine.handle().shutdown();

        assert_eq!(control.0.load(Ordering::SeqCst), 1);
    }

    //=====================================================================
    // Task and Window Request Tests
    //=====================================================================

    use crate::core::context::RenderContext;
    use crate::core::render::BackendCall;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn context_for(engine: &Engine, backend: HeadlessBackend) -> RenderContext {
        RenderContext::new(
            Box::new(backend),
            Box::new(EmptyGame),
            engine.config.clone(),
            engine.close.clone(),
            engine.tasks(),
        )
    }

    #[derive(Default)]
    struct RecordingControl {
        requests: Mutex<Vec<String>>,
    }

    impl RecordingControl {
        fn push(&self, request: String) {
            self.requests.lock().unwrap().push(request);
        }
    }

    impl WindowControl for RecordingControl {
        fn set_title(&self, title: String) {
            self.push(format!("title {}", title));
        }

        fn wake(&self) {
            self.push("wake".to_string());
        }

        fn set_cursor_mode(&self, mode: CursorMode) {
            self.push(format!("cursor {:?}", mode));
        }

        fn set_cursor_position(&self, x: f64, y: f64) {
            self.push(format!("move {} {}", x, y));
        }

        fn center_cursor(&self) {
            self.push("center".to_string());
        }

        fn set_icon(&self, icon: Option<WindowIcon>) {
            self.push(format!("icon {}", icon.map_or(0, |i| i.width)));
        }
    }

    #[test]
    fn task_sent_from_handle_on_other_thread_runs_on_next_drain() {
        let mut engine = EngineBuilder::new().build();
        let handle = engine.handle();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = ran.clone();
        std::thread::spawn(move || {
            handle.tasks().enqueue("Remote", 0, move |_: &mut RenderContext| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });
        })
        .join()
        .unwrap();

        let mut ctx = context_for(&engine, HeadlessBackend::new());
        let report = engine.tasks.drain(&mut ctx);

        assert_eq!(report.executed, 1);
        assert!(ran.load(Ordering::SeqCst), "Task must run on the engine's own queue");
    }

    #[test]
    fn engine_tasks_share_the_engine_queue() {
        let mut engine = EngineBuilder::new().build();
        engine.tasks().enqueue("Later", 1, |_: &mut RenderContext| Ok(()));

        let mut ctx = context_for(&engine, HeadlessBackend::new());
        assert_eq!(engine.tasks.drain(&mut ctx).delayed, 1);
        assert_eq!(engine.tasks.drain(&mut ctx).executed, 1);
    }

    #[test]
    fn handle_set_vsync_reaches_backend_on_next_drain() {
        let mut engine = EngineBuilder::new().build();
        let backend = HeadlessBackend::recording();
        let calls = backend.call_log();
        let mut ctx = context_for(&engine, backend);
        let (signal, _latch) = startup_latch();
        engine.tasks.submit(init_task(signal));
        engine.tasks.drain(&mut ctx);
        let after_init = calls.len();

        engine.handle().set_vsync(true);

        assert!(engine.config().is_vsync(), "Flag updates immediately");
        assert_eq!(calls.len(), after_init, "Backend untouched until the drain");
        engine.tasks.drain(&mut ctx);
        assert_eq!(
            calls.snapshot()[after_init..].to_vec(),
            vec![BackendCall::SwapInterval(1)]
        );
    }

    #[test]
    fn handle_forwards_window_requests() {
        let engine = EngineBuilder::new().build();
        let control = Arc::new(RecordingControl::default());
        assert!(engine.window_control.set(control.clone()).is_ok());
        let handle = engine.handle();

        handle.set_title("Paused");
        handle.set_cursor_mode(CursorMode::Disabled);
        handle.set_cursor_position(10.0, 20.5);
        handle.center_cursor();
        handle.set_icon(Some(WindowIcon {
            rgba: vec![0; 4 * 32 * 32],
            width: 32,
            height: 32,
        }));

        assert_eq!(
            *control.requests.lock().unwrap(),
            vec!["title Paused", "cursor Disabled", "move 10 20.5", "center", "icon 32"]
        );
    }

    #[test]
    fn window_requests_before_run_are_dropped() {
        let handle = EngineBuilder::new().build().handle();

        handle.set_cursor_mode(CursorMode::Hidden);
        handle.center_cursor();
        handle.set_icon(None);

        assert!(!handle.is_shutting_down());
    }
}
