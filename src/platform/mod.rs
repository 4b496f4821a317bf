//=========================================================================
// Platform Subsystem
//
// Owns the OS window and the Winit event loop on the window thread, and
// bridges both to the render thread.
//
// Architecture:
// ```text
//  Window Thread:                        Render Thread:
//  ┌────────────────────────────┐       ┌──────────────────────┐
//  │  Winit Event Loop (Wait)   │       │  RenderLoop          │
//  │   ├─ resumed()             │       │                      │
//  │   │   create window hidden │ spawn │                      │
//  │   │   spawn render thread ─┼──────>│  drain: Init task    │
//  │   │   wait on latch  ◄─────┼───────┼─ signal              │
//  │   │   show window          │       │                      │
//  │   ├─ window_event()        │       │                      │
//  │   │   WindowEventPump ─────┼─tasks>│  drain               │
//  │   │   InputProcessor       │       │                      │
//  │   │   InputBuffer          │       │                      │
//  │   └─ about_to_wait()       │       │                      │
//  │       flush batch ─────────┼─input>│  InputStateTracker   │
//  │   user_event() ◄───────────┼───────┼─ WindowControl       │
//  └────────────────────────────┘ proxy └──────────────────────┘
// ```
//
// Key Design Decisions:
// - **Wake-up = batch boundary**: input gathered during one event-loop
//   wake-up is sent as a single batch from `about_to_wait`
// - **Sticky modifiers**: Modifier state persists across events until
//   explicitly changed (matches platform behavior)
// - **Graceful channel disconnect**: If the render thread is gone, the
//   platform logs a warning and keeps running so the window can close
// - **Main thread requirement**: Winit mandates main thread on macOS/iOS,
//   so this runs on the thread that called `Engine::run()`
// - **Window commands**: title, cursor and icon requests from other
//   threads arrive as proxy user events and are applied here
//
//=========================================================================

//=== Submodules ==========================================================

mod input_buffer;
mod input_processor;
mod window_pump;

pub use window_pump::{PlatformEvent, WindowEventPump};

//=== External Crates =====================================================

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{BadIcon, CursorGrabMode, Fullscreen, Icon, Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::config::{EngineConfig, WindowMode};
use crate::core::context::{EngineTaskQueue, RenderContext};
use crate::core::error::EngineError;
use crate::core::game::Game;
use crate::core::input::{InputEvent, InputStateTracker};
use crate::core::lifecycle::{
    CloseFlag, CursorMode, RenderThread, StartupLatch, WindowControl, WindowIcon,
};
use crate::core::render::RenderBackend;
use crate::core::scheduler::RenderLoop;
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== WindowCommand =======================================================

/// Requests delivered to the window thread through the event-loop proxy.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WindowCommand {
    SetTitle(String),
    /// Re-check the close flag.
    Wake,
    SetCursorMode(CursorMode),
    SetCursorPosition { x: f64, y: f64 },
    CenterCursor,
    SetIcon(Option<WindowIcon>),
}

//=== ProxyWindowControl ==================================================

/// [`WindowControl`] that forwards requests over the Winit proxy.
pub(crate) struct ProxyWindowControl {
    proxy: EventLoopProxy<WindowCommand>,
}

impl ProxyWindowControl {
    pub(crate) fn new(proxy: EventLoopProxy<WindowCommand>) -> Self {
        Self { proxy }
    }

    fn send(&self, command: WindowCommand) {
        if self.proxy.send_event(command).is_err() {
            trace!(target: "platform", "Event loop closed, window command dropped");
        }
    }
}

impl WindowControl for ProxyWindowControl {
    fn set_title(&self, title: String) {
        self.send(WindowCommand::SetTitle(title));
    }

    fn wake(&self) {
        self.send(WindowCommand::Wake);
    }

    fn set_cursor_mode(&self, mode: CursorMode) {
        self.send(WindowCommand::SetCursorMode(mode));
    }

    fn set_cursor_position(&self, x: f64, y: f64) {
        self.send(WindowCommand::SetCursorPosition { x, y });
    }

    fn center_cursor(&self) {
        self.send(WindowCommand::CenterCursor);
    }

    fn set_icon(&self, icon: Option<WindowIcon>) {
        self.send(WindowCommand::SetIcon(icon));
    }
}

//=== Window Command Helpers ==============================================

/// Cursor visibility and grab for a mode.
fn cursor_settings(mode: CursorMode) -> (bool, CursorGrabMode) {
    match mode {
        CursorMode::Normal => (true, CursorGrabMode::None),
        CursorMode::Hidden => (false, CursorGrabMode::None),
        CursorMode::Disabled => (false, CursorGrabMode::Locked),
    }
}

fn native_icon(icon: WindowIcon) -> Result<Icon, BadIcon> {
    Icon::from_rgba(icon.rgba, icon.width, icon.height)
}

fn window_center(size: PhysicalSize<u32>) -> PhysicalPosition<f64> {
    PhysicalPosition::new(f64::from(size.width) / 2.0, f64::from(size.height) / 2.0)
}

/// Applies a window-thread command to the live window.
fn apply_window_command(window: &Window, command: WindowCommand) {
    match command {
        WindowCommand::SetTitle(title) => window.set_title(&title),
        WindowCommand::Wake => {}
        WindowCommand::SetCursorMode(mode) => {
            let (visible, grab) = cursor_settings(mode);
            window.set_cursor_visible(visible);
            let grabbed = window.set_cursor_grab(grab).or_else(|e| match grab {
                // Not every platform can lock; confining is the closest match
                CursorGrabMode::Locked => window.set_cursor_grab(CursorGrabMode::Confined),
                _ => Err(e),
            });
            if let Err(e) = grabbed {
                warn!(target: "platform", "Cursor grab {:?} unsupported: {}", grab, e);
            }
        }
        WindowCommand::SetCursorPosition { x, y } => {
            if let Err(e) = window.set_cursor_position(PhysicalPosition::new(x, y)) {
                warn!(target: "platform", "Cannot move cursor: {}", e);
            }
        }
        WindowCommand::CenterCursor => {
            if let Err(e) = window.set_cursor_position(window_center(window.inner_size())) {
                warn!(target: "platform", "Cannot center cursor: {}", e);
            }
        }
        WindowCommand::SetIcon(None) => window.set_window_icon(None),
        WindowCommand::SetIcon(Some(icon)) => match native_icon(icon) {
            Ok(icon) => window.set_window_icon(Some(icon)),
            Err(e) => warn!(target: "platform", "Invalid window icon: {}", e),
        },
    }
}

//=== RenderStartup =======================================================

/// Creates the render backend once the native window exists.
pub type BackendFactory =
    Box<dyn FnOnce(&Arc<Window>) -> Result<Box<dyn RenderBackend>, EngineError>>;

/// Render-thread state waiting for the window to be created.
pub(crate) struct RenderStartup {
    pub(crate) backend_factory: BackendFactory,
    pub(crate) game: Box<dyn Game>,
    /// Already holds the Init task.
    pub(crate) tasks: EngineTaskQueue,
    pub(crate) input: InputStateTracker,
    pub(crate) input_events: Receiver<Vec<InputEvent>>,
    pub(crate) latch: StartupLatch,
}

impl RenderStartup {
    /// Builds the backend and spawns the render thread. Returns the latch to wait on.
    fn launch(
        self,
        window: &Arc<Window>,
        config: Arc<EngineConfig>,
        close: CloseFlag,
        control: Arc<dyn WindowControl>,
    ) -> Result<(RenderThread, StartupLatch), EngineError> {
        let backend = (self.backend_factory)(window)?;
        let context = RenderContext::new(backend, self.game, config, close, self.tasks.sender());
        let render_loop = RenderLoop::new(
            context,
            self.tasks,
            self.input,
            self.input_events,
            control,
        );

        let thread = RenderThread::spawn(move || render_loop.run())?;
        Ok((thread, self.latch))
    }
}

//=== Platform ============================================================

/// Window manager and input event aggregator.
///
/// Runs on the main thread (Winit requirement on macOS/iOS). Never touches
/// the graphics context; GPU work is routed through the task queue.
///
/// # Lifecycle
///
/// 1. **Construction**: `Platform::new(..)` - nothing OS-level yet
/// 2. **Execution**: `platform.run(event_loop)` - blocks in the event loop
/// 3. **Startup**: `resumed()` creates the window, starts the render
///    thread and shows the window once the first frame can be drawn
/// 4. **Shutdown**: close flag raised → loop exits → render thread joined
///    → window dropped
pub(crate) struct Platform {
    /// OS window handle (None until `resumed()` called).
    window: Option<Arc<Window>>,

    config: Arc<EngineConfig>,
    pump: WindowEventPump,
    close: CloseFlag,

    /// Buffers input until the end of the current wake-up.
    buffer: InputBuffer,
    input_sender: Sender<Vec<InputEvent>>,
    input_processor: InputProcessor,

    startup: Option<RenderStartup>,
    render_thread: Option<RenderThread>,
    window_control: Arc<dyn WindowControl>,

    /// First unrecoverable error seen inside the event loop.
    error: Option<EngineError>,
}

impl Platform {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(
        pump: WindowEventPump,
        close: CloseFlag,
        input_sender: Sender<Vec<InputEvent>>,
        startup: Option<RenderStartup>,
        window_control: Arc<dyn WindowControl>,
    ) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            config: pump.config().clone(),
            pump,
            close,
            buffer: InputBuffer::new(),
            input_sender,
            input_processor: InputProcessor::new(),
            startup,
            render_thread: None,
            window_control,
            error: None,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the event loop until the close flag is raised, then joins the
    /// render thread and drops the window.
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable error: a startup failure, an event
    /// loop failure, or a panicked render thread.
    pub(crate) fn run(mut self, event_loop: EventLoop<WindowCommand>) -> Result<(), EngineError> {
        debug!(target: "platform", "Starting Winit event loop");

        event_loop.set_control_flow(ControlFlow::Wait);
        let loop_result = event_loop
            .run_app(&mut self)
            .map_err(|e| EngineError::EventLoopExecution(e.to_string()));

        info!(target: "platform", "Platform event loop exited");

        // The render thread may still be running if the loop ended on an error
        self.close.raise();
        let join_result = match self.render_thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        };

        // Only now may the window go away
        self.window = None;

        if let Some(error) = self.error.take() {
            return Err(error);
        }
        loop_result?;
        join_result
    }

    //--- Startup ----------------------------------------------------------

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EngineError> {
        let Some(startup) = self.startup.take() else {
            return Ok(());
        };

        let window = event_loop
            .create_window(self.window_attributes(event_loop))
            .map_err(|e| EngineError::WindowCreation(e.to_string()))?;
        let window = Arc::new(window);

        let size = window.inner_size();
        info!(
            target: "platform",
            "Window created: {}x{} @ {}x DPI",
            size.width,
            size.height,
            window.scale_factor()
        );
        if size.width > 0 && size.height > 0 {
            self.config.set_window_size(size.width, size.height);
        }
        self.window = Some(window.clone());

        let (render_thread, latch) = startup.launch(
            &window,
            self.config.clone(),
            self.close.clone(),
            self.window_control.clone(),
        )?;
        self.render_thread = Some(render_thread);

        debug!(target: "lifecycle", "Waiting for the render thread to finish Init");
        latch.wait()?;

        window.set_visible(true);
        info!(target: "lifecycle", "Startup complete, window shown");
        Ok(())
    }

    fn window_attributes(&self, event_loop: &ActiveEventLoop) -> WindowAttributes {
        let config = &self.config;

        let mut attrs = Window::default_attributes()
            .with_title(config.title())
            .with_inner_size(PhysicalSize::new(config.window_width(), config.window_height()))
            .with_resizable(config.is_resizable())
            .with_maximized(config.is_windowed() && config.is_maximized())
            .with_visible(false);

        if let Some((width, height)) = config.min_size() {
            attrs = attrs.with_min_inner_size(PhysicalSize::new(width, height));
        }
        if let Some((width, height)) = config.max_size() {
            attrs = attrs.with_max_inner_size(PhysicalSize::new(width, height));
        }

        match config.window_mode() {
            WindowMode::Windowed => attrs,
            WindowMode::Fullscreen => {
                let monitor = event_loop.primary_monitor();
                let exclusive = monitor
                    .as_ref()
                    .and_then(|m| m.video_modes().next())
                    .map(Fullscreen::Exclusive);
                attrs.with_fullscreen(exclusive.or(Some(Fullscreen::Borderless(monitor))))
            }
            WindowMode::BorderlessFullscreen => attrs
                .with_decorations(false)
                .with_fullscreen(Some(Fullscreen::Borderless(event_loop.primary_monitor()))),
        }
    }

    fn fail(&mut self, error: EngineError, event_loop: &ActiveEventLoop) {
        error!(target: "lifecycle", "Unrecoverable error: {}", error);
        self.close.raise();
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    //--- Internal Helpers -------------------------------------------------

    /// Sends the input gathered during this wake-up to the render thread.
    ///
    /// A full or disconnected channel drops the batch with a warning; the
    /// window thread never blocks on the render thread.
    fn flush_input_buffer(&mut self) {
        let Some(batch) = self.buffer.drain() else {
            return;
        };

        trace!(target: "platform::input", "Flushing {} events", batch.len());

        match self.input_sender.try_send(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(batch)) => {
                warn!(
                    target: "platform::input",
                    "Input channel full, dropping {} events",
                    batch.len()
                );
            }
            Err(TrySendError::Disconnected(batch)) => {
                warn!(
                    target: "platform::input",
                    "Channel disconnected, dropping {} events",
                    batch.len()
                );
            }
        }
    }

    fn exit_if_closed(&self, event_loop: &ActiveEventLoop) {
        if self.pump.should_exit() {
            event_loop.exit();
        }
    }

    //--- Test Accessors ---------------------------------------------------

    #[cfg(test)]
    pub(crate) fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler<WindowCommand> for Platform {
    /// Called when app becomes active (startup or mobile resume).
    ///
    /// Performs the startup handshake on the first call only.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.fail(e, event_loop);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, command: WindowCommand) {
        match &self.window {
            Some(window) => apply_window_command(window, command),
            None => trace!(target: "platform", "No window yet, dropping {:?}", command),
        }

        self.exit_if_closed(event_loop);
    }

    /// Handles per-window events.
    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            //--- Window State ---------------------------------------------

            WindowEvent::CloseRequested => {
                self.pump.handle(PlatformEvent::CloseRequested);
            }

            WindowEvent::Resized(size) => {
                if let Some(window) = &self.window {
                    self.pump.handle(PlatformEvent::Maximized(window.is_maximized()));
                }
                self.pump.handle(PlatformEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }

            WindowEvent::Occluded(occluded) => {
                self.pump.handle(PlatformEvent::Iconified(occluded));
            }

            //--- Input ----------------------------------------------------

            WindowEvent::ModifiersChanged(state) => {
                trace!(target: "platform::input", "Modifiers changed: {:?}", state);
                self.input_processor.update_modifiers(state.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self.input_processor.process_mouse_move(position.x, position.y);
                self.buffer.push(event);
            }

            WindowEvent::CursorEntered { .. } => {
                self.buffer.push(self.input_processor.process_cursor_entered(true));
            }

            WindowEvent::CursorLeft { .. } => {
                self.buffer.push(self.input_processor.process_cursor_entered(false));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.buffer.push(self.input_processor.process_scroll(delta));
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if let Some(event) = self.input_processor.process_key_event(&key_event) {
                    self.buffer.push(event);
                } else {
                    trace!(target: "platform::input", "Unmapped or repeated key ignored");
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input_processor.process_mouse_button(button, state);
                self.buffer.push(event);
            }

            _ => {
                // Ignore: Focused, ScaleFactorChanged, RedrawRequested, etc.
            }
        }

        self.exit_if_closed(event_loop);
    }

    /// End of a wake-up: hand the input batch over.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.flush_input_buffer();
        self.exit_if_closed(event_loop);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{KeyCode, Modifiers};
    use crate::core::lifecycle::DetachedWindow;
    use crossbeam_channel::{bounded, unbounded};

    fn platform_with(input_sender: Sender<Vec<InputEvent>>) -> Platform {
        let queue = EngineTaskQueue::new();
        let close = CloseFlag::new();
        let pump = WindowEventPump::new(
            Arc::new(EngineConfig::new()),
            queue.sender(),
            close.clone(),
        );
        Platform::new(pump, close, input_sender, None, Arc::new(DetachedWindow))
    }

    fn space_down() -> InputEvent {
        InputEvent::KeyDown {
            key: KeyCode::Space,
            modifiers: Modifiers::NONE,
        }
    }

    //=====================================================================
    // Platform Tests
    //=====================================================================

    #[test]
    fn platform_creation() {
        let (tx, _rx) = unbounded();
        let platform = platform_with(tx);
        assert!(platform.window().is_none(), "Window should be created lazily");
    }

    #[test]
    fn flush_empty_buffer_is_noop() {
        let (tx, rx) = unbounded();
        let mut platform = platform_with(tx);

        platform.flush_input_buffer();

        assert!(rx.try_recv().is_err(), "No batch should be sent for empty buffer");
    }

    #[test]
    fn flush_sends_buffered_events() {
        let (tx, rx) = unbounded();
        let mut platform = platform_with(tx);

        platform.buffer.push(space_down());
        platform.buffer.push(InputEvent::MouseMoved { x: 1.0, y: 2.0 });
        platform.flush_input_buffer();

        let batch = rx.try_recv().expect("Expected one input batch");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], space_down());
    }

    #[test]
    fn flush_drops_batch_when_channel_full() {
        let (tx, rx) = bounded(1);
        let mut platform = platform_with(tx);

        platform.buffer.push(space_down());
        platform.flush_input_buffer();
        platform.buffer.push(InputEvent::Scrolled { x: 0.0, y: 1.0 });
        platform.flush_input_buffer();

        assert_eq!(rx.len(), 1, "Second batch must be dropped, not block");
        assert!(platform.buffer.is_empty());
    }

    #[test]
    fn flush_handles_disconnected_channel() {
        let (tx, rx) = unbounded();
        let mut platform = platform_with(tx);

        platform.buffer.push(space_down());
        drop(rx);

        // Should not panic, just log warning
        platform.flush_input_buffer();
    }

    #[test]
    fn multiple_flushes_clear_buffer() {
        let (tx, rx) = unbounded();
        let mut platform = platform_with(tx);

        platform.buffer.push(space_down());

        platform.flush_input_buffer();
        platform.flush_input_buffer(); // Second flush should be no-op

        assert!(rx.try_recv().is_ok(), "First flush should send");
        assert!(rx.try_recv().is_err(), "Second flush should not send");
    }

    #[test]
    fn cursor_modes_map_to_visibility_and_grab() {
        assert_eq!(cursor_settings(CursorMode::Normal), (true, CursorGrabMode::None));
        assert_eq!(cursor_settings(CursorMode::Hidden), (false, CursorGrabMode::None));
        assert_eq!(
            cursor_settings(CursorMode::Disabled),
            (false, CursorGrabMode::Locked),
            "Disabled cursor is hidden and grabbed"
        );
    }

    #[test]
    fn window_center_is_half_the_inner_size() {
        let center = window_center(PhysicalSize::new(1281, 720));
        assert_eq!((center.x, center.y), (640.5, 360.0));
    }

    #[test]
    fn icon_with_matching_pixel_data_is_accepted() {
        let icon = WindowIcon {
            rgba: vec![255; 4 * 16 * 16],
            width: 16,
            height: 16,
        };
        assert!(native_icon(icon).is_ok());
    }

    #[test]
    fn icon_with_short_pixel_data_is_rejected() {
        let icon = WindowIcon {
            rgba: vec![255; 4 * 16 * 15],
            width: 16,
            height: 16,
        };
        assert!(native_icon(icon).is_err(), "RGBA length must equal 4 * width * height");
    }

    #[test]
    fn window_command_is_debug() {
        let debug_str = format!("{:?}", WindowCommand::SetTitle("x".into()));
        assert!(debug_str.contains("SetTitle"));
    }
}
