//=========================================================================
// Render Loop Scheduler
//=========================================================================
//
// The loop that runs on the render thread for the lifetime of the engine.
//
// Architecture:
// ```text
//   start(now):  drain tasks (Init runs here), then reset the clocks
//
//   iterate_at(now):
//     1. accumulate frame time
//     2. drain task queue                 ◄── TaskSender (any thread)
//     3. input update                     ◄── input batches (window thread)
//     4. 0..=10 fixed ticks → Game::update
//     5. clear, Game::render(partial), swap
//     6. once per second: FPS/TPS log (+ window title in debug mode)
//     7. background throttle while minimized
//
//   finalize():  drain tasks, Game::dispose, release the context
// ```
//
// The loop exits once the close flag is raised. A failed render or swap
// raises the flag itself.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{error, info};

//=== Internal Dependencies ===============================================

use crate::core::config::{DebugMode, EngineConfig};
use crate::core::context::{EngineTaskQueue, RenderContext};
use crate::core::error::EngineError;
use crate::core::input::{InputEvent, InputStateTracker};
use crate::core::lifecycle::WindowControl;
use crate::core::task_queue::DrainReport;
use crate::core::timestep::{FrameTiming, StatusReport, TickOutcome, TICKS_PER_SECOND};

//=== Constants ===========================================================

/// Below this much remaining time the throttle yields instead of sleeping.
const THROTTLE_SPIN_THRESHOLD: Duration = Duration::from_millis(2);

/// Share of the remaining time the throttle sleeps for in one go.
const THROTTLE_SLEEP_FRACTION: f64 = 0.9;

//=== IterationReport =====================================================

/// What one pass of the loop did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    pub drain: DrainReport,
    pub ticks: TickOutcome,
    /// `false` if rendering or presenting failed.
    pub rendered: bool,
    pub status: Option<StatusReport>,
}

//=== RenderLoop ==========================================================

/// Fixed-timestep loop owning the render-thread state.
pub struct RenderLoop {
    context: RenderContext,
    tasks: EngineTaskQueue,
    input: InputStateTracker,
    input_events: Receiver<Vec<InputEvent>>,
    pending_events: Vec<InputEvent>,
    timing: FrameTiming,
    window: Arc<dyn WindowControl>,
}

impl RenderLoop {
    //--- Construction -----------------------------------------------------

    pub fn new(
        context: RenderContext,
        tasks: EngineTaskQueue,
        input: InputStateTracker,
        input_events: Receiver<Vec<InputEvent>>,
        window: Arc<dyn WindowControl>,
    ) -> Self {
        Self {
            context,
            tasks,
            input,
            input_events,
            pending_events: Vec::new(),
            timing: FrameTiming::new(Instant::now()),
            window,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs until the close flag is raised, then finalizes.
    pub fn run(mut self) {
        info!(target: "scheduler", "Render loop started");

        self.start(Instant::now());
        while !self.context.close.is_raised() {
            self.iterate_at(Instant::now());
        }

        self.finalize();
    }

    /// Runs the tasks queued before startup and starts the clocks at `now`.
    pub fn start(&mut self, now: Instant) -> DrainReport {
        let report = self.tasks.drain(&mut self.context);
        self.timing.reset(now);
        report
    }

    /// One full pass of the loop with `now` as the frame start.
    pub fn iterate_at(&mut self, now: Instant) -> IterationReport {
        self.timing.begin_frame(now);

        let drain = self.tasks.drain(&mut self.context);
        self.update_input();

        let Self { context, input, timing, .. } = self;
        let ticks = timing.run_ticks(|| context.game.update(input, &context.config));

        let rendered = match self.render(ticks.partial_tick) {
            Ok(()) => true,
            Err(e) => {
                error!(target: "scheduler", "Rendering failed, shutting down: {}", e);
                self.context.close.raise();
                self.window.wake();
                false
            }
        };

        let status = self.timing.end_frame(now);
        if let Some(report) = status {
            self.report_status(report);
        }

        if let Some(fps) = background_fps_limit(&self.context.config) {
            throttle(now, fps);
        }

        IterationReport {
            drain,
            ticks,
            rendered,
            status,
        }
    }

    /// Last pass after the loop exits: pending tasks, game teardown, context release.
    pub fn finalize(&mut self) {
        info!(target: "scheduler", "Stopping!");

        self.tasks.drain(&mut self.context);
        self.context.game.dispose();
        if self.context.has_context() {
            self.context.backend.release_context();
        } else {
            info!(target: "scheduler", "No render context was created, nothing to release");
        }

        // The window thread may still be waiting for events
        self.window.wake();
        info!(target: "scheduler", "Render loop finalized");
    }

    //--- Accessors --------------------------------------------------------

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn input(&self) -> &InputStateTracker {
        &self.input
    }

    pub fn tasks(&self) -> &EngineTaskQueue {
        &self.tasks
    }

    //--- Internal Helpers -------------------------------------------------

    /// Applies every batch the window thread sent since the last iteration.
    fn update_input(&mut self) {
        for batch in self.input_events.try_iter() {
            self.pending_events.extend(batch);
        }

        self.input.update(&self.pending_events);
        self.pending_events.clear();
    }

    fn render(&mut self, partial_tick: f32) -> Result<(), EngineError> {
        let ctx = &mut self.context;
        ctx.backend.clear(ctx.config.clear_color())?;
        ctx.game.render(partial_tick)?;
        ctx.backend.swap_buffers()
    }

    fn report_status(&self, report: StatusReport) {
        info!(target: "scheduler", "FPS: {}, TPS: {}", report.fps, report.tps);

        let config = &self.context.config;
        if config.debug_mode() != DebugMode::None && config.is_windowed() {
            self.window.set_title(status_title(config, report));
        }
    }
}

//=== Free Functions ======================================================

/// Window title shown in debug mode.
pub fn status_title(config: &EngineConfig, report: StatusReport) -> String {
    format!(
        "{} v{} | FPS: {}, TPS: {}",
        config.title(),
        config.version(),
        report.fps,
        report.tps
    )
}

/// Frame-rate cap to apply this iteration, if any.
///
/// Only applies while minimized, and only for targets above the tick rate.
fn background_fps_limit(config: &EngineConfig) -> Option<u32> {
    if !config.is_minimized() {
        return None;
    }
    config
        .background_fps()
        .filter(|&fps| fps > TICKS_PER_SECOND)
}

/// Waits until `loop_start + 1/fps`.
fn throttle(loop_start: Instant, fps: u32) {
    let target = loop_start + Duration::from_secs_f64(1.0 / f64::from(fps));

    loop {
        let now = Instant::now();
        if now >= target {
            break;
        }

        let remaining = target - now;
        if remaining > THROTTLE_SPIN_THRESHOLD {
            thread::sleep(remaining.mul_f64(THROTTLE_SLEEP_FRACTION));
        } else {
            thread::yield_now();
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::context::init_task;
    use crate::core::game::Game;
    use crate::core::input::{KeyCode, Modifiers};
    use crate::core::lifecycle::{startup_latch, CloseFlag, DetachedWindow};
    use crate::core::render::{BackendCall, CallLog, HeadlessBackend};
    use crate::core::timestep::TICK_DURATION;
    use crossbeam_channel::{unbounded, Sender};
    use std::sync::Mutex;

    //--- Test Helpers -----------------------------------------------------

    type Trace = Arc<Mutex<Vec<String>>>;

    /// Game that records its hooks and can close the engine after N renders.
    struct TraceGame {
        trace: Trace,
        close_after_renders: Option<(usize, CloseFlag)>,
        renders: usize,
    }

    impl Game for TraceGame {
        fn update(&mut self, input: &InputStateTracker, _config: &EngineConfig) {
            let entry = if input.is_key_down(KeyCode::Space) {
                "update(space)"
            } else {
                "update"
            };
            self.trace.lock().unwrap().push(entry.to_string());
        }

        fn render(&mut self, partial_tick: f32) -> Result<(), EngineError> {
            self.trace
                .lock()
                .unwrap()
                .push(format!("render({:.1})", partial_tick));
            self.renders += 1;
            if let Some((limit, close)) = &self.close_after_renders {
                if self.renders >= *limit {
                    close.raise();
                }
            }
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.trace
                .lock()
                .unwrap()
                .push(format!("resize({}x{})", width, height));
        }

        fn dispose(&mut self) {
            self.trace.lock().unwrap().push("dispose".to_string());
        }
    }

    #[derive(Default)]
    struct RecordingWindow {
        titles: Mutex<Vec<String>>,
    }

    impl WindowControl for RecordingWindow {
        fn set_title(&self, title: String) {
            self.titles.lock().unwrap().push(title);
        }

        fn wake(&self) {}
    }

    struct Harness {
        render_loop: RenderLoop,
        trace: Trace,
        calls: CallLog,
        input_tx: Sender<Vec<InputEvent>>,
        close: CloseFlag,
    }

    fn harness_with(
        config: EngineConfig,
        backend: HeadlessBackend,
        close_after_renders: Option<usize>,
        window: Arc<dyn WindowControl>,
    ) -> Harness {
        let trace = Trace::default();
        let calls = backend.call_log();
        let close = CloseFlag::new();
        let game = TraceGame {
            trace: trace.clone(),
            close_after_renders: close_after_renders.map(|n| (n, close.clone())),
            renders: 0,
        };
        let tasks = EngineTaskQueue::new();
        let context = RenderContext::new(
            Box::new(backend),
            Box::new(game),
            Arc::new(config),
            close.clone(),
            tasks.sender(),
        );
        let (input_tx, input_rx) = unbounded();
        let render_loop = RenderLoop::new(
            context,
            tasks,
            InputStateTracker::new(),
            input_rx,
            window,
        );

        Harness {
            render_loop,
            trace,
            calls,
            input_tx,
            close,
        }
    }

    fn harness() -> Harness {
        harness_with(
            EngineConfig::new(),
            HeadlessBackend::recording(),
            None,
            Arc::new(DetachedWindow),
        )
    }

    fn trace_of(harness: &Harness) -> Vec<String> {
        harness.trace.lock().unwrap().clone()
    }

    //=====================================================================
    // Iteration Tests
    //=====================================================================

    #[test]
    fn iteration_runs_drain_input_ticks_render_in_order() {
        let mut h = harness();
        let t0 = Instant::now();
        h.render_loop.start(t0);

        let trace = h.trace.clone();
        h.render_loop.tasks().enqueue("mark", 0, move |_: &mut RenderContext| {
            trace.lock().unwrap().push("task".to_string());
            Ok(())
        });
        h.input_tx
            .send(vec![InputEvent::KeyDown {
                key: KeyCode::Space,
                modifiers: Modifiers::NONE,
            }])
            .unwrap();

        let report = h.render_loop.iterate_at(t0 + TICK_DURATION * 2 + TICK_DURATION / 2);

        assert_eq!(report.ticks.ticks, 2);
        assert_eq!(report.drain.executed, 1);
        assert!(report.rendered);
        assert_eq!(
            trace_of(&h),
            vec!["task", "update(space)", "update(space)", "render(0.5)"],
            "Tasks run before input, input before ticks, ticks before render"
        );
        assert!(h.render_loop.input().is_key_pressed(KeyCode::Space));
    }

    #[test]
    fn render_clears_with_configured_color_then_swaps() {
        let mut h = harness();
        let t0 = Instant::now();
        h.render_loop.start(t0);
        h.render_loop.iterate_at(t0);

        assert_eq!(
            h.calls.snapshot(),
            vec![
                BackendCall::Clear(EngineConfig::new().clear_color()),
                BackendCall::SwapBuffers,
            ]
        );
    }

    #[test]
    fn saturated_frame_drops_backlog() {
        let mut h = harness();
        let t0 = Instant::now();
        h.render_loop.start(t0);

        let report = h.render_loop.iterate_at(t0 + TICK_DURATION * 25);

        assert_eq!(report.ticks.ticks, 10);
        assert_eq!(report.ticks.skipped_ticks, Some(15));
        assert_eq!(report.ticks.partial_tick, 0.0);

        let next = h.render_loop.iterate_at(t0 + TICK_DURATION * 25 + TICK_DURATION / 2);
        assert_eq!(next.ticks.ticks, 0, "Backlog must not be replayed next frame");
    }

    #[test]
    fn input_batches_are_merged_per_iteration() {
        let mut h = harness();
        let t0 = Instant::now();
        h.render_loop.start(t0);

        h.input_tx
            .send(vec![InputEvent::MouseMoved { x: 3.0, y: 4.0 }])
            .unwrap();
        h.input_tx
            .send(vec![InputEvent::MouseMoved { x: 10.0, y: 20.0 }])
            .unwrap();
        h.render_loop.iterate_at(t0);

        assert_eq!(h.render_loop.input().mouse_position(), (10.0, 20.0));
        assert_eq!(h.render_loop.input().mouse_delta(), (10.0, 20.0));
    }

    #[test]
    fn render_failure_raises_close_flag() {
        let mut h = harness_with(
            EngineConfig::new(),
            HeadlessBackend::new().fail_swap_at(1),
            None,
            Arc::new(DetachedWindow),
        );
        let t0 = Instant::now();
        h.render_loop.start(t0);

        let report = h.render_loop.iterate_at(t0);

        assert!(!report.rendered);
        assert!(h.close.is_raised());
    }

    //=====================================================================
    // Status Tests
    //=====================================================================

    #[test]
    fn status_title_in_debug_windowed_mode() {
        let mut config = EngineConfig::new();
        config.title = "Demo".to_string();
        config.version = "1.2.3".to_string();
        config.debug_mode = DebugMode::Low;
        let window = Arc::new(RecordingWindow::default());
        let mut h = harness_with(config, HeadlessBackend::new(), None, window.clone());

        let t0 = Instant::now();
        h.render_loop.start(t0);
        let mut report = None;
        for frame in 1..=20u32 {
            report = h.render_loop.iterate_at(t0 + TICK_DURATION * frame).status;
        }

        assert_eq!(report, Some(StatusReport { fps: 20, tps: 20 }));
        assert_eq!(
            window.titles.lock().unwrap().as_slice(),
            ["Demo v1.2.3 | FPS: 20, TPS: 20".to_string()]
        );
    }

    #[test]
    fn no_title_update_without_debug_mode() {
        let window = Arc::new(RecordingWindow::default());
        let mut h = harness_with(EngineConfig::new(), HeadlessBackend::new(), None, window.clone());

        let t0 = Instant::now();
        h.render_loop.start(t0);
        let report = h.render_loop.iterate_at(t0 + Duration::from_secs(1));

        assert!(report.status.is_some());
        assert!(window.titles.lock().unwrap().is_empty());
    }

    //=====================================================================
    // Lifecycle Tests
    //=====================================================================

    #[test]
    fn run_initializes_renders_and_finalizes() {
        let mut h = harness_with(
            EngineConfig::new(),
            HeadlessBackend::recording(),
            Some(3),
            Arc::new(DetachedWindow),
        );
        let (signal, latch) = startup_latch();
        h.render_loop.tasks().submit(init_task(signal));

        let Harness { render_loop, trace, calls, .. } = h;
        render_loop.run();

        assert!(latch.wait().is_ok(), "Init must signal the startup latch");

        let calls = calls.snapshot();
        assert_eq!(calls.first(), Some(&BackendCall::InitContext));
        assert_eq!(calls.last(), Some(&BackendCall::ReleaseContext));
        assert_eq!(
            calls.iter().filter(|c| **c == BackendCall::SwapBuffers).count(),
            3
        );

        let trace = trace.lock().unwrap();
        assert_eq!(trace.last().map(String::as_str), Some("dispose"));
    }

    #[test]
    fn finalize_runs_pending_tasks_before_release() {
        let mut h = harness();
        let calls = h.calls.clone();
        let (signal, _latch) = startup_latch();
        h.render_loop.tasks().submit(init_task(signal));
        h.render_loop.start(Instant::now());
        let after_init = calls.len();

        h.render_loop
            .tasks()
            .submit(crate::core::context::resize_task(320, 200));

        h.render_loop.finalize();

        assert_eq!(
            calls.snapshot()[after_init..].to_vec(),
            vec![
                BackendCall::RecreateFrameBuffer { width: 320, height: 200 },
                BackendCall::Viewport { width: 320, height: 200 },
                BackendCall::ReleaseContext,
            ]
        );
        assert_eq!(trace_of(&h), vec!["resize(320x200)", "dispose"]);
    }

    #[test]
    fn finalize_without_context_skips_release() {
        let mut h = harness();

        h.render_loop.finalize();

        assert!(
            !h.calls.snapshot().contains(&BackendCall::ReleaseContext),
            "Nothing to release when Init never created a context"
        );
        assert_eq!(trace_of(&h), vec!["dispose"]);
    }

    #[test]
    fn finalize_releases_context_when_init_failed_after_creation() {
        let backend = HeadlessBackend::with_context_info(crate::core::render::ContextInfo {
            version: (2, 1),
            version_string: "2.1".into(),
            vendor: "Old".into(),
            renderer: "Old".into(),
            glsl_version: "1.20".into(),
            extensions: Default::default(),
            max_texture_size: 2048,
            uniform_buffer_offset_alignment: 0,
        })
        .record_calls();
        let mut h = harness_with(EngineConfig::new(), backend, None, Arc::new(DetachedWindow));
        let (signal, _latch) = startup_latch();
        h.render_loop.tasks().submit(init_task(signal));

        h.render_loop.start(Instant::now());
        h.render_loop.finalize();

        assert!(h.close.is_raised());
        assert_eq!(
            h.calls.snapshot(),
            vec![BackendCall::InitContext, BackendCall::ReleaseContext]
        );
    }

    #[test]
    fn default_backend_memory_stays_bounded_over_many_frames() {
        let mut h = harness_with(
            EngineConfig::new(),
            HeadlessBackend::new(),
            None,
            Arc::new(DetachedWindow),
        );
        let t0 = Instant::now();
        h.render_loop.start(t0);

        for frame in 0..10_000u32 {
            h.render_loop.iterate_at(t0 + Duration::from_micros(u64::from(frame) * 100));
        }

        assert!(h.calls.is_empty(), "Default backend must not keep a call log");
        assert_eq!(h.trace.lock().unwrap().iter().filter(|e| e.starts_with("render")).count(), 10_000);
    }

    //=====================================================================
    // Throttle Tests
    //=====================================================================

    #[test]
    fn throttle_only_when_minimized_above_tick_rate() {
        let mut config = EngineConfig::new();
        config.background_fps = Some(30);
        assert_eq!(background_fps_limit(&config), None, "Not minimized");

        config.set_minimized(true);
        assert_eq!(background_fps_limit(&config), Some(30));

        config.background_fps = Some(TICKS_PER_SECOND);
        assert_eq!(background_fps_limit(&config), None, "Must exceed the tick rate");

        config.background_fps = None;
        assert_eq!(background_fps_limit(&config), None);
    }

    #[test]
    fn throttle_waits_until_frame_target() {
        let start = Instant::now();
        throttle(start, 100);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
