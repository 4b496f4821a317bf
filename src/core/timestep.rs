//=========================================================================
// Fixed Timestep
//=========================================================================
//
// Accumulator bookkeeping for the render loop.
//
// Architecture:
// ```text
//   begin_frame(now) ──> accumulator += now - last_tick_time
//   run_ticks(f)     ──> f() while accumulator >= TICK and ticks < CAP
//                        cap hit → backlog discarded, warning logged
//   partial_tick     ──> accumulator / TICK  in [0, 1)
//   end_frame(now)   ──> once per second: FPS/TPS snapshot, counters reset
// ```
//
// Time is only ever read by the caller and passed in, so the whole loop
// can be driven with synthetic instants in tests.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

use log::warn;

//=== Constants ===========================================================

/// Logical simulation rate.
pub const TICKS_PER_SECOND: u32 = 20;

/// Length of one fixed tick in nanoseconds.
pub const TICK_NANOS: u64 = 1_000_000_000 / TICKS_PER_SECOND as u64;

/// Length of one fixed tick.
pub const TICK_DURATION: Duration = Duration::from_nanos(TICK_NANOS);

/// Most ticks processed in a single loop iteration before the backlog is dropped.
pub const MAX_TICKS_PER_FRAME: u32 = 10;

/// Interval between status snapshots.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Largest `f32` below 1.0.
const MAX_PARTIAL_TICK: f32 = 1.0 - f32::EPSILON / 2.0;

//=== TickOutcome =========================================================

/// Result of one pass over the accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Fixed updates run this iteration.
    pub ticks: u32,

    /// Whole ticks of backlog discarded when the cap was hit.
    pub skipped_ticks: Option<u64>,

    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub partial_tick: f32,
}

impl TickOutcome {
    /// Returns `true` if the catch-up cap was hit this iteration.
    pub fn fell_behind(&self) -> bool {
        self.skipped_ticks.is_some()
    }
}

//=== StatusReport ========================================================

/// Frames and ticks counted over the last status interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub fps: u32,
    pub tps: u32,
}

//=== FrameTiming =========================================================

/// Per-loop timing state. Lives on the render thread only.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    accumulated_nanos: u64,
    last_tick_time: Instant,
    ticks_this_second: u32,
    frames_this_second: u32,
    last_status_time: Instant,
}

impl FrameTiming {
    pub fn new(now: Instant) -> Self {
        Self {
            accumulated_nanos: 0,
            last_tick_time: now,
            ticks_this_second: 0,
            frames_this_second: 0,
            last_status_time: now,
        }
    }

    /// Restarts all clocks at `now` and clears the accumulator.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    //--- Frame Processing -------------------------------------------------

    /// Adds the time elapsed since the previous frame to the accumulator.
    ///
    /// Returns the measured frame time.
    pub fn begin_frame(&mut self, now: Instant) -> Duration {
        let frame_time = now.saturating_duration_since(self.last_tick_time);
        self.last_tick_time = now;
        self.accumulate(frame_time);
        frame_time
    }

    /// Adds `elapsed` to the accumulator without touching the clocks.
    pub fn accumulate(&mut self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.accumulated_nanos = self.accumulated_nanos.saturating_add(nanos);
    }

    /// Runs `tick` once per whole tick in the accumulator, up to the cap.
    ///
    /// When the cap is hit the remaining backlog is discarded (accumulator
    /// set to zero) and a warning naming the skipped ticks is logged.
    pub fn run_ticks<F: FnMut()>(&mut self, mut tick: F) -> TickOutcome {
        let mut ticks = 0;
        while self.accumulated_nanos >= TICK_NANOS && ticks < MAX_TICKS_PER_FRAME {
            tick();
            self.accumulated_nanos -= TICK_NANOS;
            ticks += 1;
            self.ticks_this_second += 1;
        }

        let skipped_ticks = if ticks >= MAX_TICKS_PER_FRAME {
            let skipped = self.accumulated_nanos / TICK_NANOS;
            warn!(
                target: "scheduler",
                "Can't keep up with {} TPS! Skipping {} ticks",
                TICKS_PER_SECOND,
                skipped
            );
            self.accumulated_nanos = 0;
            Some(skipped)
        } else {
            None
        };

        TickOutcome {
            ticks,
            skipped_ticks,
            partial_tick: self.partial_tick(),
        }
    }

    /// Counts a presented frame and reports FPS/TPS once per interval.
    pub fn end_frame(&mut self, now: Instant) -> Option<StatusReport> {
        self.frames_this_second += 1;

        if now.saturating_duration_since(self.last_status_time) < STATUS_INTERVAL {
            return None;
        }

        let report = StatusReport {
            fps: self.frames_this_second,
            tps: self.ticks_this_second,
        };
        self.frames_this_second = 0;
        self.ticks_this_second = 0;
        self.last_status_time = now;
        Some(report)
    }

    //--- Queries ----------------------------------------------------------

    /// Fraction of a tick currently accumulated, in `[0, 1)`.
    ///
    /// A remainder just under one tick would round up to 1.0 in `f32`, so
    /// the result is capped at the largest value below it.
    pub fn partial_tick(&self) -> f32 {
        let fraction = (self.accumulated_nanos as f64 / TICK_NANOS as f64) as f32;
        fraction.min(MAX_PARTIAL_TICK)
    }

    pub fn accumulated(&self) -> Duration {
        Duration::from_nanos(self.accumulated_nanos)
    }

    pub fn last_tick_time(&self) -> Instant {
        self.last_tick_time
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
