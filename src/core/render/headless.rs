//=========================================================================
// Headless Backend
//=========================================================================
//
// `RenderBackend` that performs no GPU work.
//
// By default it only counts presented frames. A recording backend also
// appends every call to a shared `CallLog`, so the call sequence can be
// inspected after the backend has been moved into the render thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

//=== Internal Dependencies ===============================================

use super::{ContextInfo, RenderBackend};
use crate::core::config::ClearColor;
use crate::core::error::EngineError;

//=== BackendCall =========================================================

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    InitContext,
    SwapInterval(u32),
    RecreateFrameBuffer { width: u32, height: u32 },
    Viewport { width: u32, height: u32 },
    Clear(ClearColor),
    FlushAndFinish,
    SwapBuffers,
    ReleaseContext,
}

//=== CallLog =============================================================

/// Shared, append-only record of backend calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl CallLog {
    fn push(&self, call: BackendCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Copy of every call recorded so far.
    pub fn snapshot(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

//=== HeadlessBackend =====================================================

/// Backend without a GPU. Reports a configurable context.
#[derive(Debug)]
pub struct HeadlessBackend {
    info: ContextInfo,
    log: CallLog,
    recording: bool,
    fail_swap_at: Option<usize>,
    swaps: usize,
}

impl HeadlessBackend {
    /// Creates a backend that reports a GL 4.6 context.
    pub fn new() -> Self {
        Self::with_context_info(ContextInfo {
            version: (4, 6),
            version_string: "4.6.0 Headless".to_string(),
            vendor: "Cadence".to_string(),
            renderer: "Headless".to_string(),
            glsl_version: "4.60".to_string(),
            extensions: HashSet::new(),
            max_texture_size: 16384,
            uniform_buffer_offset_alignment: 256,
        })
    }

    pub fn with_context_info(info: ContextInfo) -> Self {
        Self {
            info,
            log: CallLog::default(),
            recording: false,
            fail_swap_at: None,
            swaps: 0,
        }
    }

    /// A GL 4.6 backend that records every call.
    pub fn recording() -> Self {
        Self::new().record_calls()
    }

    /// Turns call recording on. The log grows by two entries per frame.
    pub fn record_calls(mut self) -> Self {
        self.recording = true;
        self
    }

    /// Makes the `n`-th call to `swap_buffers` (1-based) fail.
    pub fn fail_swap_at(mut self, n: usize) -> Self {
        self.fail_swap_at = Some(n);
        self
    }

    /// Handle to the call log; stays valid after the backend is moved.
    ///
    /// Stays empty unless the backend records calls.
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    /// Frames presented so far.
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    fn record(&self, call: BackendCall) {
        if self.recording {
            self.log.push(call);
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessBackend {
    fn init_context(&mut self) -> Result<ContextInfo, EngineError> {
        self.record(BackendCall::InitContext);
        Ok(self.info.clone())
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<(), EngineError> {
        self.record(BackendCall::SwapInterval(interval));
        Ok(())
    }

    fn recreate_frame_buffer(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.record(BackendCall::RecreateFrameBuffer { width, height });
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.record(BackendCall::Viewport { width, height });
        Ok(())
    }

    fn clear(&mut self, color: ClearColor) -> Result<(), EngineError> {
        self.record(BackendCall::Clear(color));
        Ok(())
    }

    fn flush_and_finish(&mut self) -> Result<(), EngineError> {
        self.record(BackendCall::FlushAndFinish);
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<(), EngineError> {
        self.swaps += 1;
        if self.fail_swap_at == Some(self.swaps) {
            return Err(EngineError::Backend("swap buffers failed".to_string()));
        }
        self.record(BackendCall::SwapBuffers);
        Ok(())
    }

    fn release_context(&mut self) {
        self.record(BackendCall::ReleaseContext);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_are_recorded_in_order() {
        let mut backend = HeadlessBackend::recording();
        let log = backend.call_log();

        backend.init_context().unwrap();
        backend.recreate_frame_buffer(800, 600).unwrap();
        backend.swap_buffers().unwrap();
        backend.release_context();

        assert_eq!(
            log.snapshot(),
            vec![
                BackendCall::InitContext,
                BackendCall::RecreateFrameBuffer { width: 800, height: 600 },
                BackendCall::SwapBuffers,
                BackendCall::ReleaseContext,
            ]
        );
    }

    #[test]
    fn scheduled_swap_failure() {
        let mut backend = HeadlessBackend::recording().fail_swap_at(2);
        let log = backend.call_log();

        assert!(backend.swap_buffers().is_ok());
        assert!(matches!(backend.swap_buffers(), Err(EngineError::Backend(_))));
        assert!(backend.swap_buffers().is_ok());
        assert_eq!(log.count(|c| *c == BackendCall::SwapBuffers), 2);
    }

    #[test]
    fn default_backend_only_counts_frames() {
        let mut backend = HeadlessBackend::new();
        let log = backend.call_log();

        for _ in 0..1000 {
            backend.clear(ClearColor::BLACK).unwrap();
            backend.swap_buffers().unwrap();
        }

        assert!(log.is_empty(), "Non-recording backend must not grow its log");
        assert_eq!(backend.swaps(), 1000);
    }

    #[test]
    fn default_context_passes_capability_check() {
        let mut backend = HeadlessBackend::new();
        let info = backend.init_context().unwrap();
        assert!(super::super::Capabilities::derive(&info).is_ok());
    }
}
