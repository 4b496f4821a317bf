//=========================================================================
// Engine Configuration
//=========================================================================
//
// Read-many / write-few configuration shared by both engine threads.
//
// Architecture:
// ```text
//   EngineBuilder ──build()──> Arc<EngineConfig>
//                                 │
//        Window thread ───────────┼──────── Render thread
//        (callbacks write:        │         (reads every iteration:
//         size, minimized,        │          minimized, debug mode,
//         maximized)              │          background fps, size)
// ```
//
// The mutable fields are independent atomic scalars. Readers may see a
// value updated "this instant" or "next iteration", never a torn value.
// Work that depends on several fields at once (framebuffer recreation
// after a resize) is routed through the task queue instead.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

//=== Constants ===========================================================

/// Smallest window dimension the config will record.
pub const MIN_WINDOW_DIMENSION: u32 = 10;

//=== WindowMode ==========================================================

/// How the window is placed on the primary monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    #[default]
    Windowed,
    Fullscreen,
    BorderlessFullscreen,
}

//=== DebugMode ===========================================================

/// Diagnostic verbosity of the engine.
///
/// - `None`: no title statistics, no per-task delay logging
/// - `Low`: live FPS/TPS in the window title
/// - `Full`: additionally logs every delayed task on each drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DebugMode {
    #[default]
    None,
    Low,
    Full,
}

//=== ClearColor ==========================================================

/// RGBA color the frame is cleared to before the game renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self { red, green, blue, alpha }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

//=== EngineConfig ========================================================

/// Engine configuration shared between the window and render threads.
///
/// Construct through [`crate::EngineBuilder`]. Fixed settings are plain
/// fields; settings the OS can change at runtime are atomics so either
/// thread can touch them through `&self`.
#[derive(Debug)]
pub struct EngineConfig {
    //--- Fixed at build time ---------------------------------------------
    pub(crate) title: String,
    pub(crate) version: String,
    pub(crate) min_size: Option<(u32, u32)>,
    pub(crate) max_size: Option<(u32, u32)>,
    pub(crate) window_mode: WindowMode,
    pub(crate) resizable: bool,
    pub(crate) clear_color: ClearColor,
    pub(crate) debug_mode: DebugMode,
    pub(crate) background_fps: Option<u32>,
    pub(crate) input_channel_capacity: usize,

    //--- Written by window callbacks -------------------------------------
    window_width: AtomicU32,
    window_height: AtomicU32,
    maximized: AtomicBool,
    minimized: AtomicBool,
    vsync: AtomicBool,
}

impl EngineConfig {
    /// Creates a configuration with default values (1280x720, windowed).
    pub fn new() -> Self {
        Self {
            title: "Cadence Engine".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            min_size: None,
            max_size: None,
            window_mode: WindowMode::Windowed,
            resizable: true,
            clear_color: ClearColor::BLACK,
            debug_mode: DebugMode::None,
            background_fps: None,
            input_channel_capacity: 128,
            window_width: AtomicU32::new(1280),
            window_height: AtomicU32::new(720),
            maximized: AtomicBool::new(false),
            minimized: AtomicBool::new(false),
            vsync: AtomicBool::new(false),
        }
    }

    //--- Fixed settings ---------------------------------------------------

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn min_size(&self) -> Option<(u32, u32)> {
        self.min_size
    }

    pub fn max_size(&self) -> Option<(u32, u32)> {
        self.max_size
    }

    pub fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    pub fn is_windowed(&self) -> bool {
        self.window_mode == WindowMode::Windowed
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear_color
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.debug_mode
    }

    /// Frame rate ceiling applied while minimized (`None` = unthrottled).
    pub fn background_fps(&self) -> Option<u32> {
        self.background_fps
    }

    pub fn input_channel_capacity(&self) -> usize {
        self.input_channel_capacity
    }

    //--- Runtime settings -------------------------------------------------

    pub fn window_width(&self) -> u32 {
        self.window_width.load(Ordering::Relaxed)
    }

    pub fn window_height(&self) -> u32 {
        self.window_height.load(Ordering::Relaxed)
    }

    /// Records a new window size, clamping each side to [`MIN_WINDOW_DIMENSION`].
    pub(crate) fn set_window_size(&self, width: u32, height: u32) {
        self.window_width
            .store(width.max(MIN_WINDOW_DIMENSION), Ordering::Relaxed);
        self.window_height
            .store(height.max(MIN_WINDOW_DIMENSION), Ordering::Relaxed);
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.window_width() as f64 / self.window_height() as f64
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized.load(Ordering::Relaxed)
    }

    pub(crate) fn set_maximized(&self, maximized: bool) {
        self.maximized.store(maximized, Ordering::Relaxed);
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized.load(Ordering::Relaxed)
    }

    pub(crate) fn set_minimized(&self, minimized: bool) {
        self.minimized.store(minimized, Ordering::Relaxed);
    }

    pub fn is_vsync(&self) -> bool {
        self.vsync.load(Ordering::Relaxed)
    }

    /// Only records the flag. Use `EngineHandle::set_vsync` at runtime so the
    /// swap interval follows.
    pub(crate) fn set_vsync(&self, vsync: bool) {
        self.vsync.store(vsync, Ordering::Relaxed);
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.window_width(), 1280);
        assert_eq!(config.window_height(), 720);
        assert_eq!(config.window_mode(), WindowMode::Windowed);
        assert_eq!(config.debug_mode(), DebugMode::None);
        assert_eq!(config.background_fps(), None);
        assert!(!config.is_minimized());
    }

    #[test]
    fn window_size_is_clamped() {
        let config = EngineConfig::new();
        config.set_window_size(4, 600);
        assert_eq!(config.window_width(), MIN_WINDOW_DIMENSION);
        assert_eq!(config.window_height(), 600);
    }

    #[test]
    fn aspect_ratio_is_width_over_height() {
        let config = EngineConfig::new();
        config.set_window_size(1600, 800);
        assert_eq!(config.aspect_ratio(), 2.0);
    }

    #[test]
    fn flags_are_visible_across_threads() {
        let config = std::sync::Arc::new(EngineConfig::new());
        let writer = std::sync::Arc::clone(&config);

        std::thread::spawn(move || {
            writer.set_minimized(true);
            writer.set_maximized(true);
        })
        .join()
        .unwrap();

        assert!(config.is_minimized());
        assert!(config.is_maximized());
    }

    #[test]
    fn debug_modes_are_ordered() {
        assert!(DebugMode::Full > DebugMode::Low);
        assert!(DebugMode::Low > DebugMode::None);
    }
}
