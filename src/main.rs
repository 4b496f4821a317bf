//=========================================================================
// Cadence Demo Launcher
//=========================================================================
//
// Opens a window driven by the headless backend and a tiny game that
// moves a marker with WASD or the first controller's left stick.
// Escape queues a task that closes the engine from the render thread.
//
// Logging goes through env_logger: `RUST_LOG=debug cadence-demo`.
//
//=========================================================================

use std::process::ExitCode;

use log::{error, info};

use cadence_engine::prelude::*;

//=== DemoGame ============================================================

struct DemoGame {
    tasks: Option<EngineTaskSender>,
    position: (f32, f32),
    previous: (f32, f32),
    ticks: u64,
}

impl DemoGame {
    const SPEED: f32 = 4.0;

    fn new() -> Self {
        Self {
            tasks: None,
            position: (0.0, 0.0),
            previous: (0.0, 0.0),
            ticks: 0,
        }
    }
}

impl Game for DemoGame {
    fn init(&mut self, config: &EngineConfig, tasks: &EngineTaskSender) -> Result<(), EngineError> {
        self.tasks = Some(tasks.clone());
        info!("Demo ready at {}x{}", config.window_width(), config.window_height());
        Ok(())
    }

    fn update(&mut self, input: &InputStateTracker, _config: &EngineConfig) {
        self.previous = self.position;
        self.position.0 += input.axis(InputAxis::Horizontal) * Self::SPEED;
        self.position.1 += input.axis(InputAxis::Vertical) * Self::SPEED;
        self.ticks += 1;

        if input.is_key_pressed(KeyCode::Escape) {
            if let Some(tasks) = &self.tasks {
                tasks.enqueue("Quit", 0, |ctx: &mut RenderContext| {
                    ctx.close.raise();
                    Ok(())
                });
            }
        }
    }

    fn render(&mut self, partial_tick: f32) -> Result<(), EngineError> {
        // Interpolated position; a real backend would draw here
        let _x = self.previous.0 + (self.position.0 - self.previous.0) * partial_tick;
        let _y = self.previous.1 + (self.position.1 - self.previous.1) * partial_tick;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        info!("Demo resized to {}x{}", width, height);
    }

    fn dispose(&mut self) {
        info!("Demo ran for {} ticks", self.ticks);
    }
}

//=== Entry Point =========================================================

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let engine = EngineBuilder::new()
        .with_title("Cadence Demo")
        .with_window_size(1280, 720)
        .with_size_limits(Some((320, 240)), None)
        .with_debug_mode(DebugMode::Low)
        .with_background_fps(30)
        .with_game(DemoGame::new())
        .build();

    match engine.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Engine failed: {}", e);
            if e.is_unrecoverable() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}
