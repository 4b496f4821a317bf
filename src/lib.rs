//=========================================================================
// Cadence Engine - Library Root
//
// This crate defines the public API surface of the Cadence Engine.
//
// Responsibilities:
// - Expose the engine facade (`EngineBuilder`, `Engine`, `EngineHandle`)
// - Expose `core` (config, tasks, input, render seam) for game code
// - Keep the Winit integration (`platform`) private
//
// Typical usage:
// ```no_run
// use cadence_engine::EngineBuilder;
//
// fn main() {
//     if let Err(e) = EngineBuilder::new().build().run() {
//         eprintln!("{e}");
//     }
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the engine systems that do not depend on the windowing
// backend: scheduler, task queue, input tracking, lifecycle primitives.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` contains the Winit integration (window, event loop, input
// conversion) and is kept private.
//
// `engine` defines the main engine entry point and startup wiring.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder, EngineHandle};
pub use platform::{BackendFactory, PlatformEvent, WindowEventPump};
