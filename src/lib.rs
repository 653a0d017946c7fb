pub mod config;
pub mod controller;
pub mod counter;
pub mod error;
pub mod input;
pub mod parallax;
pub mod reveal;
pub mod sections;
pub mod surface;
pub mod telemetry;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
mod frontend;

#[cfg(target_arch = "wasm32")]
pub use frontend::run;
