//! Element implementations the engine runs against.

pub mod host;

#[cfg(target_arch = "wasm32")]
pub mod browser;
