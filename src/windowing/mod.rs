//! Platform windowing and event loop utilities.
//!
//! These helpers abstract the details of `winit` window creation and
//! event dispatch into a compact runtime driving the graphics context.

pub mod app;

pub use app::*;
