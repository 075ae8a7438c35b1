//! Surfaceless GPU device management.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue used by the texture backend
//! and the node renderer, and reads rendered frames back for tools and tests.
//! Windowing and swapchains belong to the embedding application.

mod headless;

pub use headless::{HeadlessGpu, HeadlessInit, HEADLESS_FORMAT};
