//! Strata engine crate.
//!
//! Transient uniform memory for wgpu renderers (`uniform`), its wgpu backend
//! (`device`, `render`), and the row-major math used to fill it (`math`).

pub mod device;
pub mod math;
pub mod render;
pub mod time;
pub mod uniform;

pub mod logging;
