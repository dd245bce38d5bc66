//! Time subsystem.
//!
//! Frame boundaries are owned by the render loop:
//! - one `FrameClock` per render loop, `tick()` once per presented frame
//! - `FrameCounter` handles let other subsystems read the frame index without
//!   being able to end frames themselves

mod frame_clock;
mod frame_counter;

pub use frame_clock::{FrameClock, FrameTime};
pub use frame_counter::{FrameCounter, FrameIndexSource};
