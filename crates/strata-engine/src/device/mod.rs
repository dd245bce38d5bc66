//! GPU device management and wgpu-backed uniform memory.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - allocating uniform pool regions as wgpu buffers with a CPU shadow

mod allocator;
mod gpu;
mod init;

pub use allocator::{WgpuAllocator, WgpuRegion};
pub use gpu::HeadlessGpu;
pub use init::GpuInit;
