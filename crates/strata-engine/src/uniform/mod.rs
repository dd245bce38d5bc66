//! Transient uniform memory.
//!
//! A `UniformPool` owns one fixed region of GPU-visible memory and hands out short-lived
//! reservations in draw-recording order, wrapping to the start when the tail is too
//! small. `StageUniformBinder` sits on top: it asks a compiled program how much uniform
//! data it needs, reserves that much, and binds it for its shader stage.
//!
//! The GPU side is reached only through traits (`UniformAllocator`, `UniformBindTarget`,
//! `ProgramDescriptor`), so everything here runs without a device. The wgpu
//! implementations live in `device` and `render`.

mod binder;
mod error;
mod memory;
mod pool;

pub use binder::{
    ProgramDescriptor, ShaderStage, StageBinders, StageUniformBinder, UniformBindTarget,
};
pub use error::{AllocError, PoolError};
pub use memory::{HostAllocator, HostRegion, MemoryKind, UniformAllocator, UniformRegion};
pub use pool::{DEFAULT_POOL_CAPACITY, PoolConfig, PoolStats, Reservation, UniformPool};
