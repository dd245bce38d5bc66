//! Backing memory for the uniform pool.
//!
//! The pool never allocates on its own; it asks a `UniformAllocator` once during
//! setup and keeps the returned region for its whole lifetime.

use std::ops::Range;

use super::AllocError;

/// Where the allocator should place the region.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemoryKind {
    /// CPU-writable memory the GPU reads without an extra copy pass.
    HostVisible,
    /// Device memory reachable from the CPU only through queue uploads.
    DeviceLocal,
}

/// A fixed-size byte region readable by the GPU.
pub trait UniformRegion {
    /// Usable size in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable view of `range`, or `None` when it does not fit the region.
    fn bytes_mut(&mut self, range: Range<u64>) -> Option<&mut [u8]>;
}

/// GPU-visible allocator collaborator.
pub trait UniformAllocator {
    type Region: UniformRegion;

    fn allocate(&self, size: u64, kind: MemoryKind) -> Result<Self::Region, AllocError>;
}

/// Allocator handing out plain host memory.
///
/// Used for tests and CPU-side tooling. `with_limit` caps the largest accepted
/// request so allocation failure can be exercised deterministically.
#[derive(Debug, Clone, Default)]
pub struct HostAllocator {
    limit: Option<u64>,
}

impl HostAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: u64) -> Self {
        Self { limit: Some(limit) }
    }
}

impl UniformAllocator for HostAllocator {
    type Region = HostRegion;

    fn allocate(&self, size: u64, kind: MemoryKind) -> Result<HostRegion, AllocError> {
        if kind != MemoryKind::HostVisible {
            return Err(AllocError::UnsupportedKind(kind));
        }
        if let Some(max) = self.limit.filter(|&max| size > max) {
            return Err(AllocError::TooLarge { size, max });
        }

        let len = usize::try_from(size).map_err(|_| AllocError::OutOfMemory { size })?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| AllocError::OutOfMemory { size })?;
        bytes.resize(len, 0);

        Ok(HostRegion { bytes })
    }
}

/// Host memory region returned by `HostAllocator`.
#[derive(Debug, Clone)]
pub struct HostRegion {
    bytes: Vec<u8>,
}

impl HostRegion {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl UniformRegion for HostRegion {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn bytes_mut(&mut self, range: Range<u64>) -> Option<&mut [u8]> {
        let start = usize::try_from(range.start).ok()?;
        let end = usize::try_from(range.end).ok()?;
        self.bytes.get_mut(start..end)
    }
}
