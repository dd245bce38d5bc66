use std::fmt;

use super::{MemoryKind, Reservation};

/// Failure reported by a `UniformAllocator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator could not obtain `size` bytes.
    OutOfMemory { size: u64 },
    /// The request exceeds the allocator's (or device's) largest buffer.
    TooLarge { size: u64, max: u64 },
    /// The allocator cannot provide this kind of memory.
    UnsupportedKind(MemoryKind),
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { size } => write!(f, "out of memory allocating {size} bytes"),
            Self::TooLarge { size, max } => {
                write!(f, "allocation of {size} bytes exceeds the {max} byte maximum")
            }
            Self::UnsupportedKind(kind) => write!(f, "memory kind {kind:?} is not supported"),
        }
    }
}

impl std::error::Error for AllocError {}

/// Errors produced by the uniform pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A pool needs at least one byte of backing memory.
    ZeroCapacity,
    /// Backing memory could not be allocated during setup.
    Allocation { capacity: u64, source: AllocError },
    /// A payload is larger than the reservation it is written into.
    PayloadTooLarge { reservation: Reservation, len: usize },
    /// The reservation does not lie inside the pool's region.
    OutOfRange { reservation: Reservation, capacity: u64 },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "uniform pool capacity must be non-zero"),
            Self::Allocation { capacity, source } => {
                write!(f, "failed to allocate {capacity} byte uniform pool: {source}")
            }
            Self::PayloadTooLarge { reservation, len } => write!(
                f,
                "{len} byte payload does not fit reservation of {} bytes at offset {}",
                reservation.size(),
                reservation.offset()
            ),
            Self::OutOfRange {
                reservation,
                capacity,
            } => write!(
                f,
                "reservation [{}, {}) lies outside the {capacity} byte pool",
                reservation.offset(),
                reservation.end()
            ),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation { source, .. } => Some(source),
            _ => None,
        }
    }
}
