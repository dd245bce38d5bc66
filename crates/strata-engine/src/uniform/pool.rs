use bytemuck::Pod;

use crate::time::{FrameCounter, FrameIndexSource};

use super::{MemoryKind, PoolError, UniformAllocator, UniformRegion};

/// Default pool capacity (2 MiB).
pub const DEFAULT_POOL_CAPACITY: u64 = 2 * 1024 * 1024;

/// Pool setup parameters.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Size of the backing region in bytes.
    ///
    /// Size it for the uniform traffic of every frame the GPU may still be reading;
    /// the pool does not wait for the GPU before reusing bytes.
    pub capacity: u64,

    /// Memory kind requested from the allocator.
    pub memory_kind: MemoryKind,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            memory_kind: MemoryKind::HostVisible,
        }
    }
}

/// A transient slice of the pool handed out by `UniformPool::reserve`.
///
/// This is a position, not an owner. It stays valid until the pool wraps back over
/// its byte range.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Reservation {
    offset: u64,
    size: u32,
}

impl Reservation {
    #[inline]
    pub const fn offset(self) -> u64 {
        self.offset
    }

    #[inline]
    pub const fn size(self) -> u32 {
        self.size
    }

    #[inline]
    pub const fn end(self) -> u64 {
        self.offset + self.size as u64
    }

    /// True when the reservation starts at the region's base.
    #[inline]
    pub const fn is_at_base(self) -> bool {
        self.offset == 0
    }
}

/// Counters for pool diagnostics.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PoolStats {
    /// Reservations granted so far.
    pub reservations: u64,
    /// Times the cursor wrapped back to the base.
    pub wraps: u64,
    /// Outage warnings logged (at most one per frame).
    pub outage_reports: u64,
}

/// Circular pool of transient uniform memory.
///
/// Reservations are carved from a fixed region in call order with a single write
/// cursor. When a request does not fit in the remaining tail, the tail is abandoned
/// and the request is placed at the base instead; reservations never straddle the
/// end of the region.
///
/// The pool does not synchronize with the GPU. Callers must reserve from one render
/// thread in draw-recording order and keep the capacity large enough that the GPU
/// has finished with a byte range before the cursor comes back to it.
#[derive(Debug)]
pub struct UniformPool<R, F = FrameCounter> {
    region: R,
    capacity: u64,
    cursor: u64,
    frames: F,
    last_outage_frame: Option<u64>,
    stats: PoolStats,
}

impl<R: UniformRegion, F: FrameIndexSource> UniformPool<R, F> {
    /// Allocates the backing region and creates the pool.
    ///
    /// Allocation failure is not recoverable here: the error is meant to be
    /// propagated until the renderer gives up.
    pub fn setup<A>(allocator: &A, config: PoolConfig, frames: F) -> Result<Self, PoolError>
    where
        A: UniformAllocator<Region = R> + ?Sized,
    {
        let PoolConfig {
            capacity,
            memory_kind,
        } = config;

        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }

        let region = allocator
            .allocate(capacity, memory_kind)
            .map_err(|source| PoolError::Allocation { capacity, source })?;

        log::debug!("uniform pool ready: {capacity} bytes ({memory_kind:?})");

        Ok(Self {
            region,
            capacity,
            cursor: 0,
            frames,
            last_outage_frame: None,
            stats: PoolStats::default(),
        })
    }

    /// Reserves `size` contiguous bytes.
    ///
    /// If `cursor + size` reaches the capacity the reservation is placed at the base
    /// and the cursor restarts at `size`. Sizes larger than the capacity are not
    /// rejected; they land at the base and force the next call to wrap as well.
    pub fn reserve(&mut self, size: u32) -> Reservation {
        let len = u64::from(size);
        self.stats.reservations += 1;

        if self.cursor + len >= self.capacity {
            self.report_outage();
            self.cursor = len;
            return Reservation { offset: 0, size };
        }

        let offset = self.cursor;
        self.cursor += len;
        Reservation { offset, size }
    }

    fn report_outage(&mut self) {
        self.stats.wraps += 1;

        let frame = self.frames.frame_index();
        if self.last_outage_frame == Some(frame) {
            return;
        }
        self.last_outage_frame = Some(frame);
        self.stats.outage_reports += 1;

        log::warn!(
            "uniform pool outage at frame {frame}: {} bytes exhausted, wrapping to the start; \
             consider increasing its capacity",
            self.capacity
        );
    }

    /// Copies `bytes` to the start of `reservation`.
    pub fn write(&mut self, reservation: Reservation, bytes: &[u8]) -> Result<(), PoolError> {
        if bytes.len() as u64 > u64::from(reservation.size()) {
            return Err(PoolError::PayloadTooLarge {
                reservation,
                len: bytes.len(),
            });
        }

        let start = reservation.offset();
        let capacity = self.capacity;
        let dst = self
            .region
            .bytes_mut(start..start + bytes.len() as u64)
            .filter(|_| reservation.end() <= capacity)
            .ok_or(PoolError::OutOfRange {
                reservation,
                capacity,
            })?;
        dst.copy_from_slice(bytes);
        Ok(())
    }

    /// Copies a plain-old-data value to the start of `reservation`.
    pub fn write_pod<T: Pod>(&mut self, reservation: Reservation, value: &T) -> Result<(), PoolError> {
        self.write(reservation, bytemuck::bytes_of(value))
    }
}

impl<R, F> UniformPool<R, F> {
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Offset the next non-wrapping reservation will start at.
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    #[inline]
    pub fn region(&self) -> &R {
        &self.region
    }

    #[inline]
    pub fn region_mut(&mut self) -> &mut R {
        &mut self.region
    }
}
