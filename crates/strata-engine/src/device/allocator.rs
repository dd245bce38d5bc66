use std::ops::Range;

use crate::uniform::{AllocError, MemoryKind, UniformAllocator, UniformRegion};

/// Allocates uniform pool regions as wgpu buffers.
///
/// Each region is a `UNIFORM | COPY_DST` buffer paired with a CPU shadow copy.
/// Writes land in the shadow; `WgpuRegion::flush` uploads the touched bytes through
/// the queue before the frame's commands are submitted.
#[derive(Debug, Clone, Copy)]
pub struct WgpuAllocator<'d> {
    device: &'d wgpu::Device,
}

impl<'d> WgpuAllocator<'d> {
    pub fn new(device: &'d wgpu::Device) -> Self {
        Self { device }
    }
}

impl UniformAllocator for WgpuAllocator<'_> {
    type Region = WgpuRegion;

    fn allocate(&self, size: u64, kind: MemoryKind) -> Result<WgpuRegion, AllocError> {
        // Queue uploads are wgpu's only CPU write path, so both kinds map to the same
        // buffer usage.
        let padded = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);

        let max = self.device.limits().max_buffer_size;
        if padded > max {
            return Err(AllocError::TooLarge { size, max });
        }

        let shadow_len = usize::try_from(padded).map_err(|_| AllocError::OutOfMemory { size })?;
        let mut shadow = Vec::new();
        shadow
            .try_reserve_exact(shadow_len)
            .map_err(|_| AllocError::OutOfMemory { size })?;
        shadow.resize(shadow_len, 0);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata uniform pool"),
            size: padded,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!("allocated {padded} byte uniform buffer ({kind:?})");

        Ok(WgpuRegion {
            buffer,
            shadow,
            len: size,
            dirty: DirtySpans::default(),
        })
    }
}

/// wgpu-backed uniform region.
#[derive(Debug)]
pub struct WgpuRegion {
    buffer: wgpu::Buffer,
    shadow: Vec<u8>,
    len: u64,
    dirty: DirtySpans,
}

impl WgpuRegion {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Uploads every byte written since the previous flush.
    ///
    /// Call once per submission, after recording and before `Queue::submit`. Queue
    /// writes are ordered before the commands submitted after them.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if self.dirty.is_empty() {
            return;
        }

        let len = self.shadow.len() as u64;
        for range in self.dirty.take().ranges() {
            let (start, end) = copy_aligned(range, len);
            queue.write_buffer(&self.buffer, start, &self.shadow[start as usize..end as usize]);
        }
    }
}

impl UniformRegion for WgpuRegion {
    fn len(&self) -> u64 {
        self.len
    }

    fn bytes_mut(&mut self, range: Range<u64>) -> Option<&mut [u8]> {
        if range.start > range.end || range.end > self.len {
            return None;
        }
        self.dirty.mark(range.clone());
        self.shadow.get_mut(range.start as usize..range.end as usize)
    }
}

/// Byte ranges written since the last flush.
///
/// Writes arrive in reservation order, so offsets only move down when the pool wraps.
/// The span written before the wrap (`tail`) and the one started at the base after
/// it (`head`) are kept apart; a single union would re-upload the untouched middle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct DirtySpans {
    tail: Option<Range<u64>>,
    head: Option<Range<u64>>,
}

impl DirtySpans {
    fn mark(&mut self, range: Range<u64>) {
        if range.is_empty() {
            return;
        }

        if let Some(head) = &mut self.head {
            *head = union(head, &range);
        } else if let Some(tail) = &mut self.tail {
            if range.start >= tail.start {
                *tail = union(tail, &range);
            } else {
                self.head = Some(range);
            }
        } else {
            self.tail = Some(range);
        }

        // A base span that has grown into the tail is one upload.
        if let (Some(tail), Some(head)) = (&self.tail, &self.head) {
            if head.end >= tail.start {
                self.tail = Some(union(tail, head));
                self.head = None;
            }
        }
    }

    /// Moves the pending spans out, leaving nothing pending.
    fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    fn is_empty(&self) -> bool {
        self.tail.is_none() && self.head.is_none()
    }

    /// Pending spans, lowest offset first.
    fn ranges(self) -> impl Iterator<Item = Range<u64>> {
        self.head.into_iter().chain(self.tail)
    }
}

fn union(a: &Range<u64>, b: &Range<u64>) -> Range<u64> {
    a.start.min(b.start)..a.end.max(b.end)
}

/// Widens `range` to `COPY_BUFFER_ALIGNMENT` boundaries, clamped to `len`.
///
/// `len` is itself a multiple of the alignment.
fn copy_aligned(range: Range<u64>, len: u64) -> (u64, u64) {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    let start = range.start - range.start % align;
    let end = range.end.next_multiple_of(align).min(len);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_range_is_widened_to_alignment() {
        assert_eq!(copy_aligned(5..9, 64), (4, 12));
        assert_eq!(copy_aligned(0..4, 64), (0, 4));
        assert_eq!(copy_aligned(61..63, 64), (60, 64));
    }

    // ── dirty spans ───────────────────────────────────────────────────────

    fn pending(spans: &DirtySpans) -> Vec<Range<u64>> {
        spans.clone().ranges().collect()
    }

    #[test]
    fn ascending_writes_merge_into_one_span() {
        let mut spans = DirtySpans::default();
        spans.mark(256..320);
        spans.mark(512..528);
        assert_eq!(pending(&spans), vec![256..528]);
    }

    #[test]
    fn wrap_keeps_tail_and_base_spans_apart() {
        let mut spans = DirtySpans::default();
        spans.mark(1_900_000..1_900_064);
        spans.mark(2_000_000..2_000_064);
        // pool wrapped
        spans.mark(0..64);
        spans.mark(256..272);

        assert_eq!(pending(&spans), vec![0..272, 1_900_000..2_000_064]);
    }

    #[test]
    fn base_span_reaching_tail_is_merged() {
        let mut spans = DirtySpans::default();
        spans.mark(64..128);
        spans.mark(0..32);
        spans.mark(32..96);
        assert_eq!(pending(&spans), vec![0..128]);
    }

    #[test]
    fn every_written_byte_is_covered_across_a_wrap() {
        let writes = [96..112, 112..128, 0..16, 16..40, 40..44];
        let mut spans = DirtySpans::default();
        for w in writes.clone() {
            spans.mark(w);
        }

        let covered = pending(&spans);
        for w in writes {
            assert!(
                covered.iter().any(|c| c.start <= w.start && w.end <= c.end),
                "{w:?} not covered by {covered:?}"
            );
        }
    }

    #[test]
    fn take_clears_pending_spans() {
        let mut spans = DirtySpans::default();
        spans.mark(8..16);
        spans.mark(0..4);

        let taken = spans.take();
        assert_eq!(taken.ranges().collect::<Vec<_>>(), vec![0..4, 8..16]);
        assert!(spans.is_empty());
    }

    #[test]
    fn empty_write_marks_nothing() {
        let mut spans = DirtySpans::default();
        spans.mark(32..32);
        assert!(spans.is_empty());

        spans.mark(64..80);
        spans.mark(16..16);
        assert_eq!(pending(&spans), vec![64..80]);
    }
}
