use std::cell::Cell;
use std::rc::Rc;

/// Read-only view of the current frame index.
///
/// Values must be monotonic: the index only changes when the render loop ends a frame.
pub trait FrameIndexSource {
    fn frame_index(&self) -> u64;
}

impl<T: FrameIndexSource + ?Sized> FrameIndexSource for &T {
    #[inline]
    fn frame_index(&self) -> u64 {
        (**self).frame_index()
    }
}

/// Shared frame counter for a single render thread.
///
/// Clones observe the same counter. The render loop advances it (usually through
/// `FrameClock::tick`); consumers such as the uniform pool only read it.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    index: Rc<Cell<u64>>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(index: u64) -> Self {
        Self {
            index: Rc::new(Cell::new(index)),
        }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.index.get()
    }

    /// Moves to the next frame and returns its index.
    #[inline]
    pub fn advance(&self) -> u64 {
        let next = self.index.get().wrapping_add(1);
        self.index.set(next);
        next
    }
}

impl FrameIndexSource for FrameCounter {
    #[inline]
    fn frame_index(&self) -> u64 {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_index() {
        let a = FrameCounter::new();
        let b = a.clone();
        assert_eq!(a.advance(), 1);
        assert_eq!(b.frame_index(), 1);
    }

    #[test]
    fn starting_at_sets_initial_index() {
        let c = FrameCounter::starting_at(41);
        assert_eq!(c.get(), 41);
        assert_eq!(c.advance(), 42);
    }

    #[test]
    fn reference_forwards_to_source() {
        let c = FrameCounter::starting_at(7);
        let r = &c;
        assert_eq!(FrameIndexSource::frame_index(&r), 7);
    }
}
