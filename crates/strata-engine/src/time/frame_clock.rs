use std::time::{Duration, Instant};

use super::FrameCounter;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Index of the frame that started at this tick.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// The clock drives a shared `FrameCounter`; hand `counter()` to anything that keys
/// per-frame state (such as the uniform pool's overflow diagnostic) so it observes
/// the same frame boundaries as the render loop.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    counter: FrameCounter,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps (0.1 ms .. 250 ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            counter: FrameCounter::new(),
            dt_min,
            dt_max,
        }
    }

    /// Returns a handle observing this clock's frame index.
    pub fn counter(&self) -> FrameCounter {
        self.counter.clone()
    }

    /// Index of the frame currently being recorded.
    pub fn frame_index(&self) -> u64 {
        self.counter.get()
    }

    /// Resets the delta-time baseline without touching the frame index.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Starts a new frame: advances the shared counter and returns its timing.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.counter.advance(),
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_shared_counter() {
        let mut clock = FrameClock::new();
        let observer = clock.counter();
        assert_eq!(observer.get(), 0);

        let ft = clock.tick();
        assert_eq!(ft.frame_index, 1);
        assert_eq!(observer.get(), 1);
        assert_eq!(clock.frame_index(), 1);
    }

    #[test]
    fn dt_is_clamped() {
        let min = Duration::from_millis(5);
        let max = Duration::from_millis(10);
        let mut clock = FrameClock::with_clamps(min, max);

        // Back-to-back ticks are faster than the minimum.
        let ft = clock.tick();
        assert!(ft.dt >= min.as_secs_f32());
        assert!(ft.dt <= max.as_secs_f32());
    }

    #[test]
    fn reset_keeps_frame_index() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.reset();
        assert_eq!(clock.frame_index(), 1);
    }
}
