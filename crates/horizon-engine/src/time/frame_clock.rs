use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds (clamped).
    pub dt: f32,

    /// Time elapsed since the clock was started, in seconds (unclamped).
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// `dt` is clamped so a debugger pause or a minimized window does not produce a
/// huge step. `elapsed` is wall-clock since `start` and is never clamped, so
/// time-driven animation stays in sync with real time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock whose baseline is `start`. Used by tests to drive time
    /// deterministically through [`tick_at`](Self::tick_at).
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    /// Restarts both the delta baseline and the elapsed origin.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
        self.frame_index = 0;
    }

    /// Seconds since the clock started, without advancing it.
    pub fn elapsed(&self) -> f32 {
        self.last.saturating_duration_since(self.start).as_secs_f32()
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now` and returns a new `FrameTime`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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
    fn elapsed_is_unclamped_while_dt_is_clamped() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let ft = clock.tick_at(t0 + Duration::from_secs(3));
        assert_eq!(ft.dt, 0.25);
        assert!((ft.elapsed - 3.0).abs() < 1e-6);
    }

    #[test]
    fn dt_has_a_floor() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0);
        assert!((ft.dt - 0.0001).abs() < 1e-7);
        assert_eq!(ft.elapsed, 0.0);
    }

    #[test]
    fn frame_index_counts_ticks() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        for i in 0..4u64 {
            let ft = clock.tick_at(t0 + Duration::from_millis(16 * (i + 1)));
            assert_eq!(ft.frame_index, i);
        }
        assert!((clock.elapsed() - 0.064).abs() < 1e-6);
    }
}
