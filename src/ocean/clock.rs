//! Single wave clock shared by the host sampler and the vertex stage.

/// Monotonic accumulator of frame deltas (seconds).
///
/// Advanced exactly once per frame by the frame loop; every consumer reads
/// the same value for that frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveClock {
    elapsed_s: f32,
}

impl WaveClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame delta. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, dt_s: f32) -> f32 {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.elapsed_s += dt_s;
        }
        self.elapsed_s
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulates() {
        let mut clock = WaveClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.elapsed(), 0.75);
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut clock = WaveClock::new();
        clock.advance(1.0);
        clock.advance(-0.5);
        clock.advance(f32::NAN);
        clock.advance(f32::INFINITY);
        assert_eq!(clock.elapsed(), 1.0);
    }
}
