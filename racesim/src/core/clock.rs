use std::time::Instant;

/// Largest wall-clock delta fed into a single simulation step. A frame that
/// stalled longer (window refocus, debugger) advances race time by the cap
/// instead of one giant jump.
const MAX_FRAME_DELTA: f64 = 0.25;

/// RaceClock converts wall-clock instants into simulated timestep sizes and
/// gates them behind the pause flag.
#[derive(Debug, Default)]
pub struct RaceClock {
    last_instant: Option<Instant>,
}

impl RaceClock {
    pub fn new() -> RaceClock {
        RaceClock { last_instant: None }
    }

    /// tick returns the simulated delta for this frame. While paused the
    /// reference instant still advances, so resuming does not replay the
    /// paused interval as a single step.
    pub fn tick(&mut self, now: Instant, paused: bool) -> f64 {
        let delta_s = match self.last_instant {
            Some(last) => now.duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last_instant = Some(now);

        if paused {
            return 0.0;
        }
        delta_s.min(MAX_FRAME_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_tick_is_zero() {
        let mut clock = RaceClock::new();
        assert_eq!(clock.tick(Instant::now(), false), 0.0);
    }

    #[test]
    fn delta_is_clamped() {
        let mut clock = RaceClock::new();
        let t0 = Instant::now();
        clock.tick(t0, false);
        let delta = clock.tick(t0 + Duration::from_secs(5), false);
        assert!((delta - 0.25).abs() < 1e-9);
    }

    #[test]
    fn paused_ticks_produce_no_time_but_advance_the_reference() {
        let mut clock = RaceClock::new();
        let t0 = Instant::now();
        clock.tick(t0, false);
        assert_eq!(clock.tick(t0 + Duration::from_millis(100), true), 0.0);
        // the paused 100ms must not be replayed after resuming
        let delta = clock.tick(t0 + Duration::from_millis(150), false);
        assert!((delta - 0.05).abs() < 1e-6);
    }
}
