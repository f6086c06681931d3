use std::collections::HashMap;

/// Gap (units) under which a trailing car sits in dirty air and loses pace.
pub const FOLLOWING_THRESHOLD: f64 = 20.0;

/// Flat speed penalty (units/s) while in dirty air.
pub const FOLLOWING_PENALTY: f64 = 0.7;

// Band of gaps the stuck detector watches, independent of the dirty-air
// threshold above.
const STUCK_BAND_MIN: f64 = 8.0;
const STUCK_BAND_MAX: f64 = 23.0;

/// Continuous seconds inside the band before a stuck report fires, and the
/// minimum spacing between repeat reports for the same pair.
const STUCK_AFTER_S: f64 = 10.0;

#[derive(Debug, Clone)]
struct StuckTimer {
    start_time: f64,
    last_report: f64,
    behind: String,
}

/// TrafficState carries the per-vehicle stuck timers across ticks. A timer
/// starts when a car enters the band behind another, resets when the car
/// ahead changes or the gap leaves the band, and reports every 10 seconds
/// the situation stays unresolved.
#[derive(Debug, Default)]
pub struct TrafficState {
    timers: HashMap<String, StuckTimer>,
}

impl TrafficState {
    pub fn new() -> TrafficState {
        TrafficState {
            timers: HashMap::new(),
        }
    }

    /// observe_gap runs the stuck detector for one trailing/leading pair.
    /// Returns the whole seconds the car has been stuck when a report is due.
    pub fn observe_gap(
        &mut self,
        trailing: &str,
        ahead: &str,
        gap: f64,
        race_time: f64,
        trailing_laps: u32,
        either_pitting: bool,
    ) -> Option<u32> {
        if !(gap > STUCK_BAND_MIN && gap < STUCK_BAND_MAX) {
            self.timers.remove(trailing);
            return None;
        }

        let timer = self
            .timers
            .entry(trailing.to_owned())
            .or_insert_with(|| StuckTimer {
                start_time: race_time,
                last_report: 0.0,
                behind: ahead.to_owned(),
            });

        if timer.behind != ahead {
            // new car ahead, restart the clock
            timer.start_time = race_time;
            timer.last_report = 0.0;
            timer.behind = ahead.to_owned();
            return None;
        }

        if race_time - timer.start_time >= STUCK_AFTER_S
            && race_time - timer.last_report >= STUCK_AFTER_S
            && !either_pitting
            && trailing_laps > 1
        {
            timer.last_report = race_time;
            return Some((race_time - timer.start_time).round() as u32);
        }
        None
    }

    /// reset drops the timer for a car that is no longer following anyone.
    pub fn reset(&mut self, trailing: &str) {
        self.timers.remove(trailing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Holding a pair in the band for 25 seconds reports exactly twice, at
    /// 10 and 20 seconds, not once per tick.
    #[test]
    fn stuck_reports_are_rate_limited() {
        let mut traffic = TrafficState::new();
        let mut reports = Vec::new();

        let mut race_time = 0.0;
        while race_time <= 25.0 {
            if let Some(elapsed) = traffic.observe_gap("HAM", "VER", 15.0, race_time, 3, false) {
                reports.push((race_time, elapsed));
            }
            race_time += 0.1;
        }

        assert_eq!(reports.len(), 2);
        assert!((reports[0].0 - 10.0).abs() < 0.11);
        assert!((reports[1].0 - 20.0).abs() < 0.11);
        assert_eq!(reports[0].1, 10);
        assert_eq!(reports[1].1, 20);
    }

    #[test]
    fn leaving_the_band_resets_the_timer() {
        let mut traffic = TrafficState::new();
        for i in 0..90 {
            assert_eq!(
                traffic.observe_gap("HAM", "VER", 15.0, i as f64 * 0.1, 3, false),
                None
            );
        }
        // 9 seconds in, the gap opens past the band
        assert_eq!(traffic.observe_gap("HAM", "VER", 30.0, 9.0, 3, false), None);
        // back in the band: the clock starts over
        assert_eq!(traffic.observe_gap("HAM", "VER", 15.0, 9.1, 3, false), None);
        assert_eq!(traffic.observe_gap("HAM", "VER", 15.0, 18.0, 3, false), None);
        assert!(traffic
            .observe_gap("HAM", "VER", 15.0, 19.2, 3, false)
            .is_some());
    }

    #[test]
    fn changing_the_car_ahead_resets_the_timer() {
        let mut traffic = TrafficState::new();
        traffic.observe_gap("HAM", "VER", 15.0, 0.0, 3, false);
        assert_eq!(traffic.observe_gap("HAM", "LEC", 15.0, 11.0, 3, false), None);
        assert_eq!(traffic.observe_gap("HAM", "LEC", 15.0, 20.0, 3, false), None);
        assert!(traffic
            .observe_gap("HAM", "LEC", 15.0, 21.0, 3, false)
            .is_some());
    }

    #[test]
    fn first_lap_and_pit_cars_never_report() {
        let mut traffic = TrafficState::new();
        traffic.observe_gap("HAM", "VER", 15.0, 0.0, 1, false);
        assert_eq!(traffic.observe_gap("HAM", "VER", 15.0, 12.0, 1, false), None);
        assert_eq!(traffic.observe_gap("HAM", "VER", 15.0, 13.0, 3, true), None);
        // same pair, conditions restored: report is still armed
        assert!(traffic
            .observe_gap("HAM", "VER", 15.0, 14.0, 3, false)
            .is_some());
    }
}
