use crate::core::tires::Compound;
use crate::core::track::Track;

/// Phases a car moves through around a stop: the stop is requested (box
/// called), the car commits to the lane, swaps tires just past the line,
/// then rejoins the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitPhase {
    Racing,
    BoxCalled,
    PitEntry,
    PitExit,
}

/// Window (units) past the start/finish line in which the standing stop fires.
const SWAP_WINDOW: f64 = 10.0;

/// A box call within this many units of the line rolls the entry over to the
/// next lap; the car can no longer make the pit entry safely this time around.
const LATE_CALL_ZONE: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct PitState {
    pub phase: PitPhase,
    /// Compound to fit at the stop.
    pub scheduled: Option<Compound>,
    /// First lap on which the entry is legal.
    pub call_lap: Option<u32>,
    /// Guards the swap so it executes exactly once per stop.
    pub tire_changed: bool,
}

impl PitState {
    pub fn new() -> PitState {
        PitState {
            phase: PitPhase::Racing,
            scheduled: None,
            call_lap: None,
            tire_changed: false,
        }
    }

    /// in_pit_lane reports whether the car is physically inside the lane.
    pub fn in_pit_lane(&self) -> bool {
        matches!(self.phase, PitPhase::PitEntry | PitPhase::PitExit)
    }

    /// active reports whether any stop is scheduled or underway.
    pub fn active(&self) -> bool {
        self.scheduled.is_some()
    }

    /// call schedules a stop. A call inside the late-call zone becomes legal
    /// only on the following lap.
    pub fn call(&mut self, compound: Compound, laps: u32, normalized: f64, track: &Track) {
        self.scheduled = Some(compound);
        self.phase = PitPhase::BoxCalled;
        self.call_lap = Some(if normalized >= track.length - LATE_CALL_ZONE {
            laps + 1
        } else {
            laps
        });
    }

    /// cancel reverts a box call. Returns false once the car has committed to
    /// the lane (or no call exists).
    pub fn cancel(&mut self) -> bool {
        if self.phase != PitPhase::BoxCalled {
            return false;
        }
        self.clear();
        true
    }

    /// clear resets all stop scheduling after the car rejoins the track.
    pub fn clear(&mut self) {
        self.phase = PitPhase::Racing;
        self.scheduled = None;
        self.call_lap = None;
        self.tire_changed = false;
    }

    /// check_entry transitions into the lane once the car reaches the entry
    /// mark on a legal lap. Returns true on the transition tick.
    pub fn check_entry(&mut self, normalized: f64, laps: u32, track: &Track) -> bool {
        let legal = self.call_lap.map_or(false, |call_lap| laps >= call_lap);
        if self.phase == PitPhase::BoxCalled && legal && normalized >= track.pit_entry_mark() {
            self.phase = PitPhase::PitEntry;
            return true;
        }
        false
    }

    /// take_swap fires exactly once per stop, in the standing window just past
    /// the line. Returns the compound to fit.
    pub fn take_swap(&mut self, normalized: f64) -> Option<Compound> {
        if self.phase == PitPhase::PitEntry && normalized < SWAP_WINDOW && !self.tire_changed {
            self.tire_changed = true;
            self.phase = PitPhase::PitExit;
            return self.scheduled;
        }
        None
    }

    /// check_exit releases the car once its projected position clears the exit
    /// buffer. Returns true when the car rejoins the track.
    pub fn check_exit(&mut self, projected_normalized: f64, track: &Track) -> bool {
        if self.phase == PitPhase::PitExit && projected_normalized > track.pit_exit_buffer() {
            self.clear();
            return true;
        }
        false
    }
}

impl Default for PitState {
    fn default() -> Self {
        PitState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::TrackPars;

    fn track() -> Track {
        Track::new(&TrackPars::default())
    }

    #[test]
    fn late_call_rolls_to_next_lap() {
        let track = track();
        let mut pit = PitState::new();
        pit.call(Compound::Soft, 3, 650.0, &track);
        assert_eq!(pit.call_lap, Some(3));

        let mut pit = PitState::new();
        pit.call(Compound::Soft, 3, 710.0, &track); // inside the final 100 units
        assert_eq!(pit.call_lap, Some(4));
    }

    #[test]
    fn entry_requires_legal_lap_and_mark() {
        let track = track();
        let mut pit = PitState::new();
        pit.call(Compound::Hard, 2, 710.0, &track); // legal from lap 3
        assert!(!pit.check_entry(760.0, 2, &track));
        assert_eq!(pit.phase, PitPhase::BoxCalled);
        assert!(pit.check_entry(760.0, 3, &track));
        assert_eq!(pit.phase, PitPhase::PitEntry);
    }

    #[test]
    fn swap_fires_once_in_window() {
        let track = track();
        let mut pit = PitState::new();
        pit.call(Compound::Hard, 1, 100.0, &track);
        pit.check_entry(770.0, 1, &track);
        assert_eq!(pit.take_swap(40.0), None); // not yet in the window
        assert_eq!(pit.take_swap(5.0), Some(Compound::Hard));
        assert_eq!(pit.phase, PitPhase::PitExit);
        assert_eq!(pit.take_swap(6.0), None); // already changed
    }

    #[test]
    fn cancel_only_before_commitment() {
        let track = track();
        let mut pit = PitState::new();
        assert!(!pit.cancel()); // nothing scheduled
        pit.call(Compound::Soft, 1, 100.0, &track);
        assert!(pit.cancel());
        assert_eq!(pit.phase, PitPhase::Racing);
        assert_eq!(pit.scheduled, None);

        pit.call(Compound::Soft, 1, 100.0, &track);
        pit.check_entry(770.0, 1, &track);
        assert!(!pit.cancel());
        assert_eq!(pit.phase, PitPhase::PitEntry);
    }

    #[test]
    fn exit_clears_all_scheduling() {
        let track = track();
        let mut pit = PitState::new();
        pit.call(Compound::Hard, 1, 100.0, &track);
        pit.check_entry(770.0, 1, &track);
        pit.take_swap(5.0);
        assert!(!pit.check_exit(30.0, &track));
        assert!(pit.check_exit(55.0, &track));
        assert_eq!(pit.phase, PitPhase::Racing);
        assert!(!pit.active());
        assert!(!pit.tire_changed);
    }
}
