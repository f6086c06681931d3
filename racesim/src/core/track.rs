use crate::core::tires::Compound;
use serde::Deserialize;

/// * `name` - Track name
/// * `length` - (units) Length of the closed track
/// * `pitlane_length` - (units) Length of the pit lane; it straddles the
/// start/finish line, half before and half after
/// * `pitlane_speed` - (units/s) Speed limit when driving through the pit lane
#[derive(Debug, Deserialize, Clone)]
pub struct TrackPars {
    pub name: String,
    pub length: f64,
    pub pitlane_length: f64,
    pub pitlane_speed: f64,
}

impl Default for TrackPars {
    fn default() -> TrackPars {
        TrackPars {
            name: "Grandview Circuit".to_owned(),
            length: 800.0,
            pitlane_length: 100.0,
            pitlane_speed: 4.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub length: f64,
    pub pitlane_length: f64,
    pub pitlane_speed: f64,
}

impl Track {
    pub fn new(track_pars: &TrackPars) -> Track {
        Track {
            name: track_pars.name.to_owned(),
            length: track_pars.length,
            pitlane_length: track_pars.pitlane_length,
            pitlane_speed: track_pars.pitlane_speed,
        }
    }

    /// normalize wraps a cumulative distance into [0, length). Works for the
    /// negative distances cars carry on the starting grid.
    pub fn normalize(&self, distance: f64) -> f64 {
        distance.rem_euclid(self.length)
    }

    /// pit_entry_mark is the track coordinate where a box-called car commits to
    /// the pit lane.
    pub fn pit_entry_mark(&self) -> f64 {
        self.length - self.pitlane_length / 2.0
    }

    /// pit_exit_buffer is how far past the line a car stays speed-limited
    /// after its stop.
    pub fn pit_exit_buffer(&self) -> f64 {
        self.pitlane_length / 2.0
    }

    /// pit_time_penalty estimates the seconds lost by driving the pit lane at
    /// the limit instead of racing past it on the slowest compound.
    pub fn pit_time_penalty(&self) -> f64 {
        let t_pitlane = self.pitlane_length / self.pitlane_speed;
        let t_bypassed = self.pitlane_length / Compound::Hard.base_speed();
        (t_pitlane - t_bypassed).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track() -> Track {
        Track::new(&TrackPars::default())
    }

    #[test]
    fn normalize_wraps_negative_grid_distances() {
        let track = track();
        assert_relative_eq!(track.normalize(-25.0), 775.0);
        assert_relative_eq!(track.normalize(825.0), 25.0);
        assert_relative_eq!(track.normalize(0.0), 0.0);
    }

    #[test]
    fn pit_penalty_matches_lane_geometry() {
        let track = track();
        // 25s through the lane vs ~3.6s past it on hards
        assert_relative_eq!(track.pit_time_penalty(), 21.0);
        assert_relative_eq!(track.pit_entry_mark(), 750.0);
        assert_relative_eq!(track.pit_exit_buffer(), 50.0);
    }
}
