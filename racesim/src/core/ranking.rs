use crate::core::tires::Compound;
use crate::core::track::Track;
use crate::core::vehicle::Vehicle;
use helpers::general::{argmax, argsort, SortOrder};
use serde::Serialize;

/// Where a car would rejoin if it pitted at the end of this tick.
#[derive(Debug, Clone, Serialize)]
pub struct PitProjection {
    pub position: usize,
    /// Car the stop would drop us behind; None when we would keep the lead.
    pub car_ahead: Option<String>,
    /// Seconds behind that car after the stop.
    pub gap: f64,
}

/// One scoreboard row. Derived from vehicle state each tick, never stored
/// back into the vehicles.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub position: usize,
    pub name: String,
    pub team: String,
    pub laps: u32,
    pub compound: Compound,
    pub condition: f64,
    pub current_speed: f64,
    /// Seconds to the car one position ahead; 0 for the leader.
    pub interval: f64,
    /// Progress through the current lap in percent.
    pub dist_percent: u32,
    pub status: String,
    pub tire_history: Vec<Compound>,
    pub last_lap_time: Option<f64>,
    pub pit_projection: PitProjection,
}

/// race_progress is the combined ordering key: full laps plus the position
/// within the current one. A degenerate position sorts last.
fn race_progress(vehicle: &Vehicle, track: &Track) -> f64 {
    let progress =
        vehicle.laps as f64 * track.length + track.normalize(vehicle.distance_traveled);
    if progress.is_finite() {
        progress
    } else {
        f64::NEG_INFINITY
    }
}

/// leader_index returns the index of the car currently leading the race.
pub fn leader_index(vehicles: &[Vehicle], track: &Track) -> Option<usize> {
    if vehicles.is_empty() {
        return None;
    }
    let keys: Vec<f64> = vehicles.iter().map(|v| race_progress(v, track)).collect();
    Some(argmax(&keys))
}

/// compute_standings orders the field (laps first, in-lap distance second) and
/// derives the time gaps and pit projections shown on the scoreboard.
pub fn compute_standings(vehicles: &[Vehicle], track: &Track) -> Vec<Standing> {
    let keys: Vec<f64> = vehicles.iter().map(|v| race_progress(v, track)).collect();
    let order = argsort(&keys, SortOrder::Descending);

    order
        .iter()
        .enumerate()
        .map(|(idx, &vi)| {
            let vehicle = &vehicles[vi];
            let normalized = track.normalize(vehicle.distance_traveled);

            // interval to the car one position ahead, in seconds at its pace
            let interval = if idx == 0 {
                0.0
            } else {
                let front = &vehicles[order[idx - 1]];
                let gap_dist = (front.laps as f64 - vehicle.laps as f64) * track.length
                    + (track.normalize(front.distance_traveled) - normalized);
                (gap_dist / front.tires.compound.base_speed()).max(0.0)
            };

            Standing {
                position: idx + 1,
                name: vehicle.name.to_owned(),
                team: vehicle.team.to_owned(),
                laps: vehicle.laps,
                compound: vehicle.tires.compound,
                condition: vehicle.tires.condition,
                current_speed: vehicle.current_speed,
                interval,
                dist_percent: (normalized / track.length * 100.0).round() as u32,
                status: vehicle.status_label().to_owned(),
                tire_history: vehicle.tire_history.to_owned(),
                last_lap_time: vehicle.last_lap_time,
                pit_projection: project_pit_stop(vehicle, vehicles, track),
            }
        })
        .collect()
}

/// project_pit_stop rewinds a car by the distance a stop costs and finds the
/// car it would rejoin behind.
fn project_pit_stop(vehicle: &Vehicle, vehicles: &[Vehicle], track: &Track) -> PitProjection {
    let distance_loss = track.pit_time_penalty() * vehicle.tires.compound.base_speed();
    let projected = vehicle.distance_traveled - distance_loss;

    let mut car_ahead: Option<&Vehicle> = None;
    let mut ahead_count = 0;
    for other in vehicles.iter() {
        if other.name == vehicle.name {
            continue;
        }
        if other.distance_traveled > projected {
            ahead_count += 1;
            let closer = car_ahead
                .map_or(true, |ahead| other.distance_traveled < ahead.distance_traveled);
            if closer {
                car_ahead = Some(other);
            }
        }
    }

    match car_ahead {
        Some(ahead) => PitProjection {
            position: ahead_count + 1,
            car_ahead: Some(ahead.name.to_owned()),
            gap: ((ahead.distance_traveled - projected)
                / vehicle.tires.compound.base_speed())
            .max(0.0),
        },
        None => PitProjection {
            position: 1,
            car_ahead: None,
            gap: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::TrackPars;
    use crate::core::vehicle::{ControlMode, TeamPars, Vehicle};
    use approx::assert_relative_eq;

    fn team_pars(name: &str) -> TeamPars {
        TeamPars {
            name: name.to_owned(),
            color: "#00a0de".to_owned(),
            drivers: vec!["AAA".to_owned(), "BBB".to_owned()],
            control: ControlMode::Player,
            provider: "openrouter".to_owned(),
            model: "test-model".to_owned(),
        }
    }

    fn vehicle(name: &str, laps: u32, distance: f64, compound: Compound) -> Vehicle {
        let mut v = Vehicle::new(name, &team_pars("Test Team"), 0, compound);
        v.laps = laps;
        v.distance_traveled = distance;
        v
    }

    #[test]
    fn same_lap_orders_by_distance_with_zero_leader_interval() {
        let track = Track::new(&TrackPars::default());
        let vehicles = vec![
            vehicle("BBB", 3, 2600.0, Compound::Medium), // norm 200
            vehicle("AAA", 3, 2900.0, Compound::Medium), // norm 500
        ];
        let standings = compute_standings(&vehicles, &track);
        assert_eq!(standings[0].name, "AAA");
        assert_eq!(standings[1].name, "BBB");
        assert_relative_eq!(standings[0].interval, 0.0);
        // 300 units at medium pace behind the car ahead
        assert_relative_eq!(standings[1].interval, 300.0 / 29.0);
    }

    #[test]
    fn lap_count_beats_in_lap_distance() {
        let track = Track::new(&TrackPars::default());
        let vehicles = vec![
            vehicle("AAA", 2, 2300.0, Compound::Medium), // norm 700, lap 2
            vehicle("BBB", 3, 2450.0, Compound::Medium), // norm 50, lap 3
        ];
        let standings = compute_standings(&vehicles, &track);
        assert_eq!(standings[0].name, "BBB");
        assert_eq!(standings[0].laps, 3);
    }

    #[test]
    fn interval_is_never_negative() {
        let track = Track::new(&TrackPars::default());
        // lapped car physically just ahead on track
        let vehicles = vec![
            vehicle("AAA", 3, 2410.0, Compound::Medium), // norm 10
            vehicle("BBB", 2, 2390.0, Compound::Medium), // norm 790, one lap down
        ];
        let standings = compute_standings(&vehicles, &track);
        assert!(standings[1].interval >= 0.0);
    }

    #[test]
    fn pit_projection_finds_the_rejoin_slot() {
        let track = Track::new(&TrackPars::default());
        // medium stop costs 21s * 29 u/s = 609 units
        let vehicles = vec![
            vehicle("AAA", 5, 4500.0, Compound::Medium),
            vehicle("BBB", 5, 4300.0, Compound::Medium),
            vehicle("CCC", 5, 3600.0, Compound::Medium),
        ];
        let standings = compute_standings(&vehicles, &track);
        let projection = &standings[0].pit_projection;
        // AAA rewinds to 3891: behind BBB, ahead of CCC
        assert_eq!(projection.car_ahead.as_deref(), Some("BBB"));
        assert_eq!(projection.position, 2);
        assert_relative_eq!(projection.gap, (4300.0 - 3891.0) / 29.0);
    }

    #[test]
    fn pit_projection_keeps_the_lead_when_clear() {
        let track = Track::new(&TrackPars::default());
        let vehicles = vec![
            vehicle("AAA", 5, 4500.0, Compound::Medium),
            vehicle("BBB", 3, 2500.0, Compound::Medium),
        ];
        let standings = compute_standings(&vehicles, &track);
        let projection = &standings[0].pit_projection;
        assert_eq!(projection.car_ahead, None);
        assert_eq!(projection.position, 1);
    }

    #[test]
    fn leader_index_tracks_laps_and_distance() {
        let track = Track::new(&TrackPars::default());
        let vehicles = vec![
            vehicle("AAA", 2, 2300.0, Compound::Medium),
            vehicle("BBB", 3, 2450.0, Compound::Medium),
        ];
        assert_eq!(leader_index(&vehicles, &track), Some(1));
        assert_eq!(leader_index(&[], &track), None);
    }
}
