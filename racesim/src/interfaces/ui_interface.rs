use crate::core::event::Event;
use crate::core::race::Race;
use crate::core::ranking::{compute_standings, Standing};
use anyhow::Context;

pub const MAX_UI_UPDATE_FREQUENCY: f64 = 20.0;

#[derive(Debug, Clone, Default)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Per-car state the renderer needs to move a marker around the track.
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub name: String,
    pub team: String,
    pub color: RgbColor,
    /// Completed laps plus the fraction of the current one.
    pub race_prog: f64,
    pub velocity: f64,
    pub blocked: bool,
    pub in_pit_lane: bool,
}

/// One completed strategy-agent reply, as surfaced to the user.
#[derive(Debug, Clone)]
pub struct Notification {
    pub team: String,
    pub content: String,
    pub race_time: f64,
    pub model: String,
}

/// RaceSnapshot is the read-only view handed to the UI collaborator each
/// update. The engine never reads anything back from it.
#[derive(Debug, Clone)]
pub struct RaceSnapshot {
    pub race_time: f64,
    pub vehicle_states: Vec<VehicleState>,
    pub standings: Vec<Standing>,
    pub events: Vec<Event>,
    pub notifications: Vec<Notification>,
    pub paused: bool,
    pub race_finished: bool,
    /// Most recent strategy-agent failure, scoped to one team.
    pub agent_error: Option<String>,
}

/// Control messages flowing back from the UI into the engine.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// A raw instruction line for the command protocol.
    CommandLine(String),
    TogglePause,
    Quit,
}

/// build_snapshot collects the current race state for the UI collaborator.
pub fn build_snapshot(
    race: &Race,
    notifications: &[Notification],
    agent_error: Option<&str>,
) -> anyhow::Result<RaceSnapshot> {
    let mut vehicle_states = Vec::with_capacity(race.vehicles.len());

    for vehicle in race.vehicles.iter() {
        let tmp_color = vehicle
            .color
            .parse::<css_color_parser::Color>()
            .context("Could not parse hex color!")?;

        vehicle_states.push(VehicleState {
            name: vehicle.name.to_owned(),
            team: vehicle.team.to_owned(),
            color: RgbColor {
                r: tmp_color.r,
                g: tmp_color.g,
                b: tmp_color.b,
            },
            race_prog: vehicle.laps as f64
                + race.track.normalize(vehicle.distance_traveled) / race.track.length,
            velocity: vehicle.current_speed,
            blocked: vehicle.blocked,
            in_pit_lane: vehicle.is_pitting(),
        });
    }

    Ok(RaceSnapshot {
        race_time: race.cur_racetime,
        vehicle_states,
        standings: compute_standings(&race.vehicles, &race.track),
        events: race.events.all().to_vec(),
        notifications: notifications.to_vec(),
        paused: race.paused,
        race_finished: race.race_finished,
        agent_error: agent_error.map(|e| e.to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::race::RacePars;
    use crate::core::track::TrackPars;
    use crate::core::vehicle::{ControlMode, TeamPars};

    #[test]
    fn snapshot_parses_team_colors() {
        let team = TeamPars {
            name: "Papaya Team".to_owned(),
            color: "#FF8000".to_owned(),
            drivers: vec!["NOR".to_owned()],
            control: ControlMode::Player,
            provider: "openrouter".to_owned(),
            model: "test-model".to_owned(),
        };
        let race = Race::new(&RacePars::default(), &TrackPars::default(), &[team]);
        let snapshot = build_snapshot(&race, &[], None).unwrap();
        assert_eq!(snapshot.vehicle_states[0].color.r, 255);
        assert_eq!(snapshot.vehicle_states[0].color.g, 128);
        assert_eq!(snapshot.vehicle_states[0].color.b, 0);
        assert_eq!(snapshot.standings.len(), 1);
    }

    #[test]
    fn snapshot_rejects_invalid_colors() {
        let team = TeamPars {
            name: "Bad Team".to_owned(),
            color: "not-a-color".to_owned(),
            drivers: vec!["XXX".to_owned()],
            control: ControlMode::Player,
            provider: "openrouter".to_owned(),
            model: "test-model".to_owned(),
        };
        let race = Race::new(&RacePars::default(), &TrackPars::default(), &[team]);
        assert!(build_snapshot(&race, &[], None).is_err());
    }
}
