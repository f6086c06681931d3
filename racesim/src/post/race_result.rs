use std::fmt::Write;

use crate::core::race::Race;
use crate::core::ranking::compute_standings;
use crate::core::tires::Compound;
use serde::Serialize;

/// One row of the final classification.
#[derive(Debug, Serialize, Clone)]
pub struct ClassificationRow {
    pub position: usize,
    pub name: String,
    pub team: String,
    pub laps: u32,
    pub last_lap_time: Option<f64>,
    pub tire_history: Vec<Compound>,
    pub disqualified: bool,
}

/// RaceResult contains all race information that is required for
/// post-processing the results.
#[derive(Debug, Serialize, Clone)]
pub struct RaceResult {
    pub tot_no_laps: u32,
    pub race_time: f64,
    pub classification: Vec<ClassificationRow>,
}

impl RaceResult {
    /// from_race snapshots the final standings. Disqualified cars keep their
    /// track position but are flagged.
    pub fn from_race(race: &Race) -> RaceResult {
        let standings = compute_standings(&race.vehicles, &race.track);

        RaceResult {
            tot_no_laps: race.tot_no_laps,
            race_time: race.cur_racetime,
            classification: standings
                .iter()
                .map(|standing| {
                    let disqualified = race
                        .vehicles
                        .iter()
                        .find(|v| v.name == standing.name)
                        .map_or(false, |v| v.disqualified);
                    ClassificationRow {
                        position: standing.position,
                        name: standing.name.to_owned(),
                        team: standing.team.to_owned(),
                        laps: standing.laps,
                        last_lap_time: standing.last_lap_time,
                        tire_history: standing.tire_history.to_owned(),
                        disqualified,
                    }
                })
                .collect(),
        }
    }

    /// print_classification prints the final classification to the console
    /// output.
    pub fn print_classification(&self) {
        let mut tmp_string = String::new();

        for row in self.classification.iter() {
            let history: Vec<&str> = row.tire_history.iter().map(|c| c.letter()).collect();
            let last_lap = match row.last_lap_time {
                Some(t) => format!("{:6.2}s", t),
                None => "   -   ".to_owned(),
            };
            writeln!(
                &mut tmp_string,
                "P{:<2} {:4} {:18} laps: {:2}, last lap: {}, tires: {}{}",
                row.position,
                row.name,
                row.team,
                row.laps.saturating_sub(1).min(self.tot_no_laps),
                last_lap,
                history.join("-"),
                if row.disqualified { "  [DSQ]" } else { "" },
            )
            .unwrap();
        }

        println!("RESULT: Final classification after {} laps", self.tot_no_laps);
        println!("{}", tmp_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::race::RacePars;
    use crate::core::track::TrackPars;
    use crate::core::vehicle::{ControlMode, TeamPars};

    #[test]
    fn result_carries_disqualifications() {
        let team = TeamPars {
            name: "Emerald Racing".to_owned(),
            color: "#229971".to_owned(),
            drivers: vec!["ALO".to_owned(), "STR".to_owned()],
            control: ControlMode::Player,
            provider: "openrouter".to_owned(),
            model: "test-model".to_owned(),
        };
        let mut race = Race::new(&RacePars { tot_no_laps: 1 }, &TrackPars::default(), &[team]);
        race.vehicles[0].disqualified = true;

        let result = RaceResult::from_race(&race);
        assert_eq!(result.classification.len(), 2);
        let alo = result
            .classification
            .iter()
            .find(|r| r.name == "ALO")
            .unwrap();
        assert!(alo.disqualified);
    }
}
