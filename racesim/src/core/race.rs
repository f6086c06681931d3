use crate::core::command::{parse_command_line, Command, CommandKind};
use crate::core::event::{EventKind, EventLog};
use crate::core::pit::PitPhase;
use crate::core::ranking::compute_standings;
use crate::core::tires::{Compound, Tireset};
use crate::core::track::{Track, TrackPars};
use crate::core::traffic::{TrafficState, FOLLOWING_PENALTY, FOLLOWING_THRESHOLD};
use crate::core::vehicle::{ControlMode, TeamPars, Vehicle, COOLDOWN_SPEED};
use helpers::general::{argsort, SortOrder};
use serde::Deserialize;

/// * `tot_no_laps` - Number of laps the race runs over
#[derive(Debug, Deserialize, Clone)]
pub struct RacePars {
    pub tot_no_laps: u32,
}

impl Default for RacePars {
    fn default() -> RacePars {
        RacePars { tot_no_laps: 12 }
    }
}

/// Simulated seconds between the last car taking the flag and the automatic
/// pause for the final classification.
const FINISH_GRACE_PERIOD: f64 = 5.0;

/// Pre-move view of one car, used for neighbor lookups while the field is
/// being mutated.
#[derive(Debug)]
struct FieldSlot {
    name: String,
    laps: u32,
    normalized: f64,
    in_pit_lane: bool,
}

#[derive(Debug)]
pub struct Race {
    pub track: Track,
    pub vehicles: Vec<Vehicle>,
    pub cur_racetime: f64,
    pub tot_no_laps: u32,
    /// Shared gate checked before every step and command application.
    pub paused: bool,
    pub race_finished: bool,
    finish_time: Option<f64>,
    classification_paused: bool,
    pub events: EventLog,
    traffic: TrafficState,
    prev_ranking: Vec<String>,
}

impl Race {
    pub fn new(race_pars: &RacePars, track_pars: &TrackPars, team_pars_all: &[TeamPars]) -> Race {
        // create vehicles team by team; agent-run teams pick their starting
        // compound before the start, player teams launch on mediums
        let mut vehicles: Vec<Vehicle> = Vec::new();
        for team_pars in team_pars_all.iter() {
            for driver in team_pars.drivers.iter() {
                let compound = match team_pars.control {
                    ControlMode::Player => Compound::Medium,
                    ControlMode::Ai => Compound::Unset,
                };
                vehicles.push(Vehicle::new(driver, team_pars, vehicles.len(), compound));
            }
        }

        Race {
            track: Track::new(track_pars),
            vehicles,
            cur_racetime: 0.0,
            tot_no_laps: race_pars.tot_no_laps,
            paused: false,
            race_finished: false,
            finish_time: None,
            classification_paused: false,
            events: EventLog::new(),
            traffic: TrafficState::new(),
            prev_ranking: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_timestep advances the whole race by one timestep.
    pub fn simulate_timestep(&mut self, delta_s: f64) {
        if delta_s <= 0.0 {
            return;
        }

        // increment discretization variable
        self.cur_racetime += delta_s;

        // update all vehicles against the pre-move field order
        self.update_vehicles(delta_s);

        // race completion, disqualifications, overtakes
        self.check_race_completion();
        self.update_ranking_events();
        self.check_final_classification();
    }

    // ---------------------------------------------------------------------------------------------
    // RACE SIMULATOR PARTS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_vehicles(&mut self, delta_s: f64) {
        // pre-move field order by cumulative distance, leaders first; a car
        // with a degenerate position sorts last instead of poisoning the sort
        let distances: Vec<f64> = self
            .vehicles
            .iter()
            .map(|v| {
                if v.distance_traveled.is_finite() {
                    v.distance_traveled
                } else {
                    f64::NEG_INFINITY
                }
            })
            .collect();
        let order = argsort(&distances, SortOrder::Descending);

        let field: Vec<FieldSlot> = order
            .iter()
            .map(|&vi| {
                let vehicle = &self.vehicles[vi];
                FieldSlot {
                    name: vehicle.name.to_owned(),
                    laps: vehicle.laps,
                    normalized: self.track.normalize(vehicle.distance_traveled),
                    in_pit_lane: vehicle.is_pitting(),
                }
            })
            .collect();

        let Race {
            vehicles,
            events,
            traffic,
            track,
            cur_racetime,
            tot_no_laps,
            ..
        } = self;

        for (field_pos, &vi) in order.iter().enumerate() {
            step_vehicle(
                &mut vehicles[vi],
                field_pos,
                &field,
                track,
                *cur_racetime,
                *tot_no_laps,
                delta_s,
                events,
                traffic,
            );
        }
    }

    fn check_race_completion(&mut self) {
        if self.race_finished || !self.get_all_finished() {
            return;
        }

        self.race_finished = true;
        self.finish_time = Some(self.cur_racetime);

        let Race {
            vehicles,
            events,
            cur_racetime,
            ..
        } = self;

        events.add(
            *cur_racetime,
            EventKind::Race,
            "All drivers have finished the race!",
        );

        // two-compound rule
        for vehicle in vehicles.iter_mut() {
            if vehicle.distinct_compounds() < 2 {
                vehicle.disqualified = true;
                events.add(
                    *cur_racetime,
                    EventKind::Race,
                    &format!(
                        "{} disqualified - did not use at least two different tire compounds",
                        vehicle.name
                    ),
                );
            }
        }
    }

    /// update_ranking_events compares the standings with the previous tick and
    /// reports position gains.
    fn update_ranking_events(&mut self) {
        let standings = compute_standings(&self.vehicles, &self.track);

        if !self.prev_ranking.is_empty() {
            for (new_pos, row) in standings.iter().enumerate() {
                let old_pos = self.prev_ranking.iter().position(|name| name == &row.name);
                if let Some(old_pos) = old_pos {
                    if new_pos < old_pos {
                        let overtaken = self.prev_ranking[new_pos].to_owned();
                        self.events.add(
                            self.cur_racetime,
                            EventKind::Overtake,
                            &format!("{} overtook {} for P{}", row.name, overtaken, new_pos + 1),
                        );
                    }
                }
            }
        }

        self.prev_ranking = standings.iter().map(|s| s.name.to_owned()).collect();
    }

    fn check_final_classification(&mut self) {
        if self.classification_paused {
            return;
        }
        if let Some(finish_time) = self.finish_time {
            if self.cur_racetime >= finish_time + FINISH_GRACE_PERIOD {
                self.classification_paused = true;
                self.paused = true;
                self.events.add(
                    self.cur_racetime,
                    EventKind::Race,
                    "Race paused - final classification displayed",
                );
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // COMMAND APPLICATION -------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// apply_command_line parses and applies one instruction line. When a
    /// source team is given, drivers outside its roster are refused. Malformed
    /// fragments are dropped silently.
    pub fn apply_command_line(&mut self, line: &str, source_team: Option<&str>) {
        let outcome = parse_command_line(line);
        for command in outcome.commands.iter() {
            self.apply_command(command, source_team);
        }
    }

    /// apply_command mutates the addressed vehicles. The team roster check is
    /// the sole authorization gate in the system.
    pub fn apply_command(&mut self, command: &Command, source_team: Option<&str>) {
        if let Some(team) = source_team {
            let authorized = self
                .vehicles
                .iter()
                .any(|v| v.team == team && v.name.eq_ignore_ascii_case(&command.driver));
            if !authorized {
                self.events.add(
                    self.cur_racetime,
                    EventKind::Command,
                    &format!(
                        "Ignored command for {} - driver does not belong to {}",
                        command.driver.to_uppercase(),
                        team
                    ),
                );
                return;
            }
        }

        let Race {
            vehicles,
            events,
            track,
            cur_racetime,
            ..
        } = self;

        for vehicle in vehicles.iter_mut() {
            if !vehicle.matches_token(&command.driver) {
                continue;
            }

            match command.kind {
                CommandKind::SetStyle(style) => {
                    vehicle.set_style(style, *cur_racetime);
                }
                CommandKind::CallPit(compound) => {
                    if vehicle.pit.in_pit_lane() {
                        events.add(
                            *cur_racetime,
                            EventKind::Pit,
                            &format!("{} cannot change pit plan - already in pit lane", vehicle.name),
                        );
                        continue;
                    }
                    let normalized = track.normalize(vehicle.distance_traveled);
                    vehicle.pit.call(compound, vehicle.laps, normalized, track);
                }
                CommandKind::CancelPit => {
                    if vehicle.pit.in_pit_lane() {
                        events.add(
                            *cur_racetime,
                            EventKind::Pit,
                            &format!("{} cannot cancel pit stop - already in pit lane", vehicle.name),
                        );
                    } else if vehicle.pit.cancel() {
                        events.add(
                            *cur_racetime,
                            EventKind::Pit,
                            &format!("{} pit stop cancelled", vehicle.name),
                        );
                    }
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn get_all_finished(&self) -> bool {
        !self.vehicles.is_empty() && self.vehicles.iter().all(|v| v.finished)
    }

    /// classification_ready reports that the post-race grace period has passed
    /// and the simulation has parked itself for the final classification.
    pub fn classification_ready(&self) -> bool {
        self.classification_paused
    }

    /// assign_starting_tires fits a pre-race compound choice onto a driver.
    pub fn assign_starting_tires(&mut self, driver: &str, compound: Compound) -> bool {
        for vehicle in self.vehicles.iter_mut() {
            if vehicle.name.eq_ignore_ascii_case(driver) {
                vehicle.assign_starting_tires(compound);
                return true;
            }
        }
        false
    }
}

// -------------------------------------------------------------------------------------------------
// PER-VEHICLE STEP --------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// step_vehicle integrates one car over a timestep: style expiry, pit state
/// machine, dirty air, motion, lap crossing and tire wear. A degenerate
/// position on one car never aborts the tick for the others.
#[allow(clippy::too_many_arguments)]
fn step_vehicle(
    vehicle: &mut Vehicle,
    field_pos: usize,
    field: &[FieldSlot],
    track: &Track,
    race_time: f64,
    tot_no_laps: u32,
    delta_s: f64,
    events: &mut EventLog,
    traffic: &mut TrafficState,
) {
    if !vehicle.distance_traveled.is_finite() {
        events.add(
            race_time,
            EventKind::Race,
            &format!("{} position invalid - update skipped", vehicle.name),
        );
        return;
    }

    vehicle.expire_style(race_time);

    let normalized = track.normalize(vehicle.distance_traveled);

    let style = vehicle.driving_style;
    let base_speed = vehicle.tires.compound.base_speed() + style.speed_modifier();
    let wear_rate = vehicle.tires.compound.base_degradation() + style.wear_modifier();
    let effective_speed = vehicle.tires.effective_speed(base_speed);

    let mut current_speed = effective_speed;
    vehicle.blocked = false;

    if vehicle.pit.active() {
        // stop scheduled or underway: entry -> swap -> exit
        traffic.reset(&vehicle.name);

        if vehicle.pit.check_entry(normalized, vehicle.laps, track) {
            events.add(
                race_time,
                EventKind::Pit,
                &format!("{} entered pit lane", vehicle.name),
            );
        }

        if vehicle.pit.phase == PitPhase::PitEntry {
            current_speed = track.pitlane_speed;
            if let Some(compound) = vehicle.pit.take_swap(normalized) {
                vehicle.tires = Tireset::new(compound);
                vehicle.tire_history.push(compound);
                events.add(
                    race_time,
                    EventKind::Pit,
                    &format!("{} changed tires to {}", vehicle.name, compound.letter()),
                );
            }
        }

        if vehicle.pit.phase == PitPhase::PitExit {
            current_speed = track.pitlane_speed;
            let projected = track.normalize(vehicle.distance_traveled + current_speed * delta_s);
            if vehicle.pit.check_exit(projected, track) {
                events.add(
                    race_time,
                    EventKind::Pit,
                    &format!("{} exited pit lane in P{}", vehicle.name, field_pos + 1),
                );
            }
        }
    } else {
        // dirty air behind the nearest car ahead that is not in the pit lane
        let ahead = field[..field_pos].iter().rev().find(|slot| !slot.in_pit_lane);

        if let Some(ahead) = ahead {
            let total_current = vehicle.laps as f64 * track.length + normalized;
            let total_ahead = ahead.laps as f64 * track.length + ahead.normalized;
            let mut gap = total_ahead - total_current;
            if gap < 0.0 {
                gap += track.length;
            }

            if gap < FOLLOWING_THRESHOLD {
                current_speed = effective_speed - FOLLOWING_PENALTY;
                vehicle.blocked = true;
            }

            // independent of the pace penalty above
            if let Some(stuck_s) = traffic.observe_gap(
                &vehicle.name,
                &ahead.name,
                gap,
                race_time,
                vehicle.laps,
                ahead.in_pit_lane,
            ) {
                events.add(
                    race_time,
                    EventKind::Stuck,
                    &format!(
                        "{} stuck behind {} for {} seconds",
                        vehicle.name, ahead.name, stuck_s
                    ),
                );
            }
        } else {
            traffic.reset(&vehicle.name);
        }
    }

    // after the flag everyone cruises at a fixed pace
    let final_speed = if vehicle.finished {
        COOLDOWN_SPEED
    } else {
        current_speed
    };
    vehicle.current_speed = final_speed;

    // integrate position
    let new_distance = vehicle.distance_traveled + final_speed * delta_s;
    let new_normalized = track.normalize(new_distance);
    let crossed_line = normalized > new_normalized;
    vehicle.distance_traveled = new_distance;

    if crossed_line {
        if vehicle.laps > 0 {
            vehicle.last_lap_time = Some(race_time - vehicle.last_lap_start);
        }
        vehicle.laps += 1;
        vehicle.last_lap_start = race_time;

        if vehicle.laps >= tot_no_laps + 1 && !vehicle.finished {
            vehicle.finished = true;
            events.add(
                race_time,
                EventKind::Race,
                &format!("{} finished the race!", vehicle.name),
            );
        }
    }

    // tire wear; a fresh set fitted at the stop stays untouched until rejoin
    if !(vehicle.pit.tire_changed && vehicle.pit.phase == PitPhase::PitExit) {
        vehicle.tires.wear(wear_rate, delta_s);
    }
}
