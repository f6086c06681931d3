use crate::core::pit::{PitPhase, PitState};
use crate::core::tires::{Compound, DrivingStyle, Tireset};
use serde::Deserialize;
use std::collections::HashSet;

/// Speed (units/s) of a car cruising to parc ferme after taking the flag.
pub const COOLDOWN_SPEED: f64 = 12.0;

/// Seconds a push or conserve instruction stays active before the driver
/// settles back to the normal pace.
pub const STYLE_DURATION: f64 = 30.0;

// Grid spacing: slot 0 starts 25 units short of the line, every further slot
// another 20 units back.
const GRID_BASE_OFFSET: f64 = -25.0;
const GRID_SLOT_SPACING: f64 = 20.0;

/// Who runs a team's pit wall.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    Player,
    Ai,
}

/// * `name` - Team display name
/// * `color` - Team display color as a css hex string, e.g. #FF8000
/// * `drivers` - Driver codes racing for the team, e.g. ["NOR", "PIA"]
/// * `control` - Whether a human or a strategy agent runs the pit wall
/// * `provider` - Inference provider routing key (opaque to the engine)
/// * `model` - Model identifier sent to the provider (opaque to the engine)
#[derive(Debug, Deserialize, Clone)]
pub struct TeamPars {
    pub name: String,
    pub color: String,
    pub drivers: Vec<String>,
    pub control: ControlMode,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_provider() -> String {
    "openrouter".to_owned()
}

fn default_model() -> String {
    "google/gemini-2.0-flash-001".to_owned()
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub name: String,
    pub team: String,
    pub color: String,
    /// Cumulative distance since the start signal; negative on the grid.
    pub distance_traveled: f64,
    pub laps: u32,
    pub tires: Tireset,
    /// Every compound the car has raced on, in fitting order.
    pub tire_history: Vec<Compound>,
    pub driving_style: DrivingStyle,
    pub style_until: Option<f64>,
    pub pit: PitState,
    pub finished: bool,
    pub disqualified: bool,
    pub last_lap_time: Option<f64>,
    pub last_lap_start: f64,
    pub current_speed: f64,
    pub blocked: bool,
}

impl Vehicle {
    pub fn new(name: &str, team_pars: &TeamPars, grid_slot: usize, compound: Compound) -> Vehicle {
        let tire_history = if compound == Compound::Unset {
            Vec::new()
        } else {
            vec![compound]
        };

        Vehicle {
            name: name.to_owned(),
            team: team_pars.name.to_owned(),
            color: team_pars.color.to_owned(),
            distance_traveled: GRID_BASE_OFFSET - GRID_SLOT_SPACING * grid_slot as f64,
            laps: 0,
            tires: Tireset::new(compound),
            tire_history,
            driving_style: DrivingStyle::Normal,
            style_until: None,
            pit: PitState::new(),
            finished: false,
            disqualified: false,
            last_lap_time: None,
            last_lap_start: 0.0,
            current_speed: 0.0,
            blocked: false,
        }
    }

    /// expire_style reverts to the normal pace once the instruction runs out.
    pub fn expire_style(&mut self, race_time: f64) {
        if let Some(until) = self.style_until {
            if race_time >= until {
                self.driving_style = DrivingStyle::Normal;
                self.style_until = None;
            }
        }
    }

    /// set_style applies a pace instruction; push and conserve run on a timer.
    pub fn set_style(&mut self, style: DrivingStyle, race_time: f64) {
        self.driving_style = style;
        self.style_until = if style == DrivingStyle::Normal {
            None
        } else {
            Some(race_time + STYLE_DURATION)
        };
    }

    /// assign_starting_tires fits the compound chosen before the start and
    /// restarts the compound history with it.
    pub fn assign_starting_tires(&mut self, compound: Compound) {
        self.tires = Tireset::new(compound);
        self.tire_history = vec![compound];
    }

    /// matches_token is the case-insensitive prefix match used by the command
    /// protocol to address drivers.
    pub fn matches_token(&self, token: &str) -> bool {
        !token.is_empty() && self.name.to_lowercase().starts_with(&token.to_lowercase())
    }

    /// is_pitting reports whether the car is physically in the pit lane.
    pub fn is_pitting(&self) -> bool {
        self.pit.in_pit_lane()
    }

    /// distinct_compounds counts the different mixtures raced so far; fewer
    /// than two at the flag means disqualification.
    pub fn distinct_compounds(&self) -> usize {
        self.tire_history.iter().collect::<HashSet<_>>().len()
    }

    /// status_label mirrors the scoreboard wording for the current state.
    pub fn status_label(&self) -> &'static str {
        if self.disqualified {
            return "DSQ";
        }
        match self.pit.phase {
            PitPhase::BoxCalled => "Box Called",
            PitPhase::PitEntry => "Pit Entry",
            PitPhase::PitExit => "Pit Exit",
            PitPhase::Racing => {
                if self.finished {
                    "Finished"
                } else {
                    "Racing"
                }
            }
        }
    }
}
