use crate::core::race::RacePars;
use crate::core::track::TrackPars;
use crate::core::vehicle::{ControlMode, TeamPars};
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// * `free_mode` - Route all agent traffic through the keyless free-tier proxy
/// * `openrouter_api_key` / `openai_api_key` - Provider credentials; the
/// OPENROUTER_API_KEY / OPENAI_API_KEY environment variables take precedence
/// * `free_proxy_url` - Endpoint of the free-tier forwarding proxy
/// * `max_tokens` - Token budget per agent reply
#[derive(Debug, Deserialize, Clone)]
pub struct AgentPars {
    #[serde(default)]
    pub free_mode: bool,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_free_proxy_url")]
    pub free_proxy_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_free_proxy_url() -> String {
    "https://race-strategy-proxy.vercel.app/api/freeTierModel".to_owned()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for AgentPars {
    fn default() -> AgentPars {
        AgentPars {
            free_mode: true,
            openrouter_api_key: None,
            openai_api_key: None,
            free_proxy_url: default_free_proxy_url(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Clone)]
pub struct SimPars {
    pub race_pars: RacePars,
    pub track_pars: TrackPars,
    pub team_pars_all: Vec<TeamPars>,
    #[serde(default)]
    pub agent_pars: AgentPars,
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the
/// simulation parameters struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}

impl SimPars {
    /// default_grid returns the built-in 5-team, 10-driver race used when no
    /// parameter file is supplied. All teams run under agent control.
    pub fn default_grid() -> SimPars {
        let teams = [
            ("Britania Racing", "#00a0de", ["SAI", "ALB"]),
            ("Scuderia Rosa", "#F70D1A", ["LEC", "HAM"]),
            ("Silver Spears", "#787d80", ["RUS", "ANT"]),
            ("Papaya Team", "#FF8000", ["NOR", "PIA"]),
            ("Emerald Racing", "#229971", ["ALO", "STR"]),
        ];

        SimPars {
            race_pars: RacePars::default(),
            track_pars: TrackPars::default(),
            team_pars_all: teams
                .iter()
                .map(|(name, color, drivers)| TeamPars {
                    name: (*name).to_owned(),
                    color: (*color).to_owned(),
                    drivers: drivers.iter().map(|d| (*d).to_owned()).collect(),
                    control: ControlMode::Ai,
                    provider: "openrouter".to_owned(),
                    model: "google/gemini-2.0-flash-001".to_owned(),
                })
                .collect(),
            agent_pars: AgentPars::default(),
        }
    }
}
