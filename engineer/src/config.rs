//! Provider routing for agent queries.
//!
//! The engine treats provider and model identifiers as opaque strings; this
//! module is where they gain meaning. Paid providers need a caller-supplied
//! API key; the free tier routes through a forwarding proxy that holds its
//! own key and only serves an allow-list of models.

use crate::error::EngineerError;
use racesim::core::vehicle::{ControlMode, TeamPars};
use racesim::pre::read_sim_pars::AgentPars;

/// Models servable through the keyless free-tier proxy.
pub const FREE_TIER_MODELS: [&str; 3] = [
    "google/gemini-2.0-flash-001",
    "openai/gpt-4o-mini",
    "meta-llama/llama-3.3-70b-instruct",
];

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

pub fn is_free_tier_model(model: &str) -> bool {
    FREE_TIER_MODELS.contains(&model)
}

/// One AI-controlled team as the orchestrator sees it.
#[derive(Debug, Clone)]
pub struct TeamAgentConfig {
    pub team: String,
    pub drivers: Vec<String>,
    pub provider: String,
    pub model: String,
}

impl TeamAgentConfig {
    /// from_team_pars picks the agent-controlled teams out of the grid.
    pub fn from_team_pars(team_pars_all: &[TeamPars]) -> Vec<TeamAgentConfig> {
        team_pars_all
            .iter()
            .filter(|t| t.control == ControlMode::Ai)
            .map(|t| TeamAgentConfig {
                team: t.name.to_owned(),
                drivers: t.drivers.to_owned(),
                provider: t.provider.to_owned(),
                model: t.model.to_owned(),
            })
            .collect()
    }
}

/// Resolved endpoint and credential for one query.
#[derive(Debug, Clone)]
pub struct RequestRoute {
    pub url: String,
    /// None for the free-tier proxy, which needs no caller credential.
    pub api_key: Option<String>,
}

/// AgentSettings holds credentials and the free-tier switch.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub free_mode: bool,
    pub openrouter_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub free_proxy_url: String,
    pub max_tokens: u32,
}

impl AgentSettings {
    /// from_pars resolves credentials, letting environment variables override
    /// the parameter file.
    pub fn from_pars(agent_pars: &AgentPars) -> AgentSettings {
        AgentSettings {
            free_mode: agent_pars.free_mode,
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY")
                .ok()
                .or_else(|| agent_pars.openrouter_api_key.to_owned()),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .or_else(|| agent_pars.openai_api_key.to_owned()),
            free_proxy_url: agent_pars.free_proxy_url.to_owned(),
            max_tokens: agent_pars.max_tokens,
        }
    }

    /// route_for picks endpoint and credential for a team's model. Free-tier
    /// models go through the proxy without a caller key; everything else
    /// requires the provider's API key.
    pub fn route_for(&self, team: &TeamAgentConfig) -> Result<RequestRoute, EngineerError> {
        if self.free_mode || is_free_tier_model(&team.model) {
            if !is_free_tier_model(&team.model) {
                return Err(EngineerError::ModelNotAllowed(team.model.to_owned()));
            }
            return Ok(RequestRoute {
                url: self.free_proxy_url.to_owned(),
                api_key: None,
            });
        }

        match team.provider.as_str() {
            "openrouter" => self
                .openrouter_api_key
                .as_ref()
                .map(|key| RequestRoute {
                    url: OPENROUTER_URL.to_owned(),
                    api_key: Some(key.to_owned()),
                })
                .ok_or_else(|| EngineerError::MissingKey("openrouter".to_owned())),
            "openai" => self
                .openai_api_key
                .as_ref()
                .map(|key| RequestRoute {
                    url: OPENAI_URL.to_owned(),
                    api_key: Some(key.to_owned()),
                })
                .ok_or_else(|| EngineerError::MissingKey("openai".to_owned())),
            other => Err(EngineerError::UnsupportedProvider(other.to_owned())),
        }
    }
}
