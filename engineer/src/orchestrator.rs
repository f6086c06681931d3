//! Query orchestration for the strategy agents.
//!
//! One round per lap: when the leader crosses the trigger mark the simulation
//! pauses, every AI team's agent is queried concurrently, and the race only
//! resumes once all outstanding queries have resolved - success or failure -
//! and a minimum display time has passed. Replies are folded back into typed
//! commands that apply on the next unpaused tick, never mid-round.

use crate::config::{AgentSettings, RequestRoute, TeamAgentConfig};
use crate::context::{self, StrategyContext};
use crate::error::EngineerError;
use crate::inference::{ChatMessage, InferenceClient};
use crate::parse;
use racesim::core::race::Race;
use racesim::core::ranking::{compute_standings, leader_index};
use racesim::core::tires::Compound;
use racesim::interfaces::ui_interface::Notification;
use std::collections::HashMap;
use std::time::Instant;

/// Fraction of the lap at which the leader triggers a strategy round.
const TRIGGER_LAP_FRACTION: f64 = 0.75;

/// Minimum wall-clock seconds the field stays paused once a round is out, so
/// near-instant replies do not flash the pause away.
const MIN_ROUND_PAUSE: f64 = 1.0;

/// A command extracted from a reply, waiting for the next unpaused tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    pub team: String,
    pub line: String,
}

/// What a query was dispatched for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryPurpose {
    TireSelection,
    Strategy,
}

/// One fully prepared query, ready for the HTTP client.
#[derive(Debug)]
pub struct QueryJob {
    pub team: String,
    pub model: String,
    pub route: RequestRoute,
    pub messages: Vec<ChatMessage>,
    pub purpose: QueryPurpose,
    system: String,
    user_payload: String,
    race_time: f64,
}

/// A resolved query, successful or not, on its way back to the tick loop.
#[derive(Debug)]
struct RoundReply {
    team: String,
    model: String,
    purpose: QueryPurpose,
    system: String,
    user_payload: String,
    race_time: f64,
    result: Result<String, EngineerError>,
}

pub struct Orchestrator {
    teams: Vec<TeamAgentConfig>,
    settings: AgentSettings,
    client: InferenceClient,
    contexts: HashMap<String, StrategyContext>,
    notifications: Vec<Notification>,
    pending: Vec<PendingCommand>,
    team_last_event_time: HashMap<String, f64>,
    last_trigger_lap: u32,
    outstanding: usize,
    round_started: Option<Instant>,
    last_error: Option<String>,
    reply_tx: flume::Sender<RoundReply>,
    reply_rx: flume::Receiver<RoundReply>,
}

impl Orchestrator {
    pub fn new(teams: Vec<TeamAgentConfig>, settings: AgentSettings) -> Orchestrator {
        let (reply_tx, reply_rx) = flume::unbounded();
        Orchestrator {
            teams,
            settings,
            client: InferenceClient::new(),
            contexts: HashMap::new(),
            notifications: Vec::new(),
            pending: Vec::new(),
            team_last_event_time: HashMap::new(),
            last_trigger_lap: 0,
            outstanding: 0,
            round_started: None,
            last_error: None,
            reply_tx,
            reply_rx,
        }
    }

    pub fn has_teams(&self) -> bool {
        !self.teams.is_empty()
    }

    /// notifications returns the completed replies, newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// last_error is the error channel: the most recent per-team failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// round_pending reports whether a dispatched round has not resolved yet.
    pub fn round_pending(&self) -> bool {
        self.round_started.is_some()
    }

    // ---------------------------------------------------------------------------------------------
    // TRIGGERING ----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// should_trigger fires once per lap when the race leader crosses the
    /// trigger mark; never while an earlier round is still out.
    pub fn should_trigger(&self, race: &Race) -> bool {
        if self.teams.is_empty() || self.round_pending() || race.race_finished {
            return false;
        }
        let leader_idx = match leader_index(&race.vehicles, &race.track) {
            Some(idx) => idx,
            None => return false,
        };
        let leader = &race.vehicles[leader_idx];
        let normalized = race.track.normalize(leader.distance_traveled);

        normalized >= TRIGGER_LAP_FRACTION * race.track.length
            && leader.laps > self.last_trigger_lap
    }

    /// prepare_strategy_round pauses the race, marks the trigger lap and
    /// builds one query per AI team. Pure bookkeeping, no I/O - the async
    /// dispatch wrapper hands the jobs to the HTTP client.
    pub fn prepare_strategy_round(&mut self, race: &mut Race) -> Vec<QueryJob> {
        let leader_laps = leader_index(&race.vehicles, &race.track)
            .map(|idx| race.vehicles[idx].laps)
            .unwrap_or(0);
        self.last_trigger_lap = leader_laps;

        race.paused = true;
        self.round_started = Some(Instant::now());
        self.last_error = None;

        let standings = compute_standings(&race.vehicles, &race.track);
        let mut jobs = Vec::new();

        for team in self.teams.iter() {
            let system = context::team_system_prompt(&team.team, &team.drivers);
            let last_seen = self
                .team_last_event_time
                .get(&team.team)
                .copied()
                .unwrap_or(0.0);
            let new_events = race.events.since(last_seen);
            let user_payload = context::build_race_payload(
                &team.team,
                &team.drivers,
                &standings,
                &new_events,
                race.cur_racetime,
                race.tot_no_laps,
                race.track.pit_time_penalty(),
            );
            let messages = self
                .contexts
                .entry(team.team.to_owned())
                .or_insert_with(StrategyContext::new)
                .build_messages(&system, &user_payload);

            match self.settings.route_for(team) {
                Ok(route) => jobs.push(QueryJob {
                    team: team.team.to_owned(),
                    model: team.model.to_owned(),
                    route,
                    messages,
                    purpose: QueryPurpose::Strategy,
                    system,
                    user_payload,
                    race_time: race.cur_racetime,
                }),
                Err(err) => {
                    // this team sits the round out; the others proceed
                    self.last_error = Some(format!("{}: {}", team.team, err));
                    tracing::warn!(team = %team.team, error = %err, "skipping strategy query");
                }
            }
        }

        self.outstanding = jobs.len();
        jobs
    }

    /// prepare_tire_selection builds the one-off pre-race compound queries and
    /// pauses the race until they resolve.
    pub fn prepare_tire_selection(&mut self, race: &mut Race) -> Vec<QueryJob> {
        if self.teams.is_empty() {
            return Vec::new();
        }

        race.paused = true;
        self.round_started = Some(Instant::now());
        self.last_error = None;

        let grid: Vec<(String, usize)> = race
            .vehicles
            .iter()
            .enumerate()
            .map(|(slot, vehicle)| (vehicle.name.to_owned(), slot + 1))
            .collect();

        let mut jobs = Vec::new();
        for team in self.teams.iter() {
            let system = context::tire_selection_prompt(&team.team, &team.drivers, &grid);
            match self.settings.route_for(team) {
                Ok(route) => jobs.push(QueryJob {
                    team: team.team.to_owned(),
                    model: team.model.to_owned(),
                    route,
                    messages: vec![ChatMessage::system(&system)],
                    purpose: QueryPurpose::TireSelection,
                    system,
                    user_payload: String::new(),
                    race_time: race.cur_racetime,
                }),
                Err(err) => {
                    self.last_error = Some(format!("{}: {}", team.team, err));
                    tracing::warn!(team = %team.team, error = %err, "skipping tire selection query");
                }
            }
        }

        self.outstanding = jobs.len();
        jobs
    }

    // ---------------------------------------------------------------------------------------------
    // DISPATCH / FAN-IN ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// dispatch_strategy_round spawns the round's queries on the runtime.
    pub fn dispatch_strategy_round(&mut self, race: &mut Race) {
        let jobs = self.prepare_strategy_round(race);
        self.spawn_jobs(jobs);
    }

    /// dispatch_tire_selection spawns the pre-race queries on the runtime.
    pub fn dispatch_tire_selection(&mut self, race: &mut Race) {
        let jobs = self.prepare_tire_selection(race);
        self.spawn_jobs(jobs);
    }

    fn spawn_jobs(&self, jobs: Vec<QueryJob>) {
        for job in jobs {
            let client = self.client.clone();
            let reply_tx = self.reply_tx.clone();
            let max_tokens = self.settings.max_tokens;
            tokio::spawn(async move {
                let result = client
                    .complete(&job.route, &job.model, &job.messages, max_tokens)
                    .await;
                // the tick loop may already be gone on shutdown
                let _ = reply_tx.send(RoundReply {
                    team: job.team,
                    model: job.model,
                    purpose: job.purpose,
                    system: job.system,
                    user_payload: job.user_payload,
                    race_time: job.race_time,
                    result,
                });
            });
        }
    }

    /// poll_replies folds completed replies into the race and resumes the
    /// simulation once the round is fully resolved.
    pub fn poll_replies(&mut self, race: &mut Race) {
        let replies: Vec<RoundReply> = self.reply_rx.try_iter().collect();
        for reply in replies {
            self.handle_reply(race, reply);
        }
        self.maybe_resume(race);
    }

    fn handle_reply(&mut self, race: &mut Race, reply: RoundReply) {
        self.outstanding = self.outstanding.saturating_sub(1);

        let content = match reply.result {
            Ok(content) => content,
            Err(err) => {
                // scoped to this team; the round still resolves
                self.last_error = Some(format!("{}: {}", reply.team, err));
                tracing::warn!(team = %reply.team, error = %err, "strategy query failed");
                return;
            }
        };

        let reply_team = &reply.team;
        let roster = self
            .teams
            .iter()
            .find(|t| t.team == *reply_team)
            .map(|t| t.drivers.to_owned())
            .unwrap_or_default();

        match reply.purpose {
            QueryPurpose::Strategy => {
                let extracted = parse::extract_commands(&content);
                if !extracted.rejected.is_empty() {
                    tracing::debug!(
                        team = %reply.team,
                        rejected = ?extracted.rejected,
                        "dropped unusable command fragments"
                    );
                }
                for line in extracted.commands {
                    let driver = line.split_whitespace().next().unwrap_or("");
                    if roster.iter().any(|d| d.eq_ignore_ascii_case(driver)) {
                        self.pending.push(PendingCommand {
                            team: reply.team.to_owned(),
                            line,
                        });
                    }
                }

                self.contexts
                    .entry(reply.team.to_owned())
                    .or_insert_with(StrategyContext::new)
                    .record_exchange(&reply.system, &reply.user_payload, &content);
                self.team_last_event_time
                    .insert(reply.team.to_owned(), reply.race_time);

                self.notifications.insert(
                    0,
                    Notification {
                        team: reply.team,
                        content,
                        race_time: reply.race_time,
                        model: reply.model,
                    },
                );
            }
            QueryPurpose::TireSelection => {
                for (driver, compound_name) in parse::extract_tire_choices(&content) {
                    if !roster.iter().any(|d| d.eq_ignore_ascii_case(&driver)) {
                        continue;
                    }
                    if let Some(compound) = Compound::parse(&compound_name) {
                        race.assign_starting_tires(&driver, compound);
                    }
                }
                self.contexts
                    .entry(reply.team.to_owned())
                    .or_insert_with(StrategyContext::new)
                    .record_exchange(&reply.system, "", &content);
            }
        }
    }

    /// maybe_resume lifts the pause once every dispatched query has resolved
    /// and the minimum display time has elapsed.
    fn maybe_resume(&mut self, race: &mut Race) {
        if let Some(round_started) = self.round_started {
            if self.outstanding == 0
                && round_started.elapsed().as_secs_f64() >= MIN_ROUND_PAUSE
            {
                self.round_started = None;
                race.paused = false;
            }
        }
    }

    /// take_pending_commands drains the queued agent commands. Called only on
    /// unpaused ticks, so one round's command set always applies whole.
    pub fn take_pending_commands(&mut self) -> Vec<PendingCommand> {
        std::mem::take(&mut self.pending)
    }
}
