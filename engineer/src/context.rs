//! Per-team rolling conversations and the race-state payloads sent to the
//! strategy agents.
//!
//! The payload text is an interface detail of the agents, not of the engine:
//! the engine only ever reads the replies back through the lenient command
//! scanner in `parse`.

use crate::inference::ChatMessage;
use helpers::general::format_race_time;
use racesim::core::event::Event;
use racesim::core::ranking::Standing;

/// Non-system turns kept when building a request.
const HISTORY_LIMIT: usize = 4;

/// StrategyContext is one team's rolling conversation with its agent. Owned
/// by the orchestrator, appended after every completed round-trip.
#[derive(Debug, Clone, Default)]
pub struct StrategyContext {
    messages: Vec<ChatMessage>,
}

impl StrategyContext {
    pub fn new() -> StrategyContext {
        StrategyContext {
            messages: Vec::new(),
        }
    }

    /// build_messages assembles a request conversation: a fresh system prompt,
    /// the most recent non-system turns, then the new user payload.
    pub fn build_messages(&self, system: &str, user_payload: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(system)];

        let history: Vec<&ChatMessage> = self
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .collect();
        let start = history.len().saturating_sub(HISTORY_LIMIT);
        for message in &history[start..] {
            messages.push((*message).clone());
        }

        messages.push(ChatMessage::user(user_payload));
        messages
    }

    /// record_exchange stores a completed round-trip, replacing any earlier
    /// system prompt with the current one.
    pub fn record_exchange(&mut self, system: &str, user_payload: &str, assistant_reply: &str) {
        self.messages.retain(|m| m.role != "system");
        self.messages.insert(0, ChatMessage::system(system));
        if !user_payload.is_empty() {
            self.messages.push(ChatMessage::user(user_payload));
        }
        self.messages.push(ChatMessage::assistant(assistant_reply));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// team_system_prompt frames the agent as the team's strategist and spells
/// out the command grammar its reply must use.
pub fn team_system_prompt(team: &str, drivers: &[String]) -> String {
    format!(
        "You are the chief race strategist of {team}. Your drivers are {drivers}. \
         You receive the live scoreboard once per lap and answer with your reasoning \
         followed by a final line starting with 'Actions:' that lists your instructions. \
         Valid instructions, one per driver, separated by semicolons: \
         '<driver> push', '<driver> normal', '<driver> conserve', \
         '<driver> pit soft', '<driver> pit medium', '<driver> pit hard', \
         '<driver> pit cancel', '<driver> nothing'. \
         Push and conserve wear off after 30 seconds. Every car must use at least \
         two different tire compounds before the end of the race or it is disqualified. \
         Commands in the Actions line are executed immediately, within the current lap.",
        team = team,
        drivers = drivers.join(" and "),
    )
}

/// tire_selection_prompt asks a team for starting compounds before the race.
pub fn tire_selection_prompt(team: &str, drivers: &[String], grid: &[(String, usize)]) -> String {
    let grid_text = grid
        .iter()
        .map(|(name, slot)| format!("P{}: {}", slot, name))
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        "You are the chief race strategist of {team}. Your drivers are {drivers}. \
         The race is about to start; this is the starting grid:\n{grid}\n\n\
         Choose the starting tire compound for each of your drivers. Soft is fastest \
         but wears quickly, hard is slowest but lasts, medium sits in between. \
         Every car must use at least two different compounds before the end of the \
         race. Reply with a short reasoning, then one line per driver of the form \
         '<driver> tire <soft|medium|hard>'.",
        team = team,
        drivers = drivers.join(" and "),
        grid = grid_text,
    )
}

/// build_race_payload renders the live race state for one team: scoreboard,
/// fresh events, and its own drivers' situation including pit projections.
pub fn build_race_payload(
    team: &str,
    drivers: &[String],
    standings: &[Standing],
    new_events: &[&Event],
    race_time: f64,
    tot_no_laps: u32,
    pit_penalty_s: f64,
) -> String {
    let scoreboard_text = standings
        .iter()
        .map(|row| {
            let interval = if row.position == 1 {
                "---".to_owned()
            } else {
                format!("+{:.2}", row.interval)
            };
            let last_lap = match row.last_lap_time {
                Some(t) => format!("{:.2}", t),
                None => "-".to_owned(),
            };
            let history: Vec<&str> = row.tire_history.iter().map(|c| c.letter()).collect();
            format!(
                "P{}: {}, tires: {}, cond: {}%, speed: {:.1}, interval: {}, laps: {}, \
                 lap dist: {}%, status: {}, tire history: {}, last lap: {}",
                row.position,
                row.name,
                row.compound.letter(),
                row.condition.round(),
                row.current_speed,
                interval,
                row.laps,
                row.dist_percent,
                row.status,
                history.join("-"),
                last_lap,
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    let events_text = new_events
        .iter()
        .map(|event| format!("{} - {}", event.timestamp, event.description))
        .collect::<Vec<String>>()
        .join("\n");

    // own drivers sorted by position, with laps remaining and the pit rejoin
    // projection
    let mut situations: Vec<(usize, String)> = drivers
        .iter()
        .map(|driver| {
            match standings.iter().find(|row| row.name.eq_ignore_ascii_case(driver)) {
                Some(row) => {
                    let progress = row.dist_percent as f64 / 100.0;
                    let laps_remaining = tot_no_laps as f64 - (row.laps as f64 + progress) + 1.0;
                    let projection = &row.pit_projection;
                    let after_stop = match &projection.car_ahead {
                        Some(car_ahead) => format!(
                            " | After stop: {:.1}s behind {}",
                            projection.gap, car_ahead
                        ),
                        None => String::new(),
                    };
                    (
                        row.position,
                        format!(
                            "P{} {} [{:.2} laps left] Pit projection: P{} ({:.0}s loss){}",
                            row.position,
                            driver,
                            laps_remaining,
                            projection.position,
                            pit_penalty_s,
                            after_stop,
                        ),
                    )
                }
                None => (usize::MAX, format!("P- {} ? laps remaining", driver)),
            }
        })
        .collect();
    situations.sort_by_key(|(position, _)| *position);
    let situation_text = situations
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<String>>()
        .join(";\n");

    let current_lap = standings.iter().map(|row| row.laps).max().unwrap_or(0);

    format!(
        "Race Time: {race_time} | Lap: {lap}/{total}\n\nActual Results:\n{scoreboard}\n\n\
         Last Events:\n{events}\n\nYou are responsible for the success of {team}. \
         Current situation of your drivers:\n{situation}.\n\
         Commands in your Actions line apply immediately to the current lap.",
        race_time = format_race_time(race_time),
        lap = current_lap,
        total = tot_no_laps,
        scoreboard = scoreboard_text,
        events = events_text,
        team = team,
        situation = situation_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(context: &mut StrategyContext, n: usize) {
        context.record_exchange(
            "system prompt",
            &format!("payload {}", n),
            &format!("reply {}", n),
        );
    }

    #[test]
    fn build_messages_truncates_to_recent_turns() {
        let mut context = StrategyContext::new();
        for n in 0..5 {
            exchange(&mut context, n);
        }
        let messages = context.build_messages("fresh system", "new payload");

        // fresh system + last 4 non-system turns + new user payload
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "fresh system");
        assert_eq!(messages[1].content, "payload 3");
        assert_eq!(messages[2].content, "reply 3");
        assert_eq!(messages[3].content, "payload 4");
        assert_eq!(messages[4].content, "reply 4");
        assert_eq!(messages[5].content, "new payload");
        // only one system message ever goes out
        assert_eq!(messages.iter().filter(|m| m.role == "system").count(), 1);
    }

    #[test]
    fn record_exchange_replaces_the_system_prompt() {
        let mut context = StrategyContext::new();
        context.record_exchange("old system", "q1", "a1");
        context.record_exchange("new system", "q2", "a2");
        let stored = context.messages();
        assert_eq!(stored.iter().filter(|m| m.role == "system").count(), 1);
        assert_eq!(stored[0].content, "new system");
    }

    #[test]
    fn empty_user_payload_is_not_recorded() {
        let mut context = StrategyContext::new();
        context.record_exchange("system", "", "pre-race tire reasoning");
        assert_eq!(context.messages().len(), 2);
        assert_eq!(context.messages()[1].role, "assistant");
    }

    #[test]
    fn system_prompt_names_team_and_grammar() {
        let prompt = team_system_prompt(
            "Papaya Team",
            &["NOR".to_owned(), "PIA".to_owned()],
        );
        assert!(prompt.contains("Papaya Team"));
        assert!(prompt.contains("NOR and PIA"));
        assert!(prompt.contains("pit soft"));
        assert!(prompt.contains("Actions:"));
    }
}
