use helpers::general::format_race_time;
use serde::Serialize;

/// Number of events kept; older entries fall off the back of the log.
const MAX_EVENTS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pit,
    Stuck,
    Race,
    Overtake,
    Command,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Race time rendered as m:ss at the moment of the event.
    pub timestamp: String,
    pub race_time: f64,
    pub kind: EventKind,
    pub description: String,
}

/// EventLog keeps the most recent race events, newest first. An event matching
/// an entry still in the log on (kind, description) is dropped, so a condition
/// holding over many ticks reports once instead of spamming.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> EventLog {
        EventLog { events: Vec::new() }
    }

    pub fn add(&mut self, race_time: f64, kind: EventKind, description: &str) {
        let duplicate = self
            .events
            .iter()
            .any(|e| e.kind == kind && e.description == description);
        if duplicate {
            return;
        }

        self.events.insert(
            0,
            Event {
                timestamp: format_race_time(race_time),
                race_time,
                kind,
                description: description.to_owned(),
            },
        );
        self.events.truncate(MAX_EVENTS);
    }

    /// all returns the retained events, newest first.
    pub fn all(&self) -> &[Event] {
        &self.events
    }

    /// since returns the events at or after the given race time, oldest first
    /// (the order they are fed into agent payloads).
    pub fn since(&self, race_time: f64) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.race_time >= race_time)
            .rev()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_events_are_dropped() {
        let mut log = EventLog::new();
        log.add(1.0, EventKind::Pit, "VER entered pit lane");
        log.add(1.5, EventKind::Pit, "VER entered pit lane");
        log.add(1.5, EventKind::Race, "VER entered pit lane"); // other kind passes
        assert_eq!(log.all().len(), 2);
    }

    #[test]
    fn log_is_capped_newest_first() {
        let mut log = EventLog::new();
        for i in 0..40 {
            log.add(i as f64, EventKind::Race, &format!("event {}", i));
        }
        assert_eq!(log.all().len(), 30);
        assert_eq!(log.all()[0].description, "event 39");
        assert_eq!(log.all()[29].description, "event 10");
    }

    #[test]
    fn since_returns_oldest_first() {
        let mut log = EventLog::new();
        log.add(1.0, EventKind::Race, "a");
        log.add(2.0, EventKind::Race, "b");
        log.add(3.0, EventKind::Race, "c");
        let recent: Vec<&str> = log
            .since(2.0)
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(recent, vec!["b", "c"]);
    }
}
