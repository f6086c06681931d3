use crate::core::tires::{Compound, DrivingStyle};

/// CommandKind is the typed instruction a driver token is paired with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    SetStyle(DrivingStyle),
    CallPit(Compound),
    CancelPit,
}

/// Command is ephemeral: built from text, validated, applied once, discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub driver: String,
    pub kind: CommandKind,
}

/// Result of parsing one instruction line: the commands that made sense plus
/// the fragments that did not (unknown verb, missing or bad parameter).
#[derive(Debug, Default, PartialEq)]
pub struct ParseOutcome {
    pub commands: Vec<Command>,
    pub rejected: Vec<String>,
}

/// parse_command_line splits a `;`/`,` separated instruction line into typed
/// commands. Matching is case-insensitive and quote characters are stripped
/// before parsing, so quoted agent output parses the same as typed input.
pub fn parse_command_line(input: &str) -> ParseOutcome {
    let cleaned: String = input
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .to_lowercase();

    let mut outcome = ParseOutcome::default();

    for fragment in cleaned.split(|c| c == ';' || c == ',') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }

        let mut words = fragment.split_whitespace();
        let driver = match words.next() {
            Some(driver) => driver.to_owned(),
            None => continue,
        };
        let verb = words.next();
        let param = words.next();

        let kind = if let Some(style) = verb.and_then(DrivingStyle::parse) {
            CommandKind::SetStyle(style)
        } else if verb == Some("pit") {
            match (param, param.and_then(Compound::parse)) {
                (Some("cancel"), _) => CommandKind::CancelPit,
                (_, Some(compound)) => CommandKind::CallPit(compound),
                _ => {
                    outcome.rejected.push(fragment.to_owned());
                    continue;
                }
            }
        } else {
            outcome.rejected.push(fragment.to_owned());
            continue;
        };

        outcome.commands.push(Command { driver, kind });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_commands_in_one_line() {
        let outcome = parse_command_line("ver pit soft; ver push");
        assert_eq!(
            outcome.commands,
            vec![
                Command {
                    driver: "ver".to_owned(),
                    kind: CommandKind::CallPit(Compound::Soft),
                },
                Command {
                    driver: "ver".to_owned(),
                    kind: CommandKind::SetStyle(DrivingStyle::Push),
                },
            ]
        );
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn strips_quotes_and_ignores_case() {
        let outcome = parse_command_line("\"HAM Conserve\", 'lec PIT HARD'");
        assert_eq!(outcome.commands.len(), 2);
        assert_eq!(
            outcome.commands[0].kind,
            CommandKind::SetStyle(DrivingStyle::Conserve)
        );
        assert_eq!(outcome.commands[1].kind, CommandKind::CallPit(Compound::Hard));
    }

    #[test]
    fn pit_cancel_is_its_own_command() {
        let outcome = parse_command_line("alb pit cancel");
        assert_eq!(outcome.commands[0].kind, CommandKind::CancelPit);
    }

    #[test]
    fn malformed_fragments_are_reported_not_parsed() {
        let outcome = parse_command_line("ver fly; ham pit; lec pit ultra; nor push");
        assert_eq!(outcome.commands.len(), 1);
        assert_eq!(outcome.commands[0].driver, "nor");
        assert_eq!(
            outcome.rejected,
            vec![
                "ver fly".to_owned(),
                "ham pit".to_owned(),
                "lec pit ultra".to_owned(),
            ]
        );
    }

    #[test]
    fn empty_fragments_are_skipped_silently() {
        let outcome = parse_command_line(" ; , ;");
        assert!(outcome.commands.is_empty());
        assert!(outcome.rejected.is_empty());
    }
}
