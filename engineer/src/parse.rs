//! Best-effort extraction of driver commands from agent prose.
//!
//! Agents answer in free text; somewhere in the reply they spell out
//! `driver verb [param]` tuples. The scanner walks the word stream and picks
//! those out, reporting near-miss fragments for diagnostics. It is a pure
//! function, testable without any network I/O.

const STYLE_VERBS: [&str; 4] = ["push", "normal", "conserve", "nothing"];
const PIT_PARAMS: [&str; 4] = ["soft", "medium", "hard", "cancel"];
const TIRE_PARAMS: [&str; 3] = ["soft", "medium", "hard"];

/// Commands found in a reply, plus the fragments that looked like commands
/// but carried an unusable parameter.
#[derive(Debug, Default, PartialEq)]
pub struct ExtractedCommands {
    pub commands: Vec<String>,
    pub rejected: Vec<String>,
}

/// extract_commands scans prose for in-race command tuples. The returned
/// strings feed straight into the engine's command protocol.
pub fn extract_commands(reply: &str) -> ExtractedCommands {
    let words = tokenize(reply);
    let mut out = ExtractedCommands::default();

    let mut i = 0;
    while i + 1 < words.len() {
        let driver = &words[i];
        if !is_driver_token(driver) {
            i += 1;
            continue;
        }

        let verb = &words[i + 1];
        if STYLE_VERBS.contains(&verb.as_str()) {
            out.commands.push(format!("{} {}", driver, verb));
            i += 2;
            continue;
        }

        if verb == "pit" {
            match words.get(i + 2) {
                Some(param) if PIT_PARAMS.contains(&param.as_str()) => {
                    out.commands.push(format!("{} pit {}", driver, param));
                    i += 3;
                }
                Some(param) => {
                    out.rejected.push(format!("{} pit {}", driver, param));
                    i += 3;
                }
                None => {
                    out.rejected.push(format!("{} pit", driver));
                    i += 2;
                }
            }
            continue;
        }

        i += 1;
    }

    out
}

/// extract_tire_choices scans a pre-race reply for `driver tire <compound>`
/// tuples and returns (driver, compound) pairs.
pub fn extract_tire_choices(reply: &str) -> Vec<(String, String)> {
    let words = tokenize(reply);
    let mut choices = Vec::new();

    let mut i = 0;
    while i + 2 < words.len() {
        if is_driver_token(&words[i])
            && words[i + 1] == "tire"
            && TIRE_PARAMS.contains(&words[i + 2].as_str())
        {
            choices.push((words[i].to_owned(), words[i + 2].to_owned()));
            i += 3;
            continue;
        }
        i += 1;
    }

    choices
}

/// tokenize lowercases the reply and strips markdown punctuation off word
/// boundaries, so "**VER:** pit soft." scans the same as "ver pit soft".
fn tokenize(reply: &str) -> Vec<String> {
    reply
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_owned()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

fn is_driver_token(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())
}
