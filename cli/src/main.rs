use anyhow::Context;
use clap::Parser;
use engineer::config::{AgentSettings, TeamAgentConfig};
use engineer::orchestrator::Orchestrator;
use racesim::core::clock::RaceClock;
use racesim::core::command::parse_command_line;
use racesim::core::race::Race;
use racesim::core::vehicle::ControlMode;
use racesim::interfaces::ui_interface::{
    build_snapshot, ControlMessage, RaceSnapshot, MAX_UI_UPDATE_FREQUENCY,
};
use racesim::post::race_result::RaceResult;
use racesim::pre::read_sim_pars::{read_sim_pars, SimPars};
use racesim::pre::sim_opts::SimOpts;
use std::io::BufRead;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    // get simulation parameters
    let mut sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        println!("INFO: Reading simulation parameters from {:?}", parfile_path);
        read_sim_pars(parfile_path)?
    } else {
        println!("INFO: No parameter file provided, using the built-in grid");
        SimPars::default_grid()
    };

    // without agents every pit wall is a player console
    if sim_opts.no_agents {
        for team_pars in sim_pars.team_pars_all.iter_mut() {
            team_pars.control = ControlMode::Player;
        }
    }

    println!(
        "INFO: Simulating {} laps of {} with {} cars",
        sim_pars.race_pars.tot_no_laps,
        sim_pars.track_pars.name,
        sim_pars
            .team_pars_all
            .iter()
            .map(|t| t.drivers.len())
            .sum::<usize>()
    );

    // create race and orchestrator
    let mut race = Race::new(
        &sim_pars.race_pars,
        &sim_pars.track_pars,
        &sim_pars.team_pars_all,
    );
    let agent_teams = if sim_opts.no_agents {
        Vec::new()
    } else {
        TeamAgentConfig::from_team_pars(&sim_pars.team_pars_all)
    };
    let mut orchestrator = Orchestrator::new(
        agent_teams,
        AgentSettings::from_pars(&sim_pars.agent_pars),
    );

    // stdin command reader - the input half of the UI collaborator
    let (control_tx, control_rx) = flume::unbounded::<ControlMessage>();
    std::thread::spawn(move || read_console_commands(control_tx));

    // snapshot channel to the console view - the output half
    let (snapshot_tx, snapshot_rx) = flume::unbounded::<RaceSnapshot>();
    std::thread::spawn(move || run_console_view(snapshot_rx));

    // pre-race tire selection for agent-run teams
    if orchestrator.has_teams() {
        println!("INFO: Querying strategy agents for starting tires...");
        orchestrator.dispatch_tire_selection(&mut race);
    }

    // EXECUTION -----------------------------------------------------------------------------------
    let mut clock = RaceClock::new();
    let tick_rate = sim_opts.tick_rate.max(1.0).min(120.0);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tick_rate));
    let snapshot_spacing = Duration::from_secs_f64(1.0 / MAX_UI_UPDATE_FREQUENCY);
    let mut last_snapshot = Instant::now();
    let mut human_pending: Vec<String> = Vec::new();
    let mut quit = false;

    loop {
        interval.tick().await;

        // control messages from the console
        for message in control_rx.try_iter() {
            match message {
                ControlMessage::TogglePause => {
                    race.paused = !race.paused;
                    println!(
                        "INFO: Simulation {}",
                        if race.paused { "paused" } else { "resumed" }
                    );
                }
                ControlMessage::CommandLine(line) => human_pending.push(line),
                ControlMessage::Quit => quit = true,
            }
        }
        if quit {
            break;
        }

        // fold in completed agent replies; resumes the race once a round is done
        orchestrator.poll_replies(&mut race);

        let delta_s = clock.tick(Instant::now(), race.paused) * sim_opts.realtime_factor;
        if !race.paused {
            // whole queued command sets apply before the step, never mid-round
            for pending in orchestrator.take_pending_commands() {
                race.apply_command_line(&pending.line, Some(&pending.team));
            }
            for line in human_pending.drain(..) {
                apply_console_command(&mut race, &sim_pars, &line);
            }

            race.simulate_timestep(delta_s);
        }

        if orchestrator.should_trigger(&race) {
            println!("INFO: Strategy round - querying team agents...");
            orchestrator.dispatch_strategy_round(&mut race);
        }

        // send the current race state at the UI rate
        if last_snapshot.elapsed() >= snapshot_spacing {
            let snapshot = build_snapshot(
                &race,
                orchestrator.notifications(),
                orchestrator.last_error(),
            )?;
            snapshot_tx
                .send(snapshot)
                .context("Failed to send race state to UI!")?;
            last_snapshot = Instant::now();
        }

        if race.classification_ready() {
            break;
        }
    }

    // POST-PROCESSING -----------------------------------------------------------------------------
    if sim_opts.debug {
        println!(
            "DEBUG: Simulated race time at shutdown: {:.3}s",
            race.cur_racetime
        );
    }

    let race_result = RaceResult::from_race(&race);
    race_result.print_classification();

    Ok(())
}

/// read_console_commands forwards stdin lines into the engine: `pause` and
/// `resume` toggle the gate, `quit` ends the session, everything else is
/// treated as a command line for the protocol.
fn read_console_commands(control_tx: flume::Sender<ControlMessage>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line.trim().to_owned(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }
        let message = match line.to_lowercase().as_str() {
            "pause" | "resume" => ControlMessage::TogglePause,
            "quit" | "exit" => ControlMessage::Quit,
            _ => ControlMessage::CommandLine(line),
        };
        if control_tx.send(message).is_err() {
            break;
        }
    }
}

/// apply_console_command routes each fragment through its driver's own team
/// console. Drivers of agent-run teams cannot be commanded from the keyboard.
fn apply_console_command(race: &mut Race, sim_pars: &SimPars, line: &str) {
    let outcome = parse_command_line(line);

    if !outcome.rejected.is_empty() {
        println!("WARNING: Ignored fragments: {}", outcome.rejected.join(", "));
    }

    for command in outcome.commands.iter() {
        let team = race
            .vehicles
            .iter()
            .find(|v| v.matches_token(&command.driver))
            .map(|v| v.team.to_owned());

        match team {
            Some(team) => {
                let control = sim_pars
                    .team_pars_all
                    .iter()
                    .find(|t| t.name == team)
                    .map(|t| t.control);
                if control == Some(ControlMode::Player) {
                    race.apply_command(command, Some(&team));
                } else {
                    println!(
                        "WARNING: {} is run by a strategy agent - command ignored",
                        team
                    );
                }
            }
            None => println!("WARNING: No driver matches '{}'", command.driver),
        }
    }
}

/// run_console_view consumes race snapshots and prints what changed: fresh
/// events, new agent notifications, agent errors.
fn run_console_view(snapshot_rx: flume::Receiver<RaceSnapshot>) {
    let mut printed_events: Vec<String> = Vec::new();
    let mut printed_notifications = 0usize;
    let mut printed_error: Option<String> = None;

    while let Ok(snapshot) = snapshot_rx.recv() {
        // events arrive newest first; print the ones not seen yet, oldest first
        for event in snapshot.events.iter().rev() {
            if !printed_events.contains(&event.description) {
                println!("[{}] {}", event.timestamp, event.description);
                printed_events.push(event.description.to_owned());
                if printed_events.len() > 64 {
                    printed_events.remove(0);
                }
            }
        }

        if snapshot.notifications.len() > printed_notifications {
            let fresh = snapshot.notifications.len() - printed_notifications;
            for notification in snapshot.notifications.iter().take(fresh) {
                println!(
                    "--- {} ({}) ---\n{}\n",
                    notification.team, notification.model, notification.content
                );
            }
            printed_notifications = snapshot.notifications.len();
        }

        if snapshot.agent_error != printed_error {
            if let Some(error) = &snapshot.agent_error {
                println!("WARNING: Agent error: {}", error);
            }
            printed_error = snapshot.agent_error.to_owned();
        }
    }
}
