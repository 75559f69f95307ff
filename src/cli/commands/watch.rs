use super::clock::report_clock_out;
use super::{open_clock, parse_reason};
use crate::config::Config;
use crate::core::tracker::TimeClock;
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success};
use std::io::{self, BufRead, Write};

/// One line typed while the live timer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchCommand {
    BreakStart(Option<String>),
    BreakEnd,
    ClockOut,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<WatchCommand> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let cmd = match head.to_lowercase().as_str() {
        "b" | "break" => WatchCommand::BreakStart(parts.next().map(str::to_string)),
        "e" | "end" => WatchCommand::BreakEnd,
        "o" | "out" => WatchCommand::ClockOut,
        "q" | "quit" => WatchCommand::Quit,
        other => WatchCommand::Unknown(other.to_string()),
    };
    Some(cmd)
}

pub fn handle(cfg: &Config) -> AppResult<()> {
    let (clock, _) = open_clock(cfg)?;
    let user = cfg.user_id.as_str();

    let status = clock.current_status(user)?;
    if !status.is_running() {
        info(format!(
            "No running session ({}). Use `rtimeclock in` to clock in.",
            status.label()
        ));
        return Ok(());
    }

    println!("⏱  Live timer for {user}. Commands: b [reason], e, o, q");

    let _sub = clock.subscribe_elapsed(user, |display| {
        print!("\r⏱  {display} ");
        io::stdout().flush().ok();
    })?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let Some(cmd) = parse_command(&line) else {
            continue;
        };
        if !run_command(&clock, user, cmd) {
            break;
        }
    }

    println!();
    Ok(())
}

/// Returns false when the watch loop should stop.
fn run_command(clock: &TimeClock, user: &str, cmd: WatchCommand) -> bool {
    let result = match cmd {
        WatchCommand::BreakStart(reason) => parse_reason(reason.as_deref())
            .and_then(|r| clock.start_break(user, r).map_err(Into::into))
            .map(|_| success("\nBreak started")),
        WatchCommand::BreakEnd => clock
            .end_break(user)
            .map(|_| success("\nBreak ended"))
            .map_err(Into::into),
        WatchCommand::ClockOut => match clock.stop_session(user) {
            Ok(outcome) => {
                println!();
                report_clock_out(clock, &outcome);
                return false;
            }
            Err(e) => Err(e.into()),
        },
        WatchCommand::Quit => return false,
        WatchCommand::Unknown(other) => {
            info(format!("\nUnknown command '{other}' (b [reason], e, o, q)"));
            Ok(())
        }
    };

    if let Err(e) = result {
        error(format!("\n{e}"));
    }
    true
}
