use super::{open_clock, parse_location};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::engine::StopOutcome;
use crate::core::tracker::TimeClock;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::formatting::hours2readable;
use crate::utils::time::{format_hms, local_hm};

/// Handle `in` and `out`
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::In { loc } => clock_in(loc.as_deref(), cfg),
        Commands::Out => clock_out(cfg),
        _ => Ok(()),
    }
}

fn clock_in(loc: Option<&str>, cfg: &Config) -> AppResult<()> {
    let location = parse_location(loc, cfg)?;
    let (clock, _) = open_clock(cfg)?;

    clock.start_session(&cfg.user_id, location)?;

    let started = clock.engine().snapshot(&cfg.user_id).map(|s| s.start_time);
    success(format!(
        "Clocked in at {} ({})",
        local_hm(started),
        location.label()
    ));

    // il record di presenza viene comunque ricreato all'uscita
    if clock.engine().pending_count() > 0 && clock.retry_pending() == 0 {
        warning("Attendance record not created yet, it will be written at clock-out.");
    }
    Ok(())
}

fn clock_out(cfg: &Config) -> AppResult<()> {
    let (clock, _) = open_clock(cfg)?;
    let outcome = clock.stop_session(&cfg.user_id)?;
    report_clock_out(&clock, &outcome);
    Ok(())
}

/// Print a clock-out, retry what did not reach the database, and warn about
/// whatever is still owed.
pub(crate) fn report_clock_out(clock: &TimeClock, outcome: &StopOutcome) {
    success(format!(
        "Clocked out at {} after {} of work ({})",
        local_hm(outcome.session.end_time),
        format_hms(outcome.elapsed_millis / 1000),
        hours2readable(outcome.total_hours())
    ));

    let flushed = if outcome.is_partial() {
        clock.retry_pending()
    } else {
        0
    };
    let still_pending = clock.engine().pending_count();

    if !outcome.is_partial() {
        if let Some(summary) = &outcome.summary {
            info(format!(
                "Attendance for {} updated: {} with {} break(s)",
                summary.date,
                hours2readable(summary.total_hours),
                summary.breaks.len()
            ));
        }
        return;
    }

    if flushed > 0 && still_pending == 0 {
        info("Pending writes were saved on retry.");
        return;
    }

    for line in partial_warnings(outcome) {
        warning(line);
    }
}

/// One warning per write that did not reach the database.
fn partial_warnings(outcome: &StopOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(e) = &outcome.persist_error {
        lines.push(format!(
            "{e}. Clock-out time {} was kept and will be written by the next `rtimeclock out` or `rtimeclock reconcile`.",
            local_hm(outcome.session.end_time)
        ));
    }
    if let Some(e) = &outcome.reconcile_error {
        lines.push(format!("{e}. Run `rtimeclock reconcile` to retry."));
    }
    lines
}
