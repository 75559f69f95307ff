use super::{open_clock, parse_reason};
use crate::cli::parser::{BreakAction, Commands};
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::time::{format_hms, local_hm};

/// Handle `break start` / `break end`
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Break { action } = cmd else {
        return Ok(());
    };

    let (clock, _) = open_clock(cfg)?;
    let user = cfg.user_id.as_str();

    match action {
        BreakAction::Start { reason } => {
            let reason = parse_reason(reason.as_deref())?;
            clock.start_break(user, reason)?;

            let at = clock
                .engine()
                .snapshot(user)
                .and_then(|s| s.open_break().map(|b| b.start_time));
            success(format!("{} started at {}", reason.label(), local_hm(at)));
        }
        BreakAction::End => {
            clock.end_break(user)?;

            let snapshot = clock.engine().snapshot(user);
            let secs = snapshot
                .as_ref()
                .and_then(|s| s.breaks.last())
                .and_then(|b| b.duration_seconds)
                .unwrap_or(0);
            let total = snapshot.map(|s| s.total_break_seconds).unwrap_or(0);
            success(format!(
                "Break ended after {} (total today: {})",
                format_hms(secs),
                format_hms(total)
            ));
        }
    }
    Ok(())
}
