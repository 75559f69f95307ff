use super::open_clock;
use crate::cli::parser::Commands;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use crate::utils::date::parse_date;
use crate::utils::formatting::hours2readable;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Reconcile { date } = cmd {
        let day = match date {
            Some(d) => parse_date(d).ok_or_else(|| AppError::InvalidDate(d.clone()))?,
            None => SystemClock.today(),
        };

        let (clock, _) = open_clock(cfg)?;
        let summary = clock.engine().reconcile_day(&cfg.user_id, day)?;

        success(format!(
            "Attendance for {} reconciled: {} ({} break(s))",
            summary.date,
            hours2readable(summary.total_hours),
            summary.breaks.len()
        ));
    }
    Ok(())
}
