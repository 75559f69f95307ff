use super::open_clock;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::core::stats;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, RESET};
use crate::utils::formatting::hours2readable;

pub fn handle(cfg: &Config) -> AppResult<()> {
    let (clock, store) = open_clock(cfg)?;
    let user = cfg.user_id.as_str();
    let today = SystemClock.today();

    let s = stats::load(store.as_ref(), user, today)?;

    println!("📊 Statistics for {user}\n");
    println!(
        "{CYAN}• This week:{RESET}  {} (since {})",
        hours2readable(s.week_hours),
        stats::week_start(today)
    );
    println!(
        "{CYAN}• This month:{RESET} {} (since {})",
        hours2readable(s.month_hours),
        stats::month_start(today)
    );
    println!(
        "{CYAN}• Attendance:{RESET} {}% of {} recorded day(s)",
        s.attendance_rate, s.recorded_days
    );

    if clock.current_status(user)?.is_running() {
        println!("{CYAN}• Today so far:{RESET} {}", clock.display_elapsed(user));
    }
    Ok(())
}
