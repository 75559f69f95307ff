use super::open_clock;
use crate::clock::Clock;
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::session::TimerStatus;
use crate::utils::colors::{color_for_status, paint};
use crate::utils::secs2readable;
use crate::utils::time::{format_hms, local_hm};

pub fn handle(cfg: &Config) -> AppResult<()> {
    let (clock, _) = open_clock(cfg)?;
    let user = cfg.user_id.as_str();

    let status = clock.current_status(user)?;
    println!(
        "👤 {user}  {}",
        paint(color_for_status(status), status.label())
    );

    let Some(session) = clock.engine().snapshot(user) else {
        println!("⏱  {}", format_hms(0));
        return Ok(());
    };

    println!("⏱  {}", clock.display_elapsed(user));
    println!(
        "🕘 In: {}   Out: {}   📍 {}",
        local_hm(Some(session.start_time)),
        local_hm(session.end_time),
        session.work_location.label()
    );
    println!(
        "☕ Breaks: {} ({})",
        session.breaks.len(),
        secs2readable(session.total_break_seconds, false)
    );

    if status == TimerStatus::Break
        && let Some(open) = session.open_break()
    {
        let now = clock.engine().clock().now();
        println!(
            "   on {} since {} ({})",
            open.reason.label().to_lowercase(),
            local_hm(Some(open.start_time)),
            format_hms(open.seconds_until(now))
        );
    }
    Ok(())
}
