use crate::cli::parser::Commands;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::core::stats::month_start;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{AttendanceStatus, AttendanceSummary};
use crate::store::{AttendanceFilter, AttendanceStore, SqliteStore};
use crate::utils::colors::{color_for_attendance, color_for_location, colorize_optional, paint};
use crate::utils::date::period_bounds;
use crate::utils::formatting::hours2readable;
use crate::utils::table::Table;
use crate::utils::time::{format_hms, local_hm};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List {
        period,
        all_users,
        status,
    } = cmd
    {
        let status = status.as_deref().map(parse_status).transpose()?;
        let store = SqliteStore::open(&cfg.database, cfg.store_timeout())?;

        // default: mese corrente
        let (from, to) = match period {
            Some(p) => period_bounds(p)?,
            None => {
                let today = SystemClock.today();
                (month_start(today), today)
            }
        };

        let mut filter = AttendanceFilter::default()
            .between(from, to)
            .with_status(status);
        if !*all_users {
            filter.user_id = Some(cfg.user_id.clone());
        }

        let records = store.query(&filter)?;
        if records.is_empty() {
            println!("No attendance records between {from} and {to}.");
            return Ok(());
        }

        print!("{}", render(&records, *all_users, cfg.separator()));

        let total: f64 = records.iter().map(|r| r.total_hours).sum();
        println!("\nΣ {} over {} day(s)", hours2readable(total), records.len());
    }
    Ok(())
}

fn parse_status(code: &str) -> AppResult<AttendanceStatus> {
    AttendanceStatus::from_db_str(&code.trim().to_lowercase()).ok_or_else(|| {
        AppError::InvalidStatus(format!(
            "{code} (expected one of: present, late, absent, half-day)"
        ))
    })
}

fn render(records: &[AttendanceSummary], with_user: bool, sep: char) -> String {
    let mut headers = vec!["DATE"];
    if with_user {
        headers.push("USER");
    }
    headers.extend(["IN", "OUT", "HOURS", "BREAKS", "LOCATION", "STATUS"]);

    let mut table = Table::new(&headers);
    for r in records {
        let break_secs: i64 = r.breaks.iter().filter_map(|b| b.duration_seconds).sum();

        let mut row = vec![r.date.to_string()];
        if with_user {
            row.push(r.user_id.clone());
        }
        row.push(local_hm(Some(r.clock_in)));
        row.push(colorize_optional(&local_hm(r.clock_out)));
        let hours = if r.is_reconciled() {
            hours2readable(r.total_hours)
        } else {
            "open".to_string()
        };
        row.push(colorize_optional(&hours));
        row.push(format!("{} ({})", r.breaks.len(), format_hms(break_secs)));
        row.push(paint(color_for_location(r.work_location), r.work_location.to_db_str()));
        row.push(paint(color_for_attendance(r.status), r.status.to_db_str()));
        table.add_row(row);
    }
    table.render(sep)
}
