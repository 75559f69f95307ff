use crate::db::log::AuditOp;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;

const MAX_OP_WIDTH: usize = 48;

fn strip_ansi(s: &str) -> String {
    match Regex::new(r"\x1B\[[0-9;]*[mK]") {
        Ok(re) => re.replace_all(s, "").into_owned(),
        Err(_) => s.to_string(),
    }
}

/// Restituisce il colore ANSI in base all'operazione
fn color_for_operation(op: &str) -> Colour {
    const CLOCK_IN: &str = AuditOp::ClockIn.as_str();
    const CLOCK_OUT: &str = AuditOp::ClockOut.as_str();
    const BREAK_START: &str = AuditOp::BreakStart.as_str();
    const BREAK_END: &str = AuditOp::BreakEnd.as_str();
    const RECONCILE: &str = AuditOp::Reconcile.as_str();
    const RECONCILE_FAILED: &str = AuditOp::ReconcileFailed.as_str();
    const EXPORT: &str = AuditOp::Export.as_str();
    const INIT: &str = AuditOp::Init.as_str();

    match op {
        CLOCK_IN => Colour::Green,
        CLOCK_OUT => Colour::Red,
        BREAK_START | BREAK_END => Colour::Yellow,
        RECONCILE => Colour::Cyan,
        RECONCILE_FAILED => Colour::RGB(255, 85, 85),
        EXPORT => Colour::Blue,
        INIT => Colour::RGB(255, 153, 51), // arancione
        "migration_applied" => Colour::Purple,
        _ => Colour::White,
    }
}

/// One row of the `log` table, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// `operation (target)` with only the operation coloured, cut to
    /// `MAX_OP_WIDTH` visible characters.
    fn op_column(&self) -> String {
        let color = color_for_operation(&self.operation);
        let visible = if self.target.is_empty() {
            self.operation.clone()
        } else {
            format!("{} ({})", self.operation, self.target)
        };

        let visible = if visible.chars().count() > MAX_OP_WIDTH {
            let mut s: String = visible.chars().take(MAX_OP_WIDTH - 3).collect();
            s.push_str("...");
            s
        } else {
            visible
        };

        match visible.split_once(' ') {
            Some((op_word, rest)) => format!("{} {}", color.paint(op_word), rest),
            None => color.paint(visible.as_str()).to_string(),
        }
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn load(pool: &DbPool, limit: Option<usize>) -> AppResult<Vec<LogEntry>> {
        let mut stmt = pool.conn.prepare_cached(
            "SELECT id, date, operation, IFNULL(target, ''), message FROM log ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let raw_date: String = row.get(1)?;
            let date = chrono::DateTime::parse_from_rfc3339(&raw_date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or(raw_date);

            Ok(LogEntry {
                id: row.get(0)?,
                date,
                operation: row.get(2)?,
                target: row.get(3)?,
                message: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }

        // solo le ultime `limit` righe
        if let Some(n) = limit
            && entries.len() > n
        {
            entries.drain(..entries.len() - n);
        }
        Ok(entries)
    }

    pub fn print_log(pool: &DbPool, limit: Option<usize>) -> AppResult<()> {
        let entries = Self::load(pool, limit)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);
        let columns: Vec<String> = entries.iter().map(LogEntry::op_column).collect();
        let op_w = columns
            .iter()
            .map(|c| strip_ansi(c).chars().count())
            .max()
            .unwrap_or(10);

        println!("📜 Internal log:\n");

        for (entry, op_col) in entries.iter().zip(&columns) {
            // padding calcolato sulle dimensioni reali SENZA ANSI
            let padding = " ".repeat(op_w.saturating_sub(strip_ansi(op_col).chars().count()));

            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                entry.id,
                entry.date,
                op_col,
                padding,
                entry.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::log::ttlog;

    #[test]
    fn op_column_is_truncated_without_ansi() {
        let entry = LogEntry {
            id: 1,
            date: "2025-03-03T09:00:00+00:00".into(),
            operation: "clock_in".into(),
            target: "x".repeat(80),
            message: "m".into(),
        };
        let col = entry.op_column();
        assert_eq!(strip_ansi(&col).chars().count(), MAX_OP_WIDTH);
        assert!(strip_ansi(&col).starts_with("clock_in ("));
    }

    #[test]
    fn load_keeps_the_tail() {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        ttlog(&pool.conn, AuditOp::ClockIn, "alice", "in").unwrap();
        ttlog(&pool.conn, AuditOp::ClockOut, "alice", "out").unwrap();

        let last = LogLogic::load(&pool, Some(1)).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].operation, "clock_out");
    }
}
