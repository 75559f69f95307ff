use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::migrate::{applied_versions, run_pending_migrations};
use crate::db::pool::DbPool;
use crate::db::stats;
use crate::errors::{AppError, AppResult};
use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        vacuum,
        info,
    } = cmd
    {
        if !(*migrate || *check || *vacuum || *info) {
            return Err(AppError::Config(
                "nothing to do: use --migrate, --check, --vacuum or --info".into(),
            ));
        }

        // Unica istanza condivisa
        let mut pool = DbPool::with_timeout(&cfg.database, cfg.store_timeout())?;

        //
        // 1) MIGRATE
        //
        // info/check read tables that only exist after the migrations
        if *migrate {
            println!("{}▶ Running migrations…{}", CYAN, RESET);
        }
        run_pending_migrations(&pool.conn)?;
        if *migrate {
            let versions = applied_versions(&pool.conn)?;
            println!(
                "{}✔ Migration completed ({} applied).{}\n",
                GREEN,
                versions.len(),
                RESET
            );
        }

        //
        // 2) INFO
        //
        if *info {
            stats::print_db_info(&mut pool, &cfg.database)?;
        }

        //
        // 3) CHECK
        //
        if *check {
            println!("{}▶ Running integrity check…{}", CYAN, RESET);

            let integrity: String = pool
                .conn
                .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

            if integrity == "ok" {
                println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
            } else {
                println!("{}✘ Integrity check failed:{} {}\n", RED, RESET, integrity);
            }

            let open: i64 = pool.conn.query_row(
                "SELECT COUNT(*) FROM sessions WHERE status IN ('active','break') AND date < date('now', 'localtime')",
                [],
                |row| row.get(0),
            )?;
            if open > 0 {
                println!(
                    "{}✘ {} session(s) from previous days were never clocked out.{}\n",
                    RED, open, RESET
                );
            }

            let parked: i64 =
                pool.conn
                    .query_row("SELECT COUNT(*) FROM pending_completions", [], |row| {
                        row.get(0)
                    })?;
            if parked > 0 {
                println!(
                    "{}⚠ {} clock-out(s) not yet written: run `rtimeclock out` or `rtimeclock reconcile`.{}\n",
                    YELLOW, parked, RESET
                );
            }
        }

        //
        // 4) VACUUM
        //
        if *vacuum {
            println!("{}▶ Running VACUUM…{}", CYAN, RESET);
            pool.conn.execute_batch("VACUUM;")?;
            println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
        }
    }

    Ok(())
}
