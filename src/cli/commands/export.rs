use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::AuditOp;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::store::{SessionStore, SqliteStore};
use chrono::Utc;
use tracing::warn;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        all_users,
        force,
    } = cmd
    {
        let store = SqliteStore::open(&cfg.database, cfg.store_timeout())?;
        let user = (!*all_users).then_some(cfg.user_id.as_str());

        let rows = ExportLogic::export(&store, user, *format, file, range.as_deref(), *force)?;

        if rows > 0
            && let Err(e) = store.audit(
                Utc::now(),
                AuditOp::Export,
                user.unwrap_or("*"),
                &format!("{rows} records as {} to {file}", format.as_str()),
            )
        {
            warn!(error = %e, "Failed to write internal log");
        }
    }
    Ok(())
}
