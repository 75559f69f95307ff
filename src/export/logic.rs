// src/export/logic.rs

use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::AttendanceExport;
use crate::store::{AttendanceFilter, AttendanceStore};
use crate::ui::messages::warning;
use crate::utils::date::period_bounds;
use std::path::Path;

/// Logica di alto livello per l'export.
pub struct ExportLogic;

impl ExportLogic {
    /// Export dei riepiloghi di presenza.
    ///
    /// - `file`: path assoluto del file di output
    /// - `range`: `None`, `"all"` oppure un periodo (`YYYY`, `YYYY-MM`,
    ///   `YYYY-MM-DD`, `A:B`)
    ///
    /// Returns the number of exported records.
    pub fn export(
        store: &dyn AttendanceStore,
        user_id: Option<&str>,
        format: ExportFormat,
        file: &str,
        range: Option<&str>,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        let mut filter = AttendanceFilter {
            user_id: user_id.map(str::to_string),
            ..AttendanceFilter::default()
        };
        if let Some(r) = range.filter(|r| !r.eq_ignore_ascii_case("all")) {
            let (from, to) = period_bounds(r)?;
            filter = filter.between(from, to);
        }

        let rows: Vec<AttendanceExport> = store
            .query(&filter)?
            .iter()
            .map(AttendanceExport::from)
            .collect();

        if rows.is_empty() {
            warning("No attendance records found for selected range.");
            return Ok(0);
        }

        ensure_writable(path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
        }

        Ok(rows.len())
    }
}
