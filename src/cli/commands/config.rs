use crate::cli::parser::Commands;
use crate::config::{Config, migrate};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, success, warning};
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config, is_test: bool) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        edit_config,
        editor,
    } = cmd
    {
        // Path del file di configurazione
        let path = Config::config_file();

        // ---- PRINT CONFIG ----
        if *print_config {
            let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
            println!("📄 Current configuration:\n");
            println!("{yaml}");
        }

        // ---- CHECK CONFIG ----
        if *check {
            let problems = cfg.problems();
            if problems.is_empty() {
                success("Configuration values are valid.");
            } else {
                for p in &problems {
                    warning(p);
                }
            }

            // in test mode the file on disk is never touched
            if !is_test {
                let added = migrate::run_config_migration()?;
                if added.is_empty() {
                    success("No missing configuration keys.");
                }
            }

            if !problems.is_empty() {
                return Err(AppError::Config(format!("{} invalid value(s)", problems.len())));
            }
        }

        // ---- EDIT CONFIG ----
        if *edit_config {
            // Default editor basato sulla piattaforma
            let default_editor = std::env::var("EDITOR")
                .or_else(|_| std::env::var("VISUAL"))
                .unwrap_or_else(|_| {
                    if cfg!(target_os = "windows") {
                        "notepad".to_string()
                    } else {
                        "nano".to_string()
                    }
                });

            // Se l’utente ha passato --editor, usiamo quello
            let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

            let edited = |ed: &str| {
                Command::new(ed)
                    .arg(&path)
                    .status()
                    .is_ok_and(|s| s.success())
            };

            if edited(&editor_to_use) {
                success(format!(
                    "Configuration file edited successfully using '{editor_to_use}'"
                ));
            } else if editor_to_use != default_editor {
                warning(format!(
                    "Editor '{editor_to_use}' not available, falling back to '{default_editor}'"
                ));
                if edited(&default_editor) {
                    success(format!(
                        "Configuration file edited successfully using fallback '{default_editor}'"
                    ));
                } else {
                    error(format!(
                        "Failed to edit configuration file using fallback '{default_editor}'"
                    ));
                }
            } else {
                error(format!("Failed to edit configuration file using '{editor_to_use}'"));
            }
        }
    }

    Ok(())
}
