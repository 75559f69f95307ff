//! Config file upgrades: keys introduced after a file was written are
//! added with their default value, existing values are never touched.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Documentation injected after a key, the first time the key is added.
fn comment_for(key: &str) -> Option<&'static str> {
    match key {
        "default_location" => Some(
            "  # default_location options: office, home, client-site, co-working, other\n",
        ),
        "store_timeout_ms" => {
            Some("  # max wait (ms) for a locked database before the call fails\n")
        }
        _ => None,
    }
}

/// Add every missing key of `Config` to the YAML file at `path`.
/// Returns the names of the added keys (empty when nothing changed).
pub fn fill_missing_keys(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    let mut yaml: Value = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;

    let Some(map) = yaml.as_mapping_mut() else {
        return Err(AppError::Config(format!(
            "{}: top level is not a mapping",
            path.display()
        )));
    };

    let defaults = default_mapping()?;
    let mut added = Vec::new();

    for (key, value) in defaults {
        if !map.contains_key(&key) {
            if let Some(name) = key.as_str() {
                added.push(name.to_string());
            }
            map.insert(key, value);
        }
    }

    if added.is_empty() {
        return Ok(added);
    }

    let serialized = serde_yaml::to_string(&yaml).map_err(|_| AppError::ConfigSave)?;

    // Inject documentation comment right after the added lines
    let mut new_content = String::new();
    for line in serialized.lines() {
        new_content.push_str(line);
        new_content.push('\n');

        if let Some((key, _)) = line.split_once(':')
            && added.iter().any(|a| a == key)
            && let Some(doc) = comment_for(key)
        {
            new_content.push_str(doc);
        }
    }

    fs::write(path, new_content).map_err(|_| AppError::ConfigSave)?;

    for key in &added {
        success(format!("Config key added: {key}"));
    }
    Ok(added)
}

/// Same as [`fill_missing_keys`] on the standard config file, if there is one.
pub fn run_config_migration() -> AppResult<Vec<String>> {
    let path = Config::config_file();
    if !path.exists() {
        info(format!("No config file at {}", path.display()));
        return Ok(Vec::new());
    }
    fill_missing_keys(&path)
}

fn default_mapping() -> AppResult<Mapping> {
    let value = serde_yaml::to_value(Config::default()).map_err(|_| AppError::ConfigSave)?;
    match value {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Config("default configuration is not a mapping".into())),
    }
}
