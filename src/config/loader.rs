use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ConfigError};

use super::types::ScenarioConfig;

/// Scenario files checked in the working directory when no path is given.
pub(crate) const DEFAULT_SCENARIO_FILES: [&str; 2] = ["surge.toml", "surge.json"];

/// Loads a scenario file from the provided path or the default locations.
///
/// # Errors
///
/// Returns an error when no scenario file is found or it cannot be read or
/// parsed.
pub fn load_config(path: Option<&str>) -> AppResult<(PathBuf, ScenarioConfig)> {
    if let Some(path) = path {
        let path = PathBuf::from(path);
        let config = load_config_file(&path)?;
        return Ok((path, config));
    }

    for candidate in DEFAULT_SCENARIO_FILES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok((path, config));
        }
    }

    Err(AppError::config(ConfigError::ScenarioFileNotFound {
        candidates: DEFAULT_SCENARIO_FILES.join(", "),
    }))
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ScenarioConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
