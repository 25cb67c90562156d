//! Settings file loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::env::resolve_env_vars;
use crate::source::Settings;

/// Load a settings file and substitute `${VAR}` references.
///
/// The format is picked from the extension: `.yaml`/`.yml`, `.toml`, anything
/// else is read as JSON. Returns empty settings if the file doesn't exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "Settings file does not exist; using empty settings");
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let value = parse_settings(&raw, path)?;
    let value = resolve_env_vars(&value)
        .with_context(|| format!("Failed to resolve env vars in: {}", path.display()))?;

    info!(path = %path.display(), "Loaded settings");
    Ok(Settings::new(value))
}

fn parse_settings(raw: &str, path: &Path) -> Result<Value> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(raw)
            .with_context(|| format!("Failed to parse settings YAML at: {}", path.display())),
        Some("toml") => {
            let table: toml::Value = toml::from_str(raw)
                .with_context(|| format!("Failed to parse settings TOML at: {}", path.display()))?;
            serde_json::to_value(table).context("Failed to convert TOML settings")
        }
        _ => serde_json::from_str(raw)
            .with_context(|| format!("Failed to parse settings JSON at: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ConfigSource;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn loads_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yaml");
        fs::write(&path, "application:\n  name: orders\n  env: PROD\n").unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.get_string("application.name"), "orders");
        assert_eq!(settings.get_string("application.env"), "PROD");
    }

    #[test]
    fn loads_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "[logging]\nmaxSize = 20\nconsole = true\n").unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.get_int("logging.maxSize"), 20);
        assert!(settings.get_bool("logging.console"));
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
