// bridge_core/src/storage/bridge_config.rs
use ron::ser::{PrettyConfig, to_string_pretty};
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::path::Path;
use crate::*;
use std::fs;

const CONFIG_FILE: &str = "propbridge.ron";

/// Settings of the bridge, stored as a .ron file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// `flexi_logger` spec, e.g. `"info"` or `"info, bridge_core::props=debug"`.
    pub log_spec: String,
    /// Write rotating log files here instead of stderr.
    pub log_dir: Option<PathBuf>,
    /// Where `lua_api_gen` writes the Lua API stubs.
    pub lua_api_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_spec: "info".to_string(),
            log_dir: None,
            lua_api_dir: PathBuf::from("scripts/_bridge"),
        }
    }
}

/// Parses a config, missing fields taking their defaults.
pub fn parse_config(txt: &str) -> Result<BridgeConfig, ron::error::SpannedError> {
    ron::from_str(txt)
}

/// Loads the config at `path`, falling back to the defaults when it is
/// missing or malformed.
pub fn load_config(path: &Path) -> BridgeConfig {
    match fs::read_to_string(path) {
        Ok(txt) => parse_config(&txt).unwrap_or_else(|e| {
            bridge_error!("Invalid config {}: {e}.", path.display());
            BridgeConfig::default()
        }),
        Err(e) => {
            bridge_warn!("Error loading config {}: {e}.", path.display());
            BridgeConfig::default()
        }
    }
}

/// Saves `config` to `path` as pretty printed RON.
pub fn save_config(path: &Path, config: &BridgeConfig) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let ron = to_string_pretty(config, PrettyConfig::default())?;
    fs::write(path, ron)?;
    Ok(())
}

/// Per-user config directory of the bridge.
pub fn app_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "propbridge", "propbridge")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// `propbridge.ron` inside `app_dir`.
pub fn default_config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse_config(r#"(log_spec: "debug")"#).unwrap();
        assert_eq!(config.log_spec, "debug");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.lua_api_dir, PathBuf::from("scripts/_bridge"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("(log_spec: 5)").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = BridgeConfig {
            log_spec: "warn".into(),
            log_dir: Some(dir.path().join("logs")),
            lua_api_dir: dir.path().join("api"),
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(&dir.path().join("absent.ron")), BridgeConfig::default());
    }
}
