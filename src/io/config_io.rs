use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::io::journal_io::JournalError;
use crate::model::JournalConfig;

/// `~/.taskjournal/config.toml`, if a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".taskjournal").join("config.toml"))
}

/// Read and parse a config file. Paths are returned as written (no `~` expansion).
pub fn read_config(path: &Path) -> Result<JournalConfig, JournalError> {
    let text = fs::read_to_string(path).map_err(|e| JournalError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: JournalConfig = toml::from_str(&text)?;
    Ok(config)
}

/// Load the config from `path`, falling back to defaults when the file is
/// missing or malformed. Leading `~` in directories is expanded.
pub fn load_config_from(path: &Path) -> JournalConfig {
    let config = if path.exists() {
        match read_config(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config; using defaults");
                JournalConfig::default()
            }
        }
    } else {
        JournalConfig::default()
    };
    config.expand_home()
}

/// Load the config from the default location
pub fn load_config() -> JournalConfig {
    match default_config_path() {
        Some(path) => load_config_from(&path),
        None => JournalConfig::default().expand_home(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_dir = \"/data/tasks\"\nmax_indent_level = 3\n").unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/data/tasks"));
        assert_eq!(config.max_indent_level, 3);
        assert_eq!(config.max_search_days, 365);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_indent_level = \"lots\"").unwrap();
        assert!(matches!(read_config(&path), Err(JournalError::ConfigParse(_))));
    }

    #[test]
    fn missing_config_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = read_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, JournalError::Read { .. }));
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.max_indent_level, 5);

        let missing = load_config_from(&dir.path().join("missing.toml"));
        assert_eq!(missing.average_efficiency_days, 7);
    }
}
