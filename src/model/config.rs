use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Directory holding the `YYYY-MM-DD.md` day files
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Directory holding `timer_state.json` and `stats.json`
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_max_indent_level")]
    pub max_indent_level: usize,
    /// How far the next/previous open day search looks
    #[serde(default = "default_max_search_days")]
    pub max_search_days: u32,
    /// Window for the average efficiency ratio
    #[serde(default = "default_average_efficiency_days")]
    pub average_efficiency_days: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        JournalConfig {
            base_dir: default_base_dir(),
            state_dir: default_state_dir(),
            max_indent_level: default_max_indent_level(),
            max_search_days: default_max_search_days(),
            average_efficiency_days: default_average_efficiency_days(),
        }
    }
}

impl JournalConfig {
    /// A config rooted entirely under `root` (day files in `root`, state in `root/.state`)
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        JournalConfig {
            state_dir: root.join(".state"),
            base_dir: root,
            ..Default::default()
        }
    }

    pub fn timer_state_path(&self) -> PathBuf {
        self.state_dir.join("timer_state.json")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.state_dir.join("stats.json")
    }

    /// Replace a leading `~` in the configured directories with the home directory
    pub fn expand_home(mut self) -> Self {
        self.base_dir = expand_tilde(&self.base_dir);
        self.state_dir = expand_tilde(&self.state_dir);
        self
    }
}

fn expand_tilde(path: &std::path::Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("~/tasks")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("~/.taskjournal")
}

fn default_max_indent_level() -> usize {
    5
}

fn default_max_search_days() -> u32 {
    365
}

fn default_average_efficiency_days() -> usize {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: JournalConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_indent_level, 5);
        assert_eq!(config.max_search_days, 365);
        assert_eq!(config.average_efficiency_days, 7);
        assert_eq!(config.base_dir, PathBuf::from("~/tasks"));
    }

    #[test]
    fn expand_home_replaces_tilde() {
        let config = JournalConfig::default().expand_home();
        if dirs::home_dir().is_some() {
            assert!(!config.base_dir.starts_with("~"));
            assert!(config.base_dir.ends_with("tasks"));
        }
    }

    #[test]
    fn rooted_config_keeps_state_inside_root() {
        let config = JournalConfig::rooted_at("/tmp/journal");
        assert_eq!(config.base_dir, PathBuf::from("/tmp/journal"));
        assert_eq!(
            config.timer_state_path(),
            PathBuf::from("/tmp/journal/.state/timer_state.json")
        );
        assert_eq!(
            config.stats_path(),
            PathBuf::from("/tmp/journal/.state/stats.json")
        );
    }
}
